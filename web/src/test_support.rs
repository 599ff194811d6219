use crate::{router, AppState};
use axum::body::Body;
use axum::http::{header::AUTHORIZATION, Request};
use axum::Router;
use clap::Parser;
use domain::jwt::{encode_token, JwtVerifier};
use service::config::Config;
use sse::{HubConfig, Manager};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

pub(crate) const SECRET: &[u8] = b"web-test-secret";

pub(crate) struct TestApp {
    pub(crate) router: Router,
    pub(crate) state: AppState,
    pub(crate) shutdown: CancellationToken,
    pub(crate) hub_handle: JoinHandle<()>,
}

impl TestApp {
    pub(crate) fn token_for(&self, user_id: &str) -> String {
        encode_token(SECRET, user_id, vec!["Employee".to_string()]).unwrap()
    }
}

/// A router backed by a live hub. Pings are pushed far out so they never show
/// up in a test's stream.
pub(crate) fn test_app(mailbox_capacity: usize) -> TestApp {
    let config = Config::parse_from(["cv_platform_rs"]);
    let shutdown = CancellationToken::new();
    let (manager, hub_handle) = Manager::start(
        HubConfig {
            mailbox_capacity,
            ping_interval: Duration::from_secs(3600),
        },
        shutdown.clone(),
    );

    let service_state = service::AppState::new(config, manager, shutdown.clone());
    let state = AppState::new(service_state, Arc::new(JwtVerifier::from_secret(SECRET)));

    TestApp {
        router: router::define_routes(state.clone()),
        state,
        shutdown,
        hub_handle,
    }
}

pub(crate) fn connect_request(uri: &str, bearer: Option<&str>) -> Request<Body> {
    let mut builder = Request::get(uri);
    if let Some(token) = bearer {
        builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::empty()).unwrap()
}
