//! HTTP surface of the notification service.
//!
//! Exposes `GET /api/sse/connect` (the event stream), `GET /health` and the
//! OpenAPI document, and serves them until the shared shutdown token fires.

use axum::http::{
    header::{ACCEPT, AUTHORIZATION, CACHE_CONTROL},
    HeaderValue, Method,
};
use domain::jwt::TokenVerifier;
use log::*;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

mod controller;
pub mod error;
mod extractors;
mod params;
mod router;
mod sse;

#[cfg(test)]
mod test_support;

/// State shared by every handler: the service infrastructure plus the seam
/// that turns bearer tokens into identities.
#[derive(Clone)]
pub struct AppState {
    pub service_state: service::AppState,
    pub token_verifier: Arc<dyn TokenVerifier>,
}

impl AppState {
    pub fn new(service_state: service::AppState, token_verifier: Arc<dyn TokenVerifier>) -> Self {
        Self {
            service_state,
            token_verifier,
        }
    }
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("Ignoring invalid CORS origin {origin}: {e}");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_methods([Method::GET])
        .allow_credentials(true)
        .allow_headers([AUTHORIZATION, ACCEPT, CACHE_CONTROL])
        .allow_origin(origins)
}

/// Binds the configured address and serves until shutdown is requested.
pub async fn init_server(app_state: AppState) -> std::io::Result<()> {
    let config = app_state.service_state.config.clone();
    let shutdown = app_state.service_state.shutdown.clone();
    let listen_address = config.listen_address();

    let router = router::define_routes(app_state).layer(cors_layer(&config.allowed_origins));

    info!("Server starting... listening for connections on http://{listen_address}");
    let listener = tokio::net::TcpListener::bind(&listen_address).await?;

    axum::serve(listener, router)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await?;

    info!("Server stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::test_app;
    use axum::body::Body;
    use axum::http::{header::ACCESS_CONTROL_ALLOW_ORIGIN, header::ORIGIN, Request};
    use tower::ServiceExt;

    #[tokio::test]
    async fn cors_allows_configured_origins_only() {
        let app = test_app(10);
        let router = app
            .router
            .layer(cors_layer(&["http://localhost:3000".to_string()]));

        let allowed = router
            .clone()
            .oneshot(
                Request::get("/health")
                    .header(ORIGIN, "http://localhost:3000")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(
            allowed.headers()[ACCESS_CONTROL_ALLOW_ORIGIN],
            "http://localhost:3000"
        );

        let refused = router
            .oneshot(
                Request::get("/health")
                    .header(ORIGIN, "http://evil.test")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert!(refused.headers().get(ACCESS_CONTROL_ALLOW_ORIGIN).is_none());
    }

    #[test]
    fn invalid_origins_are_skipped() {
        // Must not panic on values that are not valid header values.
        let _ = cors_layer(&["http://ok.test".to_string(), "bad\norigin".to_string()]);
    }
}
