use config::Config;
use events::EventPublisher;
use log::info;
use sse::{HubConfig, Manager};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

pub mod config;
pub mod logging;

/// Derives the hub settings from the service configuration.
pub fn hub_config(config: &Config) -> HubConfig {
    HubConfig {
        mailbox_capacity: config.sse_mailbox_capacity,
        ping_interval: config.sse_ping_interval(),
    }
}

/// Starts the SSE hub task and wires it into a fresh event publisher.
pub fn init_notifications(config: &Config, shutdown: &CancellationToken) -> (AppState, JoinHandle<()>) {
    info!(
        "SSE hub config: mailbox_capacity={}, ping_interval={}s",
        config.sse_mailbox_capacity, config.sse_ping_interval_secs,
    );

    let (sse_manager, hub_handle) = Manager::start(hub_config(config), shutdown.clone());
    let app_state = AppState::new(config.clone(), sse_manager, shutdown.clone());

    (app_state, hub_handle)
}

// Service-level state containing only infrastructure concerns
// Needs to implement Clone to be able to be passed into Router as State
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub sse_manager: Manager,
    pub event_publisher: EventPublisher,
    pub shutdown: CancellationToken,
}

impl AppState {
    /// Builds the state with an event publisher that forwards domain events to the hub.
    pub fn new(app_config: Config, sse_manager: Manager, shutdown: CancellationToken) -> Self {
        let event_publisher = EventPublisher::new().with_handler(std::sync::Arc::new(
            sse::domain_event_handler::SseDomainEventHandler::new(sse_manager.clone()),
        ));

        Self {
            config: app_config,
            sse_manager,
            event_publisher,
            shutdown,
        }
    }
}
