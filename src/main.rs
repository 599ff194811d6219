use domain::jwt::JwtVerifier;
use log::*;
use service::{config::Config, logging::Logger};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() {
    let config = Config::new();
    Logger::init_logger(&config as &Config);

    info!("Starting up...");

    let shutdown = CancellationToken::new();
    tokio::spawn(wait_for_ctrl_c(shutdown.clone()));

    let (service_state, hub_handle) = service::init_notifications(&config, &shutdown);

    let token_verifier = match JwtVerifier::new(&config) {
        Ok(verifier) => Arc::new(verifier),
        Err(e) => {
            error!("Cannot verify access tokens without a JWT secret: {e}");
            std::process::exit(1);
        }
    };

    let app_state = web::AppState::new(service_state, token_verifier);

    if let Err(e) = web::init_server(app_state).await {
        error!("Server error: {e}");
        shutdown.cancel();
    }

    if let Err(e) = hub_handle.await {
        error!("SSE hub task failed: {e}");
    }

    info!("Shut down complete");
}

async fn wait_for_ctrl_c(shutdown: CancellationToken) {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received, closing connections"),
        Err(e) => error!("Unable to listen for shutdown signal: {e}"),
    }
    shutdown.cancel();
}
