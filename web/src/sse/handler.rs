use crate::error::Error;
use crate::extractors::bearer_token::BearerToken;
use crate::params::sse::ConnectParams;
use crate::AppState;
use async_stream::stream;
use axum::extract::State;
use axum::response::sse::{Event, Sse};
use chrono::Utc;
use futures::Stream;
use log::*;
use sse::encoder::encode;
use sse::message::Message;
use std::convert::Infallible;

/// Opens the notification stream for the caller.
///
/// The first frame is always `connected`; after that the stream carries whatever
/// the hub routes to this client until the client disconnects, the hub evicts it
/// or the server shuts down.
#[utoipa::path(
    get,
    path = "/api/sse/connect",
    params(ConnectParams),
    responses(
        (status = 200, description = "Event stream opened", content_type = "text/event-stream"),
        (status = 401, description = "Missing, invalid or expired token"),
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub(crate) async fn sse_handler(
    State(app_state): State<AppState>,
    BearerToken(token): BearerToken,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, Error> {
    let identity = app_state.token_verifier.verify(&token).map_err(|e| {
        warn!("Refusing SSE connection: {e}");
        e
    })?;

    let manager = app_state.service_state.sse_manager.clone();
    let (client, mut mailbox) = manager.new_client(identity.user_id.clone(), identity.roles);
    let client_id = client.id().clone();
    let guard = manager.register_connection(client);
    let shutdown = app_state.service_state.shutdown.child_token();

    info!(
        "SSE connection established for user {} (client {})",
        identity.user_id, client_id
    );

    let connected = Message::connected(client_id.as_str(), &identity.user_id, Utc::now());

    let stream = stream! {
        // Unregisters the client when the response body is dropped.
        let _guard = guard;

        match encode(&connected) {
            Ok(event) => yield Ok::<_, Infallible>(event),
            Err(e) => error!("Failed to encode connected message for client {client_id}: {e}"),
        }

        loop {
            let next = tokio::select! {
                message = mailbox.recv() => message,
                _ = shutdown.cancelled() => None,
            };

            let Some(message) = next else {
                break;
            };

            match encode(&message) {
                Ok(event) => yield Ok(event),
                Err(e) => error!(
                    "Dropping message {} for client {client_id}: {e}",
                    message.id()
                ),
            }
        }

        debug!("SSE stream for client {client_id} finished");
    };

    Ok(Sse::new(stream))
}
