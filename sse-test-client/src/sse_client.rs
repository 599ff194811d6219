use anyhow::{bail, Result};
use eventsource_client::{self as es, Client};
use futures_util::stream::StreamExt;
use log::*;
use serde_json::Value;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// One SSE frame as seen by the browser side: the `id`, `event` and parsed `data` lines.
#[derive(Debug, Clone)]
pub struct ReceivedEvent {
    pub id: Option<String>,
    pub event_type: String,
    pub data: Value,
}

pub struct Connection {
    pub user_label: String,
    events: mpsc::UnboundedReceiver<ReceivedEvent>,
    _reader: JoinHandle<()>,
}

impl Connection {
    /// Opens `/api/sse/connect`, passing the token as a query parameter the way
    /// a browser `EventSource` would. Reconnects are disabled so a dropped
    /// stream shows up as a failed scenario.
    pub async fn establish(base_url: &str, token: &str, user_label: String) -> Result<Self> {
        let url = format!("{base_url}/api/sse/connect?token={token}");
        let client = es::ClientBuilder::for_url(&url)?
            .reconnect(es::ReconnectOptions::reconnect(false).build())
            .build();

        let (tx, events) = mpsc::unbounded_channel();
        let reader = tokio::spawn(forward_events(client, tx, user_label.clone()));

        Ok(Self {
            user_label,
            events,
            _reader: reader,
        })
    }

    /// Skips frames of other types until `event_type` arrives or `timeout` runs out.
    pub async fn wait_for_event(
        &mut self,
        event_type: &str,
        timeout: Duration,
    ) -> Result<ReceivedEvent> {
        let wait = async {
            while let Some(event) = self.events.recv().await {
                if event.event_type == event_type {
                    return Some(event);
                }
                trace!("{} skipped {} frame", self.user_label, event.event_type);
            }
            None
        };

        match tokio::time::timeout(timeout, wait).await {
            Ok(Some(event)) => Ok(event),
            Ok(None) => bail!("SSE connection closed while waiting for {event_type}"),
            Err(_) => bail!("Timeout waiting for event: {event_type}"),
        }
    }
}

async fn forward_events(
    client: impl Client,
    tx: mpsc::UnboundedSender<ReceivedEvent>,
    label: String,
) {
    let mut stream = client.stream();

    while let Some(item) = stream.next().await {
        match item {
            Ok(es::SSE::Event(event)) => {
                let data = match serde_json::from_str(&event.data) {
                    Ok(data) => data,
                    Err(e) => {
                        warn!("{label} got non-JSON data for {}: {e}", event.event_type);
                        continue;
                    }
                };

                let received = ReceivedEvent {
                    id: event.id,
                    event_type: event.event_type,
                    data,
                };
                if tx.send(received).is_err() {
                    debug!("SSE receiver dropped for {label}");
                    return;
                }
            }
            // Comments and connection notices carry no payload
            Ok(_) => {}
            Err(e) => {
                warn!("SSE error for {label}: {e}");
                return;
            }
        }
    }

    debug!("SSE stream ended for {label}");
}
