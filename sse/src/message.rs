use chrono::{DateTime, Utc};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};

/// Reserved event name for the periodic liveness message.
pub const PING_EVENT: &str = "ping";
/// Event name of the first message written to every new connection.
pub const CONNECTED_EVENT: &str = "connected";
/// Sent to a CV owner when someone asks them to update their CV.
pub const CV_UPDATE_REQUEST_EVENT: &str = "cv_update_request";
/// General purpose notice, usually broadcast.
pub const NOTIFICATION_EVENT: &str = "notification";

static SEQUENCE: AtomicU64 = AtomicU64::new(0);

/// Builds `<prefix>-<nanos>-<seq>`. The sequence keeps ids distinct when two
/// messages are created within the same clock tick.
fn next_id(prefix: &str) -> String {
    let nanos = Utc::now().timestamp_nanos_opt().unwrap_or_default();
    let seq = SEQUENCE.fetch_add(1, Ordering::Relaxed);
    format!("{prefix}-{nanos}-{seq}")
}

/// One outbound notification. Immutable once built; the hub clones it into
/// every matching mailbox.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    id: String,
    event: String,
    payload: Value,
}

impl Message {
    /// A notification addressed to a single user.
    pub fn notification(user_id: &str, event: impl Into<String>, payload: Value) -> Self {
        Self {
            id: next_id(&format!("notification-{user_id}")),
            event: event.into(),
            payload,
        }
    }

    /// A notification addressed to every connected client.
    pub fn broadcast(event: impl Into<String>, payload: Value) -> Self {
        Self {
            id: next_id("broadcast"),
            event: event.into(),
            payload,
        }
    }

    /// The liveness message sent by the hub on every tick.
    pub fn ping(now: DateTime<Utc>) -> Self {
        Self {
            id: next_id(PING_EVENT),
            event: PING_EVENT.to_string(),
            payload: json!({ "timestamp": now.timestamp() }),
        }
    }

    /// Greeting written straight to the wire once a connection is admitted.
    pub fn connected(client_id: &str, user_id: &str, now: DateTime<Utc>) -> Self {
        Self {
            id: next_id("connect"),
            event: CONNECTED_EVENT.to_string(),
            payload: json!({
                "client_id": client_id,
                "user_id": user_id,
                "timestamp": now.timestamp(),
            }),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn event(&self) -> &str {
        &self.event
    }

    pub fn payload(&self) -> &Value {
        &self.payload
    }
}

/// Who a message is routed to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageScope {
    /// Send to all connections for a specific user
    User { user_id: String },
    /// Send to all connected users
    Broadcast,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn ids_are_unique_even_when_created_back_to_back() {
        let ids: HashSet<String> = (0..1000)
            .map(|_| Message::broadcast("notice", json!({})).id().to_string())
            .collect();

        assert_eq!(ids.len(), 1000);
    }

    #[test]
    fn notification_id_names_the_target_user() {
        let message = Message::notification("u1", "cv_update_request", json!({"cv_id": "cv-1"}));

        assert!(message.id().starts_with("notification-u1-"));
        assert_eq!(message.event(), "cv_update_request");
        assert_eq!(message.payload()["cv_id"], "cv-1");
    }

    #[test]
    fn ping_carries_the_tick_timestamp() {
        let now = Utc::now();
        let ping = Message::ping(now);

        assert_eq!(ping.event(), PING_EVENT);
        assert!(ping.id().starts_with("ping-"));
        assert_eq!(ping.payload()["timestamp"], now.timestamp());
    }

    #[test]
    fn connected_payload_identifies_the_connection() {
        let now = Utc::now();
        let message = Message::connected("u1-abc", "u1", now);

        assert_eq!(message.event(), CONNECTED_EVENT);
        assert_eq!(
            message.payload(),
            &json!({ "client_id": "u1-abc", "user_id": "u1", "timestamp": now.timestamp() })
        );
    }
}
