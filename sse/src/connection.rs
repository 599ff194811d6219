use crate::manager::Manager;
use crate::message::Message;
use chrono::{DateTime, Utc};
use log::*;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::fmt;
use tokio::sync::mpsc::{self, error::TrySendError};

pub use tokio::sync::mpsc::error::TryRecvError;

// Type alias for user IDs (the token subject, kept as an opaque string)
pub type UserId = String;

/// Unique identifier for a connection (server-generated, never reused)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ClientId(String);

impl ClientId {
    /// Derives an id from the owning user plus a random suffix, so the same
    /// user can hold several connections (browser tabs) at once.
    pub fn new(user_id: &str) -> Self {
        Self(format!("{}-{}", user_id, uuid::Uuid::new_v4().simple()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The hub-side half of a connection: identity plus the sending end of its mailbox.
///
/// Dropping a `Client` closes its mailbox, which is how the hub signals the
/// connection handler to stop.
#[derive(Debug)]
pub struct Client {
    id: ClientId,
    user_id: UserId,
    roles: Vec<String>,
    sender: mpsc::Sender<Message>,
    last_ping: DateTime<Utc>,
}

impl Client {
    /// Creates a client together with its bounded mailbox.
    pub fn new(user_id: UserId, roles: Vec<String>, capacity: usize) -> (Self, Mailbox) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        let client = Self {
            id: ClientId::new(&user_id),
            user_id,
            roles,
            sender,
            last_ping: Utc::now(),
        };
        (client, Mailbox { receiver })
    }

    pub fn id(&self) -> &ClientId {
        &self.id
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn roles(&self) -> &[String] {
        &self.roles
    }

    fn summary(&self) -> ClientSummary {
        ClientSummary {
            id: self.id.clone(),
            user_id: self.user_id.clone(),
            roles: self.roles.clone(),
            last_ping: self.last_ping,
        }
    }
}

/// The receiving end of a client's queue, drained by exactly one connection handler.
#[derive(Debug)]
pub struct Mailbox {
    receiver: mpsc::Receiver<Message>,
}

impl Mailbox {
    /// Waits for the next message. `None` once the hub has dropped the client
    /// (unregistered, evicted, or hub shutdown) and everything queued is drained.
    pub async fn recv(&mut self) -> Option<Message> {
        self.receiver.recv().await
    }

    pub fn try_recv(&mut self) -> Result<Message, TryRecvError> {
        self.receiver.try_recv()
    }
}

/// Point-in-time view of a registered client.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClientSummary {
    pub id: ClientId,
    pub user_id: UserId,
    pub roles: Vec<String>,
    pub last_ping: DateTime<Utc>,
}

/// Unregisters its connection when dropped, whichever way the handler exits.
#[must_use = "dropping the guard unregisters the connection immediately"]
pub struct ConnectionGuard {
    manager: Manager,
    client_id: ClientId,
}

impl ConnectionGuard {
    pub(crate) fn new(manager: Manager, client_id: ClientId) -> Self {
        Self { manager, client_id }
    }

    pub fn client_id(&self) -> &ClientId {
        &self.client_id
    }
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        self.manager.unregister_connection(&self.client_id);
    }
}

/// Result of pushing one message into one mailbox.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Delivery {
    Delivered,
    /// Mailbox full: the client was removed as unresponsive.
    Evicted,
    /// The handler side is already gone: the client was removed.
    Closed,
}

/// Tally of one routing pass.
#[derive(Debug, Default, PartialEq, Eq)]
pub(crate) struct DeliveryReport {
    pub(crate) delivered: usize,
    pub(crate) evicted: Vec<ClientId>,
    pub(crate) closed: Vec<ClientId>,
}

impl DeliveryReport {
    fn record(&mut self, client_id: &ClientId, delivery: Delivery) {
        match delivery {
            Delivery::Delivered => self.delivered += 1,
            Delivery::Evicted => self.evicted.push(client_id.clone()),
            Delivery::Closed => self.closed.push(client_id.clone()),
        }
    }
}

/// Registry of live clients with a secondary index by user for routing.
///
/// Owned by the hub task and only ever touched from there, so it needs no locking.
#[derive(Default)]
pub(crate) struct ConnectionRegistry {
    /// Primary storage: lookup by client id for registration/cleanup
    connections: HashMap<ClientId, Client>,

    /// Secondary index: lookup by user id for targeted delivery
    user_index: HashMap<UserId, HashSet<ClientId>>,
}

impl ConnectionRegistry {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn len(&self) -> usize {
        self.connections.len()
    }

    /// Inserts a client. Returns the previous client with the same id, if any.
    pub(crate) fn register(&mut self, client: Client) -> Option<Client> {
        let previous = self.unregister(&client.id);

        self.user_index
            .entry(client.user_id.clone())
            .or_default()
            .insert(client.id.clone());
        self.connections.insert(client.id.clone(), client);

        previous
    }

    /// Removes a client and hands it back; dropping it closes the mailbox.
    /// Returns `None` when the id is not registered, which makes repeated calls harmless.
    pub(crate) fn unregister(&mut self, client_id: &ClientId) -> Option<Client> {
        let client = self.connections.remove(client_id)?;

        if let Some(ids) = self.user_index.get_mut(&client.user_id) {
            ids.remove(client_id);
            if ids.is_empty() {
                self.user_index.remove(&client.user_id);
            }
        }

        Some(client)
    }

    /// Non-blocking push into one mailbox; a full or closed mailbox removes the client.
    fn try_deliver(&mut self, client_id: &ClientId, message: &Message) -> Option<Delivery> {
        let client = self.connections.get(client_id)?;

        let delivery = match client.sender.try_send(message.clone()) {
            Ok(()) => Delivery::Delivered,
            Err(TrySendError::Full(_)) => Delivery::Evicted,
            Err(TrySendError::Closed(_)) => Delivery::Closed,
        };

        if delivery != Delivery::Delivered {
            // Dropping the returned client closes its mailbox.
            self.unregister(client_id);
        }

        Some(delivery)
    }

    /// Delivers to every connection owned by `user_id`.
    pub(crate) fn deliver_to_user(&mut self, user_id: &str, message: &Message) -> DeliveryReport {
        let targets: Vec<ClientId> = self
            .user_index
            .get(user_id)
            .map(|ids| ids.iter().cloned().collect())
            .unwrap_or_default();

        self.deliver_to(&targets, message)
    }

    /// Delivers to every registered connection.
    pub(crate) fn broadcast(&mut self, message: &Message) -> DeliveryReport {
        let targets: Vec<ClientId> = self.connections.keys().cloned().collect();
        self.deliver_to(&targets, message)
    }

    /// Sends a liveness message to everyone and stamps the clients that accepted it.
    pub(crate) fn ping(&mut self, message: &Message, now: DateTime<Utc>) -> DeliveryReport {
        let targets: Vec<ClientId> = self.connections.keys().cloned().collect();
        let mut report = DeliveryReport::default();

        for client_id in &targets {
            if let Some(delivery) = self.try_deliver(client_id, message) {
                if delivery == Delivery::Delivered {
                    if let Some(client) = self.connections.get_mut(client_id) {
                        client.last_ping = now;
                    }
                }
                report.record(client_id, delivery);
            }
        }

        report
    }

    fn deliver_to(&mut self, targets: &[ClientId], message: &Message) -> DeliveryReport {
        let mut report = DeliveryReport::default();

        for client_id in targets {
            if let Some(delivery) = self.try_deliver(client_id, message) {
                report.record(client_id, delivery);
            }
        }

        report
    }

    pub(crate) fn summaries(&self) -> Vec<ClientSummary> {
        self.connections.values().map(Client::summary).collect()
    }

    /// Drops every client, closing all mailboxes.
    pub(crate) fn clear(&mut self) -> usize {
        let count = self.connections.len();
        self.user_index.clear();
        for (client_id, _client) in self.connections.drain() {
            trace!("Closing SSE mailbox for client {}", client_id);
        }
        count
    }
}
