use crate::connection::{Client, ClientId, ClientSummary, ConnectionGuard, Mailbox, UserId};
use crate::error::Error;
use crate::hub::{Command, Hub, HubConfig};
use crate::message::{Message, MessageScope};
use log::*;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Cheap, cloneable handle to the hub task.
///
/// Every method only enqueues a command into the hub's unbounded inbox, so
/// callers never wait on the hub or on any client.
#[derive(Clone, Debug)]
pub struct Manager {
    inbox: mpsc::UnboundedSender<Command>,
    mailbox_capacity: usize,
}

impl Manager {
    /// Spawns the hub task. It runs until `shutdown` is cancelled or every
    /// handle has been dropped.
    pub fn start(config: HubConfig, shutdown: CancellationToken) -> (Self, JoinHandle<()>) {
        let (inbox, receiver) = mpsc::unbounded_channel();
        let hub = Hub::new(receiver, &config, shutdown);
        let handle = tokio::spawn(hub.run());

        let manager = Self {
            inbox,
            mailbox_capacity: config.mailbox_capacity,
        };
        (manager, handle)
    }

    /// Builds a client sized with the hub's mailbox capacity.
    pub fn new_client(&self, user_id: UserId, roles: Vec<String>) -> (Client, Mailbox) {
        Client::new(user_id, roles, self.mailbox_capacity)
    }

    /// Register a client. Dropping the returned guard unregisters it.
    pub fn register_connection(&self, client: Client) -> ConnectionGuard {
        let client_id = client.id().clone();
        if let Err(e) = self.submit(Command::Register(client)) {
            warn!("Could not register SSE client {client_id}: {e}");
        }
        ConnectionGuard::new(self.clone(), client_id)
    }

    /// Unregister a connection by ID. Unknown or already removed ids are ignored.
    pub fn unregister_connection(&self, client_id: &ClientId) {
        if self
            .submit(Command::Unregister(client_id.clone()))
            .is_err()
        {
            // The hub closed every mailbox on its way out.
            trace!("SSE hub gone, nothing to unregister for {client_id}");
        }
    }

    /// Deliver an event to every connection of `user_id`. Fire-and-forget.
    pub fn send_to_user<P: Serialize>(&self, user_id: &str, event: &str, payload: P) {
        if let Some(payload) = Self::to_payload(event, payload) {
            self.send_message(
                Message::notification(user_id, event, payload),
                MessageScope::User {
                    user_id: user_id.to_string(),
                },
            );
        }
    }

    /// Deliver an event to every connected client. Fire-and-forget.
    pub fn broadcast<P: Serialize>(&self, event: &str, payload: P) {
        if let Some(payload) = Self::to_payload(event, payload) {
            self.send_message(Message::broadcast(event, payload), MessageScope::Broadcast);
        }
    }

    /// Send a prepared message based on its scope.
    pub fn send_message(&self, message: Message, scope: MessageScope) {
        let event = message.event().to_string();
        if let Err(e) = self.submit(Command::Deliver { message, scope }) {
            warn!("Dropping SSE event {event}: {e}");
        }
    }

    /// Asks the hub which clients are currently registered.
    /// Empty when the hub is no longer running.
    pub async fn connected_clients(&self) -> Vec<ClientSummary> {
        let (reply, response) = oneshot::channel();
        if self.submit(Command::Snapshot(reply)).is_err() {
            return Vec::new();
        }
        response.await.unwrap_or_default()
    }

    fn submit(&self, command: Command) -> Result<(), Error> {
        self.inbox
            .send(command)
            .map_err(|_| Error::hub_unavailable())
    }

    fn to_payload<P: Serialize>(event: &str, payload: P) -> Option<Value> {
        match serde_json::to_value(payload) {
            Ok(value) => Some(value),
            Err(e) => {
                error!("Failed to serialize SSE payload for event {event}: {e}");
                None
            }
        }
    }
}
