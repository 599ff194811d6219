use crate::connection::{Client, ClientId, ClientSummary, ConnectionRegistry, DeliveryReport};
use crate::message::{Message, MessageScope};
use chrono::Utc;
use log::*;
use std::time::Duration;
use tokio::sync::{mpsc::UnboundedReceiver, oneshot};
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

/// Shortest accepted ping interval. `tokio::time::interval` panics on zero.
pub const MIN_PING_INTERVAL: Duration = Duration::from_millis(10);

/// Tunables for the hub task.
#[derive(Debug, Clone)]
pub struct HubConfig {
    /// Number of messages a client may have queued before it is evicted.
    pub mailbox_capacity: usize,
    /// Time between liveness pings.
    pub ping_interval: Duration,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            mailbox_capacity: 10,
            ping_interval: Duration::from_secs(30),
        }
    }
}

/// Everything other tasks can ask of the hub.
#[derive(Debug)]
pub(crate) enum Command {
    Register(Client),
    Unregister(ClientId),
    Deliver {
        message: Message,
        scope: MessageScope,
    },
    Snapshot(oneshot::Sender<Vec<ClientSummary>>),
}

/// The single owner of the connection registry.
///
/// Commands are handled one at a time in arrival order, so messages for a
/// given client land in its mailbox in the order the hub received them.
pub(crate) struct Hub {
    registry: ConnectionRegistry,
    inbox: UnboundedReceiver<Command>,
    ping_interval: Duration,
    shutdown: CancellationToken,
}

impl Hub {
    pub(crate) fn new(
        inbox: UnboundedReceiver<Command>,
        config: &HubConfig,
        shutdown: CancellationToken,
    ) -> Self {
        let ping_interval = if config.ping_interval < MIN_PING_INTERVAL {
            warn!(
                "SSE ping interval {:?} is too short, using {:?}",
                config.ping_interval, MIN_PING_INTERVAL
            );
            MIN_PING_INTERVAL
        } else {
            config.ping_interval
        };

        Self {
            registry: ConnectionRegistry::new(),
            inbox,
            ping_interval,
            shutdown,
        }
    }

    pub(crate) async fn run(mut self) {
        // The first ping goes out one full interval after start.
        let mut ticker = interval_at(Instant::now() + self.ping_interval, self.ping_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(
            "SSE hub started (ping every {}s)",
            self.ping_interval.as_secs_f32()
        );

        loop {
            tokio::select! {
                biased;

                _ = self.shutdown.cancelled() => {
                    info!("SSE hub shutting down");
                    break;
                }
                command = self.inbox.recv() => match command {
                    Some(command) => self.handle(command),
                    None => {
                        debug!("All SSE hub handles dropped");
                        break;
                    }
                },
                _ = ticker.tick() => self.ping(),
            }
        }

        let closed = self.registry.clear();
        info!("SSE hub stopped, closed {closed} connection(s)");
    }

    fn handle(&mut self, command: Command) {
        match command {
            Command::Register(client) => {
                info!(
                    "SSE client connected: {} (user: {})",
                    client.id(),
                    client.user_id()
                );
                if let Some(previous) = self.registry.register(client) {
                    warn!("Replaced SSE client with duplicate id {}", previous.id());
                }
            }
            Command::Unregister(client_id) => match self.registry.unregister(&client_id) {
                Some(client) => info!(
                    "SSE client disconnected: {} (user: {})",
                    client.id(),
                    client.user_id()
                ),
                None => trace!("SSE client {client_id} already removed"),
            },
            Command::Deliver { message, scope } => {
                let report = match &scope {
                    MessageScope::User { user_id } => {
                        self.registry.deliver_to_user(user_id, &message)
                    }
                    MessageScope::Broadcast => self.registry.broadcast(&message),
                };
                debug!(
                    "SSE event {} ({}) delivered to {} connection(s) for {:?}",
                    message.event(),
                    message.id(),
                    report.delivered,
                    scope
                );
                Self::log_removals(&report);
            }
            Command::Snapshot(reply) => {
                if reply.send(self.registry.summaries()).is_err() {
                    trace!("SSE snapshot requester went away");
                }
            }
        }
    }

    fn ping(&mut self) {
        let now = Utc::now();
        let report = self.registry.ping(&Message::ping(now), now);
        trace!(
            "SSE ping delivered to {} connection(s), {} remaining",
            report.delivered,
            self.registry.len()
        );
        Self::log_removals(&report);
    }

    fn log_removals(report: &DeliveryReport) {
        for client_id in &report.evicted {
            warn!("Evicted unresponsive SSE client {client_id}: mailbox full");
        }
        for client_id in &report.closed {
            debug!("Removed SSE client {client_id}: connection already closed");
        }
    }
}
