//! Server-Sent Events (SSE) notification hub.
//!
//! Pushes real-time notifications from request handlers to the browsers of
//! authenticated users.
//!
//! # Architecture
//!
//! - **Single-owner hub**: one task owns the registry of live clients. Every
//!   other task talks to it by sending commands through an unbounded inbox
//!   (register, unregister, deliver, snapshot), so the registry needs no locks.
//! - **Bounded mailboxes**: each connection has a small FIFO queue filled only by
//!   the hub and drained only by that connection's handler. A client whose
//!   mailbox is full is evicted instead of slowing everyone else down.
//! - **User and Broadcast scopes**: messages go to every connection of one user
//!   (several tabs are several connections) or to everyone.
//! - **Liveness pings**: the hub sends a `ping` event to all clients on a fixed interval.
//! - **Ephemeral messages**: nothing is stored; offline users miss the event.
//!
//! # Message Flow
//!
//! 1. The web layer admits a connection, builds a [`connection::Client`] and
//!    registers it, keeping the returned [`connection::ConnectionGuard`].
//! 2. A producer calls [`Manager::send_to_user`] or [`Manager::broadcast`]
//!    (directly, or by publishing a domain event handled by
//!    [`domain_event_handler::SseDomainEventHandler`]).
//! 3. The hub pushes the message into each matching mailbox without waiting.
//! 4. The connection handler drains its mailbox, runs each message through
//!    [`encoder::encode`] and writes the frame.
//! 5. When the stream ends for any reason the guard is dropped and the client
//!    is unregistered.
//!
//! # Example: Sending an event
//!
//! ```rust,ignore
//! app_state.sse_manager.send_to_user(
//!     &owner_id.to_string(),
//!     "cv_update_request",
//!     json!({ "cv_id": cv_id }),
//! );
//! ```
//!
//! # Modules
//!
//! - `connection`: client ids, clients and mailboxes, the registry, the unregister guard
//! - `hub`: the actor loop and its configuration
//! - `manager`: the cloneable handle producers and handlers use
//! - `message`: message construction and routing scopes
//! - `encoder`: message to SSE frame
//! - `domain_event_handler`: bridges `events::DomainEvent`s to the hub

pub mod connection;
pub mod domain_event_handler;
pub mod encoder;
pub mod error;
pub mod hub;
pub mod manager;
pub mod message;

pub use hub::HubConfig;
pub use manager::Manager;
