//! Event system infrastructure for the CV platform.
//!
//! Request handlers that change business data (CV requests, announcements, ...)
//! describe what happened as a [`DomainEvent`] and hand it to an [`EventPublisher`].
//! Infrastructure concerns such as real-time SSE notifications subscribe to those
//! events through the [`EventHandler`] trait, so the producers never depend on
//! the notification hub directly.
//!
//! This crate has no dependencies on other internal crates, avoiding circular
//! dependencies between `domain`, `sse` and `web`.

use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

/// A type alias that represents any entity's id field data type.
pub type Id = Uuid;

/// Business-level events emitted after a domain operation has completed.
///
/// Events carry the ids of the users to notify; deciding who is affected is the
/// job of the code that emits the event, not of the handlers.
#[derive(Debug, Clone, PartialEq)]
pub enum DomainEvent {
    /// A manager asked the owner of a CV to bring it up to date.
    CvUpdateRequested {
        /// The CV that should be updated.
        cv_id: Id,
        /// The stored update request.
        request_id: Id,
        /// The user who issued the request.
        requested_by: Id,
        /// Display name of the requester, already resolved by the producer.
        requester_name: String,
        /// Optional free-text note attached to the request.
        content: Option<String>,
        /// Human readable notification text shown by the frontend.
        message: String,
        /// Users that should receive the notification (normally just the CV owner).
        notify_user_ids: Vec<Id>,
    },
    /// A notice meant for everyone currently online.
    SystemNotice { title: String, message: String },
}

impl DomainEvent {
    /// Short name of the event, used for logging.
    pub fn name(&self) -> &'static str {
        match self {
            DomainEvent::CvUpdateRequested { .. } => "cv_update_requested",
            DomainEvent::SystemNotice { .. } => "system_notice",
        }
    }
}

/// Trait for handling domain events.
/// Implementations perform side effects like sending notifications.
/// Handlers must not fail the operation that produced the event, so there is
/// nothing to return.
#[async_trait]
pub trait EventHandler: Send + Sync {
    async fn handle(&self, event: &DomainEvent);
}

/// Publishes domain events to registered handlers.
/// Handlers are called sequentially in registration order.
#[derive(Clone)]
pub struct EventPublisher {
    handlers: Arc<Vec<Arc<dyn EventHandler>>>,
}

impl EventPublisher {
    pub fn new() -> Self {
        Self {
            handlers: Arc::new(Vec::new()),
        }
    }

    /// Register a new event handler.
    /// Note: This creates a new publisher instance with the additional handler.
    /// Store the returned publisher in your application state.
    pub fn with_handler(mut self, handler: Arc<dyn EventHandler>) -> Self {
        let mut handlers = (*self.handlers).clone();
        handlers.push(handler);
        self.handlers = Arc::new(handlers);
        self
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }

    /// Publish an event to all registered handlers.
    pub async fn publish(&self, event: DomainEvent) {
        for handler in self.handlers.iter() {
            handler.handle(&event).await;
        }
    }
}

impl Default for EventPublisher {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct Recorder {
        label: &'static str,
        seen: Arc<Mutex<Vec<String>>>,
    }

    #[async_trait]
    impl EventHandler for Recorder {
        async fn handle(&self, event: &DomainEvent) {
            self.seen
                .lock()
                .unwrap()
                .push(format!("{}:{}", self.label, event.name()));
        }
    }

    #[tokio::test]
    async fn publish_calls_handlers_in_registration_order() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let publisher = EventPublisher::new()
            .with_handler(Arc::new(Recorder {
                label: "first",
                seen: seen.clone(),
            }))
            .with_handler(Arc::new(Recorder {
                label: "second",
                seen: seen.clone(),
            }));

        publisher
            .publish(DomainEvent::SystemNotice {
                title: "Maintenance".to_string(),
                message: "Back at noon".to_string(),
            })
            .await;

        assert_eq!(
            *seen.lock().unwrap(),
            vec!["first:system_notice", "second:system_notice"]
        );
    }

    #[tokio::test]
    async fn publish_without_handlers_is_a_no_op() {
        let publisher = EventPublisher::default();
        assert_eq!(publisher.handler_count(), 0);

        publisher
            .publish(DomainEvent::SystemNotice {
                title: "t".to_string(),
                message: "m".to_string(),
            })
            .await;
    }

    #[test]
    fn with_handler_leaves_the_original_publisher_untouched() {
        let base = EventPublisher::new();
        let extended = base.clone().with_handler(Arc::new(Recorder {
            label: "only",
            seen: Arc::new(Mutex::new(Vec::new())),
        }));

        assert_eq!(base.handler_count(), 0);
        assert_eq!(extended.handler_count(), 1);
    }
}
