use crate::message::{CV_UPDATE_REQUEST_EVENT, NOTIFICATION_EVENT};
use crate::Manager;
use async_trait::async_trait;
use chrono::Utc;
use events::{DomainEvent, EventHandler};
use log::*;
use serde_json::json;

/// Handles domain events by converting them to SSE messages for the affected users.
///
/// The domain layer decides who should be notified and puts their ids in the
/// event; this handler only shapes the payload and routes it through the hub.
pub struct SseDomainEventHandler {
    sse_manager: Manager,
}

impl SseDomainEventHandler {
    pub fn new(sse_manager: Manager) -> Self {
        Self { sse_manager }
    }
}

#[async_trait]
impl EventHandler for SseDomainEventHandler {
    async fn handle(&self, event: &DomainEvent) {
        match event {
            DomainEvent::CvUpdateRequested {
                cv_id,
                request_id,
                requested_by,
                requester_name,
                content,
                message,
                notify_user_ids,
            } => {
                debug!("Handling CvUpdateRequested event for CV {}", cv_id);

                let payload = json!({
                    "type": CV_UPDATE_REQUEST_EVENT,
                    "title": "CV update request",
                    "message": message,
                    "cv_id": cv_id,
                    "request_id": request_id,
                    "requested_by": requested_by,
                    "requester_name": requester_name,
                    "content": content.as_deref().unwrap_or_default(),
                    "timestamp": Utc::now().timestamp(),
                });

                for user_id in notify_user_ids {
                    self.sse_manager.send_to_user(
                        &user_id.to_string(),
                        CV_UPDATE_REQUEST_EVENT,
                        &payload,
                    );
                }

                debug!(
                    "Sent {} to {} user(s): {:?}",
                    CV_UPDATE_REQUEST_EVENT,
                    notify_user_ids.len(),
                    notify_user_ids
                );
            }

            DomainEvent::SystemNotice { title, message } => {
                debug!("Broadcasting system notice \"{}\"", title);

                self.sse_manager.broadcast(
                    NOTIFICATION_EVENT,
                    json!({
                        "type": NOTIFICATION_EVENT,
                        "title": title,
                        "message": message,
                        "timestamp": Utc::now().timestamp(),
                    }),
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hub::HubConfig;
    use events::{EventPublisher, Id};
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::time::timeout;
    use tokio_util::sync::CancellationToken;

    const WAIT: Duration = Duration::from_secs(2);

    fn publisher() -> (EventPublisher, Manager, CancellationToken) {
        let shutdown = CancellationToken::new();
        let (manager, _handle) = Manager::start(HubConfig::default(), shutdown.clone());
        let publisher = EventPublisher::new()
            .with_handler(Arc::new(SseDomainEventHandler::new(manager.clone())));
        (publisher, manager, shutdown)
    }

    #[tokio::test]
    async fn cv_update_request_reaches_only_the_cv_owner() {
        let (publisher, manager, _shutdown) = publisher();
        let owner = Id::new_v4();
        let other = Id::new_v4();
        let (owner_client, mut owner_mailbox) = manager.new_client(owner.to_string(), vec![]);
        let (other_client, mut other_mailbox) = manager.new_client(other.to_string(), vec![]);
        let _owner_guard = manager.register_connection(owner_client);
        let _other_guard = manager.register_connection(other_client);
        let cv_id = Id::new_v4();

        publisher
            .publish(DomainEvent::CvUpdateRequested {
                cv_id,
                request_id: Id::new_v4(),
                requested_by: Id::new_v4(),
                requester_name: "Project Manager".to_string(),
                content: None,
                message: "Please update your CV".to_string(),
                notify_user_ids: vec![owner],
            })
            .await;

        let message = timeout(WAIT, owner_mailbox.recv()).await.unwrap().unwrap();
        assert_eq!(message.event(), CV_UPDATE_REQUEST_EVENT);
        assert_eq!(message.payload()["cv_id"], cv_id.to_string());
        assert_eq!(message.payload()["content"], "");
        assert_eq!(message.payload()["message"], "Please update your CV");

        manager.connected_clients().await;
        assert!(other_mailbox.try_recv().is_err());
    }

    #[tokio::test]
    async fn system_notice_is_broadcast() {
        let (publisher, manager, _shutdown) = publisher();
        let (a, mut mailbox_a) = manager.new_client("u1".to_string(), vec![]);
        let (b, mut mailbox_b) = manager.new_client("u2".to_string(), vec![]);
        let _guard_a = manager.register_connection(a);
        let _guard_b = manager.register_connection(b);

        publisher
            .publish(DomainEvent::SystemNotice {
                title: "Maintenance".to_string(),
                message: "Back at noon".to_string(),
            })
            .await;

        for mailbox in [&mut mailbox_a, &mut mailbox_b] {
            let message = timeout(WAIT, mailbox.recv()).await.unwrap().unwrap();
            assert_eq!(message.event(), NOTIFICATION_EVENT);
            assert_eq!(message.payload()["title"], "Maintenance");
        }
    }
}
