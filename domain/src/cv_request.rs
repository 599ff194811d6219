//! Notifications raised when a manager asks an employee to update their CV.
//!
//! The request itself is stored by the CV handlers; once that has committed they
//! call [`notify_update_requested`] so the CV owner sees the request immediately
//! if they are online.

use events::{DomainEvent, EventPublisher, Id};
use log::*;

/// Shown when the requester's name could not be looked up.
pub const DEFAULT_REQUESTER_NAME: &str = "Project manager";

/// A freshly stored CV update request.
#[derive(Debug, Clone)]
pub struct UpdateRequest {
    pub cv_id: Id,
    pub request_id: Id,
    pub cv_owner_id: Id,
    pub requested_by: Id,
    pub requester_name: Option<String>,
    pub content: Option<String>,
}

/// Builds the text shown to the CV owner.
pub fn notification_message(requester_name: &str, content: Option<&str>) -> String {
    match content {
        Some(note) => {
            format!("{requester_name} has asked you to update your CV with the note: \"{note}\"")
        }
        None => format!(
            "{requester_name} has asked you to update your CV. Please update it as soon as possible."
        ),
    }
}

/// Converts a stored request into the event delivered to the CV owner.
pub fn update_requested_event(request: UpdateRequest) -> DomainEvent {
    let requester_name = request
        .requester_name
        .filter(|name| !name.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_REQUESTER_NAME.to_string());
    let content = request.content.filter(|note| !note.is_empty());
    let message = notification_message(&requester_name, content.as_deref());

    DomainEvent::CvUpdateRequested {
        cv_id: request.cv_id,
        request_id: request.request_id,
        requested_by: request.requested_by,
        requester_name,
        content,
        message,
        notify_user_ids: vec![request.cv_owner_id],
    }
}

/// Publishes the notification for `request`. Never fails the caller: delivery is
/// best effort and the owner simply sees the request on their next page load.
pub async fn notify_update_requested(publisher: &EventPublisher, request: UpdateRequest) {
    let cv_owner_id = request.cv_owner_id;
    let request_id = request.request_id;

    publisher.publish(update_requested_event(request)).await;

    info!("CV update request {request_id} notification sent to CV owner {cv_owner_id}");
}
