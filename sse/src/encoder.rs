//! Turns a [`Message`] into an SSE frame.
//!
//! Each message becomes exactly three fields in this order, followed by a blank line:
//!
//! ```text
//! id: <id>
//! event: <event>
//! data: <json payload>
//! ```

use crate::error::Error;
use crate::message::Message;
use axum::response::sse::Event;

fn check_field(field: &'static str, value: &str) -> Result<(), Error> {
    if value.contains(|c| matches!(c, '\n' | '\r' | '\0')) {
        return Err(Error::invalid_field(field));
    }
    Ok(())
}

/// Encode one message. Fails when the id or event name would break the frame
/// or when the payload cannot be serialized; the caller drops that message.
pub fn encode(message: &Message) -> Result<Event, Error> {
    check_field("id", message.id())?;
    check_field("event", message.event())?;

    let event = Event::default()
        .id(message.id())
        .event(message.event())
        .json_data(message.payload())?;

    Ok(event)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{EncodingErrorKind, ErrorKind};
    use axum::response::sse::Sse;
    use axum::response::IntoResponse;
    use http_body_util::BodyExt;
    use serde_json::json;
    use std::convert::Infallible;

    async fn wire_text(events: Vec<Event>) -> String {
        let stream = futures::stream::iter(events.into_iter().map(Ok::<_, Infallible>));
        let body = Sse::new(stream).into_response().into_body();
        let bytes = body.collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn writes_id_event_and_data_lines_then_a_blank_line() {
        let message = Message::notification("u1", "cv_update_request", json!({"cv_id": "cv-1"}));
        let event = encode(&message).unwrap();

        let text = wire_text(vec![event]).await;

        assert_eq!(
            text,
            format!(
                "id: {}\nevent: cv_update_request\ndata: {{\"cv_id\":\"cv-1\"}}\n\n",
                message.id()
            )
        );
    }

    #[tokio::test]
    async fn consecutive_messages_are_separate_frames() {
        let first = Message::broadcast("notification", json!({"n": 1}));
        let second = Message::broadcast("notification", json!({"n": 2}));

        let text = wire_text(vec![encode(&first).unwrap(), encode(&second).unwrap()]).await;
        let frames: Vec<&str> = text.split_terminator("\n\n").collect();

        assert_eq!(frames.len(), 2);
        assert!(frames[0].ends_with("data: {\"n\":1}"));
        assert!(frames[1].ends_with("data: {\"n\":2}"));
    }

    #[test]
    fn rejects_event_names_with_line_breaks() {
        let message = Message::broadcast("bad\nevent", json!({}));

        let err = encode(&message).unwrap_err();

        assert_eq!(
            err.error_kind,
            ErrorKind::Encoding(EncodingErrorKind::InvalidField { field: "event" })
        );
    }

    #[test]
    fn rejects_ids_with_line_breaks() {
        let message = Message::notification("evil\r\nuser", "notice", json!({}));

        let err = encode(&message).unwrap_err();

        assert_eq!(
            err.error_kind,
            ErrorKind::Encoding(EncodingErrorKind::InvalidField { field: "id" })
        );
    }
}
