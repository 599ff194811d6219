//! HTTP entry point for the notification stream.
//!
//! The hub, mailboxes and wire encoding live in the `sse` crate; this module only
//! admits the caller and adapts its mailbox to an axum `Sse` response.

pub(crate) mod handler;
