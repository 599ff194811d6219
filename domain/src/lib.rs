//! Domain layer: who a caller is, and what the platform announces when CV data changes.

pub mod cv_request;
pub mod error;
pub mod jwt;

// Re-exported so callers only need `domain` to publish notifications.
pub use events;
