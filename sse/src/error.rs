//! Error types for the `sse` crate.
//!
//! Follows the same shape as `domain::error`: a root `Error` holding an
//! `error_kind` tree plus an optional source for chaining.

use std::error::Error as StdError;
use std::fmt;

#[derive(Debug)]
pub struct Error {
    pub source: Option<Box<dyn StdError + Send + Sync>>,
    pub error_kind: ErrorKind,
}

#[derive(Debug, PartialEq)]
pub enum ErrorKind {
    /// A message could not be turned into an SSE frame.
    Encoding(EncodingErrorKind),
    /// The hub task is no longer running.
    HubUnavailable,
}

#[derive(Debug, PartialEq)]
pub enum EncodingErrorKind {
    /// Field values may not contain line breaks or NUL, the frame would be corrupted.
    InvalidField { field: &'static str },
    /// The payload could not be serialized to JSON.
    Payload,
}

impl Error {
    pub(crate) fn invalid_field(field: &'static str) -> Self {
        Self {
            source: None,
            error_kind: ErrorKind::Encoding(EncodingErrorKind::InvalidField { field }),
        }
    }

    pub(crate) fn hub_unavailable() -> Self {
        Self {
            source: None,
            error_kind: ErrorKind::HubUnavailable,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.error_kind {
            ErrorKind::Encoding(EncodingErrorKind::InvalidField { field }) => {
                write!(f, "SSE encoding error: invalid characters in `{field}`")
            }
            ErrorKind::Encoding(EncodingErrorKind::Payload) => {
                write!(f, "SSE encoding error: payload is not serializable")
            }
            ErrorKind::HubUnavailable => write!(f, "SSE hub is not running"),
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn StdError + 'static))
    }
}

impl From<axum::Error> for Error {
    fn from(err: axum::Error) -> Self {
        Self {
            source: Some(Box::new(err)),
            error_kind: ErrorKind::Encoding(EncodingErrorKind::Payload),
        }
    }
}
