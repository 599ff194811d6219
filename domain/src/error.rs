//! Error types for the `domain` layer.
use jsonwebtoken::errors::ErrorKind as JwtErrorKind;
use std::error::Error as StdError;
use std::fmt;

/// Top-level domain error type.
/// Errors in the Domain layer are modeled as a tree with `domain::error::Error` as the
/// root holding an `error_kind` enum and, optionally, the original error in `source`.
/// `web` depends on `domain` and uses the `error_kind`s to pick HTTP status codes,
/// without depending on the crates that produced the original errors.
#[derive(Debug)]
pub struct Error {
    pub source: Option<Box<dyn StdError + Send + Sync>>,
    pub error_kind: DomainErrorKind,
}

/// Enum representing the major categories of errors that can occur in the `domain` layer.
#[derive(Debug, PartialEq)]
pub enum DomainErrorKind {
    Internal(InternalErrorKind),
    Authentication(AuthenticationErrorKind),
}

/// Enum representing the various kinds of internal errors that can occur in the `domain` layer.
#[derive(Debug, PartialEq)]
pub enum InternalErrorKind {
    Config,
    Other(String),
}

/// Why a bearer token was refused.
#[derive(Debug, PartialEq)]
pub enum AuthenticationErrorKind {
    MissingToken,
    InvalidToken,
    ExpiredToken,
}

impl Error {
    pub fn authentication(kind: AuthenticationErrorKind) -> Self {
        Error {
            source: None,
            error_kind: DomainErrorKind::Authentication(kind),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Domain Error: {self:?}")
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn StdError + 'static))
    }
}

impl From<jsonwebtoken::errors::Error> for Error {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        let kind = match err.kind() {
            JwtErrorKind::ExpiredSignature => AuthenticationErrorKind::ExpiredToken,
            _ => AuthenticationErrorKind::InvalidToken,
        };

        Error {
            source: Some(Box::new(err)),
            error_kind: DomainErrorKind::Authentication(kind),
        }
    }
}
