use std::error::Error as StdError;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use domain::error::{AuthenticationErrorKind, DomainErrorKind, Error as DomainError};

#[derive(Debug)]
pub struct Error(DomainError);

impl Error {
    pub fn kind(&self) -> &DomainErrorKind {
        &self.0.error_kind
    }
}

impl StdError for Error {}

impl std::fmt::Display for Error {
    fn fmt(&self, fmt: &mut std::fmt::Formatter) -> core::result::Result<(), std::fmt::Error> {
        write!(fmt, "{self:?}")
    }
}

fn error_body(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "status": "error", "message": message }))).into_response()
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match self.0.error_kind {
            DomainErrorKind::Authentication(authentication_error_kind) => {
                match authentication_error_kind {
                    AuthenticationErrorKind::MissingToken => {
                        error_body(StatusCode::UNAUTHORIZED, "Authentication token required")
                    }
                    AuthenticationErrorKind::InvalidToken
                    | AuthenticationErrorKind::ExpiredToken => {
                        error_body(StatusCode::UNAUTHORIZED, "Invalid authentication token")
                    }
                }
            }
            DomainErrorKind::Internal(_) => {
                error_body(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
        }
    }
}

impl<E> From<E> for Error
where
    E: Into<DomainError>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}
