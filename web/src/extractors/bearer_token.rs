use crate::error::Error;
use crate::params::sse::ConnectParams;
use axum::{
    async_trait,
    extract::{FromRequestParts, Query},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap, Uri},
};
use domain::error::{AuthenticationErrorKind, Error as DomainError};
use log::*;

/// The raw bearer token of a request: the `token` query parameter if present,
/// otherwise the `Authorization: Bearer <token>` header.
pub(crate) struct BearerToken(pub String);

#[async_trait]
impl<S> FromRequestParts<S> for BearerToken
where
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        if let Some(token) = from_query(&parts.uri) {
            trace!("Bearer token taken from query parameter");
            return Ok(BearerToken(token));
        }

        if let Some(token) = from_header(&parts.headers) {
            trace!("Bearer token taken from Authorization header");
            return Ok(BearerToken(token));
        }

        warn!("Rejecting request to {}: no token provided", parts.uri.path());
        Err(DomainError::authentication(AuthenticationErrorKind::MissingToken).into())
    }
}

fn from_query(uri: &Uri) -> Option<String> {
    let Query(params) = Query::<ConnectParams>::try_from_uri(uri).ok()?;
    params.token.filter(|token| !token.is_empty())
}

fn from_header(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ")?.trim();
    (!token.is_empty()).then(|| token.to_string())
}
