//! Claims carried by the platform's access tokens.
//!
//! The login flow that issues these tokens lives outside this service; the
//! layout below is what it signs and what the SSE admission step expects.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AccessClaims {
    /// The authenticated user.
    pub user_id: String,
    /// Role labels such as `Admin`, `PM`, `BUL/Lead` or `Employee`.
    #[serde(default)]
    pub roles: Vec<String>,
    /// Subject, the same value as `user_id`. Optional on incoming tokens.
    #[serde(default)]
    pub sub: String,
    /// Expiration timestamp (Unix seconds).
    pub exp: i64,
    /// Issued at timestamp (Unix seconds). Optional on incoming tokens.
    #[serde(default)]
    pub iat: i64,
}
