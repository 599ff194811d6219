//! Verification of the bearer tokens presented when opening an SSE connection.
//!
//! Tokens are HS256 JWTs carrying [`claims::AccessClaims`]. Verification checks the
//! signature and expiry and yields the caller's [`Identity`]. Token issuance is
//! owned by the login flow; [`generate_token`] exists for tooling and tests that
//! need a token signed with the same secret.

use crate::error::{AuthenticationErrorKind, DomainErrorKind, Error, InternalErrorKind};
use chrono::{Duration, Utc};
use claims::AccessClaims;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use log::*;
use service::config::Config;

pub mod claims;

/// How long an issued access token stays valid.
pub const TOKEN_EXPIRATION_HOURS: i64 = 24;

/// Who is behind a verified token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: String,
    pub roles: Vec<String>,
}

/// Turns an opaque bearer string into an [`Identity`].
pub trait TokenVerifier: Send + Sync {
    fn verify(&self, token: &str) -> Result<Identity, Error>;
}

fn missing_secret() -> Error {
    warn!("Failed to get JWT secret from config");
    Error {
        source: None,
        error_kind: DomainErrorKind::Internal(InternalErrorKind::Config),
    }
}

/// HS256 verifier using the configured shared secret.
pub struct JwtVerifier {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtVerifier {
    pub fn new(config: &Config) -> Result<Self, Error> {
        let secret = config.jwt_secret().ok_or_else(missing_secret)?;
        Ok(Self::from_secret(secret.as_bytes()))
    }

    pub fn from_secret(secret: &[u8]) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;

        Self {
            decoding_key: DecodingKey::from_secret(secret),
            validation,
        }
    }
}

impl TokenVerifier for JwtVerifier {
    fn verify(&self, token: &str) -> Result<Identity, Error> {
        debug!("Verifying access token ({} bytes)", token.len());

        let token_data = decode::<AccessClaims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| {
                debug!("Access token rejected: {e}");
                Error::from(e)
            })?;
        let claims = token_data.claims;

        if claims.user_id.is_empty() {
            debug!("Access token rejected: empty user_id claim");
            return Err(Error::authentication(AuthenticationErrorKind::InvalidToken));
        }

        Ok(Identity {
            user_id: claims.user_id,
            roles: claims.roles,
        })
    }
}

/// Signs an access token for `user_id` with the configured secret.
pub fn generate_token(config: &Config, user_id: &str, roles: Vec<String>) -> Result<String, Error> {
    let secret = config.jwt_secret().ok_or_else(missing_secret)?;
    encode_token(secret.as_bytes(), user_id, roles)
}

/// Signs an access token for `user_id` with an explicit secret.
pub fn encode_token(secret: &[u8], user_id: &str, roles: Vec<String>) -> Result<String, Error> {
    let now = Utc::now();
    let claims = AccessClaims {
        user_id: user_id.to_string(),
        roles,
        sub: user_id.to_string(),
        exp: (now + Duration::hours(TOKEN_EXPIRATION_HOURS)).timestamp(),
        iat: now.timestamp(),
    };

    let token = encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret),
    )
    .map_err(|e| Error {
        source: Some(Box::new(e)),
        error_kind: DomainErrorKind::Internal(InternalErrorKind::Other(
            "JWT encoding related error".to_string(),
        )),
    })?;

    Ok(token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    const SECRET: &[u8] = b"test-secret";

    fn signed(claims: &AccessClaims, secret: &[u8]) -> String {
        encode(
            &Header::new(Algorithm::HS256),
            claims,
            &EncodingKey::from_secret(secret),
        )
        .unwrap()
    }

    fn claims_for(user_id: &str, exp_offset: Duration) -> AccessClaims {
        let now = Utc::now();
        AccessClaims {
            user_id: user_id.to_string(),
            roles: vec!["Employee".to_string()],
            sub: user_id.to_string(),
            exp: (now + exp_offset).timestamp(),
            iat: now.timestamp(),
        }
    }

    #[test]
    fn valid_token_yields_identity_and_roles() {
        let token = encode_token(SECRET, "u1", vec!["PM".to_string(), "Employee".to_string()]).unwrap();

        let identity = JwtVerifier::from_secret(SECRET).verify(&token).unwrap();

        assert_eq!(
            identity,
            Identity {
                user_id: "u1".to_string(),
                roles: vec!["PM".to_string(), "Employee".to_string()],
            }
        );
    }

    #[test]
    fn token_signed_with_another_secret_is_invalid() {
        let token = encode_token(b"other-secret", "u1", vec![]).unwrap();

        let err = JwtVerifier::from_secret(SECRET).verify(&token).unwrap_err();

        assert_eq!(
            err.error_kind,
            DomainErrorKind::Authentication(AuthenticationErrorKind::InvalidToken)
        );
    }

    #[test]
    fn expired_token_is_rejected_as_expired() {
        // Well past the default validation leeway.
        let token = signed(&claims_for("u1", Duration::hours(-2)), SECRET);

        let err = JwtVerifier::from_secret(SECRET).verify(&token).unwrap_err();

        assert_eq!(
            err.error_kind,
            DomainErrorKind::Authentication(AuthenticationErrorKind::ExpiredToken)
        );
    }

    #[test]
    fn token_without_sub_or_iat_is_accepted() {
        let claims = serde_json::json!({
            "user_id": "u1",
            "roles": ["PM"],
            "exp": (Utc::now() + Duration::hours(1)).timestamp(),
        });
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(SECRET),
        )
        .unwrap();

        let identity = JwtVerifier::from_secret(SECRET).verify(&token).unwrap();

        assert_eq!(identity.user_id, "u1");
        assert_eq!(identity.roles, vec!["PM".to_string()]);
    }

    #[test]
    fn garbage_is_invalid() {
        let err = JwtVerifier::from_secret(SECRET)
            .verify("not-a-jwt")
            .unwrap_err();

        assert_eq!(
            err.error_kind,
            DomainErrorKind::Authentication(AuthenticationErrorKind::InvalidToken)
        );
    }

    #[test]
    fn empty_user_id_is_invalid() {
        let token = signed(&claims_for("", Duration::hours(1)), SECRET);

        let err = JwtVerifier::from_secret(SECRET).verify(&token).unwrap_err();

        assert_eq!(
            err.error_kind,
            DomainErrorKind::Authentication(AuthenticationErrorKind::InvalidToken)
        );
    }

    #[test]
    fn verifier_requires_a_configured_secret() {
        let config = Config::parse_from(["cv_platform_rs"]);
        if config.jwt_secret().is_some() {
            // JWT_SECRET is set in this environment; nothing to check.
            return;
        }

        let err = JwtVerifier::new(&config).err().unwrap();

        assert_eq!(
            err.error_kind,
            DomainErrorKind::Internal(InternalErrorKind::Config)
        );
    }

    #[test]
    fn generate_token_round_trips_through_the_configured_verifier() {
        let config = Config::parse_from(["cv_platform_rs"]).set_jwt_secret("configured".to_string());

        let token = generate_token(&config, "u7", vec![]).unwrap();
        let identity = JwtVerifier::new(&config).unwrap().verify(&token).unwrap();

        assert_eq!(identity.user_id, "u7");
        assert!(identity.roles.is_empty());
    }
}
