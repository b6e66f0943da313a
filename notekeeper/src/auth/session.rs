//! Identity token issuance and verification.
//!
//! Tokens are compact HMAC-signed JWTs carrying `userId`, `email`, `role` and `exp`. The
//! server keeps no session state; a token is valid until `exp` passes.

use std::time::Duration;

use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::{
    api::models::users::{CurrentUser, Role},
    config::Config,
    errors::{AuthFailure, Error},
    types::UserId,
};

/// JWT payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    #[serde(rename = "userId")]
    pub user_id: String,
    pub email: String,
    pub role: Role,
    /// Expiry, Unix seconds
    pub exp: i64,
}

/// Signs and verifies identity tokens with a single process-wide secret.
///
/// Built once at startup and shared read-only across requests.
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    expiry: Duration,
}

impl std::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenService").field("expiry", &self.expiry).finish_non_exhaustive()
    }
}

impl TokenService {
    pub fn new(secret: &str, expiry: Duration) -> Result<Self, Error> {
        if secret.is_empty() {
            return Err(Error::Configuration {
                message: "secret_key is required to sign identity tokens".to_string(),
            });
        }

        // Only the HMAC family is accepted, whatever the token header claims
        let mut validation = Validation::new(Algorithm::HS256);
        validation.algorithms = vec![Algorithm::HS256, Algorithm::HS384, Algorithm::HS512];
        validation.leeway = 0;

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            expiry,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, Error> {
        let secret = config.secret_key.as_deref().unwrap_or_default();
        Self::new(secret, config.auth.security.jwt_expiry)
    }

    /// Issue a token for `user_id` that expires `expiry` from now.
    pub fn issue(&self, user_id: UserId, email: &str, role: Role) -> Result<String, Error> {
        let expiry = chrono::Duration::from_std(self.expiry).map_err(|e| Error::Configuration {
            message: format!("jwt_expiry out of range: {e}"),
        })?;
        let claims = SessionClaims {
            user_id: user_id.to_string(),
            email: email.to_string(),
            role,
            exp: (Utc::now() + expiry).timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key).map_err(|e| Error::Configuration {
            message: format!("failed to sign identity token: {e}"),
        })
    }

    /// Verify signature, algorithm and expiry, returning the identity the token carries.
    ///
    /// A token whose `exp` has passed reports `TokenExpired` whether or not its signature
    /// checks out; it is rejected either way.
    pub fn verify(&self, token: &str) -> Result<CurrentUser, AuthFailure> {
        let data = decode::<SessionClaims>(token, &self.decoding_key, &self.validation).map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => AuthFailure::TokenExpired,
            _ if has_expired(token) => AuthFailure::TokenExpired,
            _ => {
                debug!(error = %e, "token rejected");
                AuthFailure::InvalidToken
            }
        })?;

        let claims = data.claims;
        if claims.exp <= Utc::now().timestamp() {
            return Err(AuthFailure::TokenExpired);
        }

        let id = Uuid::parse_str(&claims.user_id).map_err(|_| AuthFailure::InvalidToken)?;
        Ok(CurrentUser {
            id,
            email: claims.email,
            role: claims.role,
        })
    }
}

/// Read `exp` without trusting the token. Only used to classify a token that already failed
/// verification, never to accept one.
fn has_expired(token: &str) -> bool {
    let mut validation = Validation::default();
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.required_spec_claims.clear();

    decode::<SessionClaims>(token, &DecodingKey::from_secret(&[]), &validation)
        .is_ok_and(|data| data.claims.exp <= Utc::now().timestamp())
}
