//! Identity token service
//!
//! Issues and verifies HMAC-signed JWTs carrying the caller's user id and
//! admin flag. Verification is stateless: there is no revocation list, a
//! token simply stops verifying 24 hours after it was issued.

use chrono::Utc;
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Lifetime of every issued token
pub const TOKEN_LIFETIME_SECS: i64 = 24 * 60 * 60;

/// Decoded token payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: i64,
    pub is_admin: bool,
    /// Issued-at, seconds since the Unix epoch
    pub iat: i64,
    /// Expiration, seconds since the Unix epoch
    pub exp: i64,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("unexpected signing method")]
    UnexpectedSigningMethod,

    #[error("invalid signature")]
    InvalidSignature,

    #[error("token expired")]
    Expired,

    #[error("malformed token")]
    Malformed,

    #[error("failed to sign token")]
    Signing,
}

impl From<jsonwebtoken::errors::Error> for TokenError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        match err.kind() {
            ErrorKind::InvalidSignature => TokenError::InvalidSignature,
            ErrorKind::InvalidAlgorithm | ErrorKind::InvalidAlgorithmName => {
                TokenError::UnexpectedSigningMethod
            }
            ErrorKind::ExpiredSignature => TokenError::Expired,
            _ => TokenError::Malformed,
        }
    }
}

/// Signs and verifies identity tokens with a single process-wide secret.
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl TokenService {
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.algorithms = vec![Algorithm::HS256, Algorithm::HS384, Algorithm::HS512];
        // Expiry is checked against an explicit clock in `verify_at`, with no leeway.
        validation.validate_exp = false;

        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    /// Issue a token valid for 24 hours from now.
    pub fn issue(&self, user_id: i64, is_admin: bool) -> Result<String, TokenError> {
        self.issue_at(user_id, is_admin, Utc::now().timestamp())
    }

    pub fn issue_at(&self, user_id: i64, is_admin: bool, now: i64) -> Result<String, TokenError> {
        let claims = Claims {
            user_id,
            is_admin,
            iat: now,
            exp: now + TOKEN_LIFETIME_SECS,
        };

        debug!(user_id, is_admin, exp = claims.exp, "Issuing identity token");

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|_| TokenError::Signing)
    }

    /// Verify a token against the current time.
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        self.verify_at(token, Utc::now().timestamp())
    }

    /// Verify signature and algorithm, then reject when `now` is at or past
    /// the expiration.
    pub fn verify_at(&self, token: &str, now: i64) -> Result<Claims, TokenError> {
        let data = decode::<Claims>(token, &self.decoding, &self.validation)?;

        if now >= data.claims.exp {
            return Err(TokenError::Expired);
        }

        Ok(data.claims)
    }
}
