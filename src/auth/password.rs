//! Credential hashing with bcrypt.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("password hashing failed: {0}")]
    Hashing(#[source] bcrypt::BcryptError),

    #[error("stored password hash is malformed: {0}")]
    MalformedHash(#[source] bcrypt::BcryptError),
}

/// Salted, deliberately slow password hasher.
///
/// Each call to [`PasswordHasher::hash`] draws a fresh random salt, so hashing
/// the same password twice yields different digests. Comparison is delegated
/// to `bcrypt::verify`, which compares in constant time.
#[derive(Debug, Clone, Copy)]
pub struct PasswordHasher {
    cost: u32,
}

impl PasswordHasher {
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }

    pub fn hash(&self, plaintext: &str) -> Result<String, PasswordError> {
        bcrypt::hash(plaintext, self.cost).map_err(PasswordError::Hashing)
    }

    /// Returns `Ok(false)` on mismatch and `Err(MalformedHash)` when `digest`
    /// is not a bcrypt hash at all.
    pub fn verify(&self, plaintext: &str, digest: &str) -> Result<bool, PasswordError> {
        bcrypt::verify(plaintext, digest).map_err(PasswordError::MalformedHash)
    }
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self::new(bcrypt::DEFAULT_COST)
    }
}
