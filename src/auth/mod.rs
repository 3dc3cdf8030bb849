//! Authentication primitives
//!
//! Password hashing and signed identity tokens. The HTTP gates that use these
//! live in `crate::middleware::auth`.

pub mod password;
pub mod token;

pub use password::{PasswordError, PasswordHasher};
pub use token::{Claims, TokenError, TokenService};
