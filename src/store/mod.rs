//! Persistence layer
//!
//! [`Store`] is the CRUD surface the handlers depend on. [`MemoryStore`] is
//! the in-process implementation.

pub mod memory;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{AdminStats, Comment, NewUser, Post, PostFilter, User, UserCredentials};

pub use self::memory::MemoryStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("record not found")]
    NotFound,

    #[error("{0}")]
    Conflict(String),

    #[error("backend failure: {0}")]
    Backend(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Persistence operations.
///
/// Methods returning `bool` report whether a row was affected; author-scoped
/// updates and deletes return `false` both when the record is missing and
/// when the caller does not own it.
#[async_trait]
pub trait Store: Send + Sync {
    // Users

    /// Insert a user; `Conflict` if the email is already registered.
    async fn create_user(&self, user: NewUser) -> StoreResult<User>;

    async fn find_credentials(&self, email: &str) -> StoreResult<Option<UserCredentials>>;

    /// Remember the pending verification code for `email`.
    async fn save_verification_code(&self, email: &str, code: u32) -> StoreResult<()>;

    /// Activate the account if `code` matches the pending one.
    async fn activate(&self, email: &str, code: u32) -> StoreResult<bool>;

    async fn get_user(&self, id: i64) -> StoreResult<Option<User>>;

    async fn list_users(&self) -> StoreResult<Vec<User>>;

    async fn update_profile(&self, id: i64, username: &str, password_hash: &str)
        -> StoreResult<bool>;

    /// Admin edit of username and email; `Conflict` if the email belongs to
    /// another account.
    async fn edit_user(&self, id: i64, username: &str, email: &str) -> StoreResult<bool>;

    /// Delete a user together with their posts and comments.
    async fn delete_user(&self, id: i64) -> StoreResult<bool>;

    /// A user's posts, newest first.
    async fn user_posts(&self, user_id: i64) -> StoreResult<Vec<Post>>;

    // Posts

    async fn create_post(&self, user_id: i64, content: &str) -> StoreResult<Post>;

    async fn list_posts(&self, filter: &PostFilter) -> StoreResult<Vec<Post>>;

    async fn update_post(&self, id: i64, author_id: i64, content: &str) -> StoreResult<bool>;

    async fn delete_post(&self, id: i64, author_id: i64) -> StoreResult<bool>;

    // Comments

    /// `NotFound` if the post does not exist.
    async fn create_comment(&self, post_id: i64, user_id: i64, content: &str)
        -> StoreResult<Comment>;

    async fn list_comments(&self) -> StoreResult<Vec<Comment>>;

    async fn update_comment(&self, id: i64, author_id: i64, content: &str) -> StoreResult<bool>;

    /// The comment's author, or the author of the post it belongs to, may
    /// delete it.
    async fn delete_comment(&self, id: i64, caller_id: i64) -> StoreResult<bool>;

    // Dashboard

    async fn stats(&self) -> StoreResult<AdminStats>;
}
