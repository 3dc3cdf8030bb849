//! Domain records shared by the store and the HTTP handlers.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

/// A registered account
#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub is_admin: bool,
    /// Set once the email verification code has been confirmed
    #[serde(skip_serializing)]
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields for inserting a user
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub is_admin: bool,
    pub is_active: bool,
}

/// What login needs to know about an account
#[derive(Debug, Clone)]
pub struct UserCredentials {
    pub id: i64,
    pub password_hash: String,
    pub is_admin: bool,
    pub is_active: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct Post {
    pub id: i64,
    pub user_id: i64,
    pub username: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Comment {
    pub id: i64,
    pub post_id: i64,
    pub user_id: i64,
    pub username: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// Post listing filters; all present filters must match.
#[derive(Debug, Clone)]
pub struct PostFilter {
    /// Case-insensitive substring of the content
    pub keyword: Option<String>,
    pub user_id: Option<i64>,
    /// Calendar day (UTC) the post was created on
    pub date: Option<NaiveDate>,
    /// Case-insensitive substring of the author's username
    pub username: Option<String>,
    /// 1-based page number
    pub page: u32,
    pub page_size: u32,
}

impl Default for PostFilter {
    fn default() -> Self {
        Self {
            keyword: None,
            user_id: None,
            date: None,
            username: None,
            page: 1,
            page_size: 10,
        }
    }
}

/// Admin dashboard counters
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AdminStats {
    pub total_users: usize,
    pub total_posts: usize,
    pub total_comments: usize,
    /// Distinct users who posted or commented in the last 24 hours
    pub active_users_24h: usize,
}
