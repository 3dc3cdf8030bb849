//! In-memory store implementation
//!
//! Keeps every table in a `BTreeMap` keyed by id behind a single `RwLock`.
//! Usernames are joined into posts and comments at read time, so renames
//! are reflected immediately.

use std::collections::{BTreeMap, HashMap, HashSet};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use parking_lot::RwLock;

use crate::models::{AdminStats, Comment, NewUser, Post, PostFilter, User, UserCredentials};

use super::{Store, StoreError, StoreResult};

#[derive(Debug, Clone)]
struct PostRow {
    id: i64,
    user_id: i64,
    content: String,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
struct CommentRow {
    id: i64,
    post_id: i64,
    user_id: i64,
    content: String,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct Tables {
    users: BTreeMap<i64, User>,
    posts: BTreeMap<i64, PostRow>,
    comments: BTreeMap<i64, CommentRow>,
    /// email -> pending verification code
    pending_codes: HashMap<String, u32>,
    next_user_id: i64,
    next_post_id: i64,
    next_comment_id: i64,
}

impl Tables {
    fn username(&self, user_id: i64) -> String {
        self.users
            .get(&user_id)
            .map(|u| u.username.clone())
            .unwrap_or_default()
    }

    fn email_taken(&self, email: &str, except: Option<i64>) -> bool {
        self.users
            .values()
            .any(|u| u.email == email && Some(u.id) != except)
    }

    fn post(&self, row: &PostRow) -> Post {
        Post {
            id: row.id,
            user_id: row.user_id,
            username: self.username(row.user_id),
            content: row.content.clone(),
            created_at: row.created_at,
        }
    }

    fn comment(&self, row: &CommentRow) -> Comment {
        Comment {
            id: row.id,
            post_id: row.post_id,
            user_id: row.user_id,
            username: self.username(row.user_id),
            content: row.content.clone(),
            created_at: row.created_at,
        }
    }

    fn next_id(counter: &mut i64) -> i64 {
        *counter += 1;
        *counter
    }
}

/// In-process [`Store`]
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    fn backdate_post(&self, id: i64, created_at: DateTime<Utc>) {
        if let Some(row) = self.tables.write().posts.get_mut(&id) {
            row.created_at = created_at;
        }
    }
}

fn newest_first(posts: &mut [Post]) {
    posts.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

#[async_trait]
impl Store for MemoryStore {
    async fn create_user(&self, user: NewUser) -> StoreResult<User> {
        let mut tables = self.tables.write();

        if tables.email_taken(&user.email, None) {
            return Err(StoreError::Conflict("Email already registered".to_string()));
        }

        let now = Utc::now();
        let id = Tables::next_id(&mut tables.next_user_id);
        let record = User {
            id,
            username: user.username,
            email: user.email,
            password_hash: user.password_hash,
            is_admin: user.is_admin,
            is_active: user.is_active,
            created_at: now,
            updated_at: now,
        };
        tables.users.insert(id, record.clone());

        Ok(record)
    }

    async fn find_credentials(&self, email: &str) -> StoreResult<Option<UserCredentials>> {
        let tables = self.tables.read();
        Ok(tables
            .users
            .values()
            .find(|u| u.email == email)
            .map(|u| UserCredentials {
                id: u.id,
                password_hash: u.password_hash.clone(),
                is_admin: u.is_admin,
                is_active: u.is_active,
            }))
    }

    async fn save_verification_code(&self, email: &str, code: u32) -> StoreResult<()> {
        self.tables
            .write()
            .pending_codes
            .insert(email.to_string(), code);
        Ok(())
    }

    async fn activate(&self, email: &str, code: u32) -> StoreResult<bool> {
        let mut tables = self.tables.write();

        if tables.pending_codes.get(email) != Some(&code) {
            return Ok(false);
        }
        tables.pending_codes.remove(email);

        let now = Utc::now();
        let user = tables.users.values_mut().find(|u| u.email == email);
        match user {
            Some(user) => {
                user.is_active = true;
                user.updated_at = now;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn get_user(&self, id: i64) -> StoreResult<Option<User>> {
        Ok(self.tables.read().users.get(&id).cloned())
    }

    async fn list_users(&self) -> StoreResult<Vec<User>> {
        Ok(self.tables.read().users.values().cloned().collect())
    }

    async fn update_profile(
        &self,
        id: i64,
        username: &str,
        password_hash: &str,
    ) -> StoreResult<bool> {
        let mut tables = self.tables.write();
        match tables.users.get_mut(&id) {
            Some(user) => {
                user.username = username.to_string();
                user.password_hash = password_hash.to_string();
                user.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn edit_user(&self, id: i64, username: &str, email: &str) -> StoreResult<bool> {
        let mut tables = self.tables.write();

        if !tables.users.contains_key(&id) {
            return Ok(false);
        }
        if tables.email_taken(email, Some(id)) {
            return Err(StoreError::Conflict("Email already registered".to_string()));
        }

        if let Some(user) = tables.users.get_mut(&id) {
            user.username = username.to_string();
            user.email = email.to_string();
            user.updated_at = Utc::now();
        }
        Ok(true)
    }

    async fn delete_user(&self, id: i64) -> StoreResult<bool> {
        let mut tables = self.tables.write();

        let Some(user) = tables.users.remove(&id) else {
            return Ok(false);
        };

        let owned_posts: HashSet<i64> = tables
            .posts
            .values()
            .filter(|p| p.user_id == id)
            .map(|p| p.id)
            .collect();

        tables.posts.retain(|_, p| p.user_id != id);
        tables
            .comments
            .retain(|_, c| c.user_id != id && !owned_posts.contains(&c.post_id));
        tables.pending_codes.remove(&user.email);

        Ok(true)
    }

    async fn user_posts(&self, user_id: i64) -> StoreResult<Vec<Post>> {
        let tables = self.tables.read();
        let mut posts: Vec<Post> = tables
            .posts
            .values()
            .filter(|p| p.user_id == user_id)
            .map(|p| tables.post(p))
            .collect();
        newest_first(&mut posts);
        Ok(posts)
    }

    async fn create_post(&self, user_id: i64, content: &str) -> StoreResult<Post> {
        let mut tables = self.tables.write();

        if !tables.users.contains_key(&user_id) {
            return Err(StoreError::NotFound);
        }

        let id = Tables::next_id(&mut tables.next_post_id);
        let row = PostRow {
            id,
            user_id,
            content: content.to_string(),
            created_at: Utc::now(),
        };
        let post = tables.post(&row);
        tables.posts.insert(id, row);

        Ok(post)
    }

    async fn list_posts(&self, filter: &PostFilter) -> StoreResult<Vec<Post>> {
        let tables = self.tables.read();

        let mut posts: Vec<Post> = tables
            .posts
            .values()
            .map(|p| tables.post(p))
            .filter(|p| {
                filter
                    .keyword
                    .as_deref()
                    .map_or(true, |k| contains_ignore_case(&p.content, k))
                    && filter.user_id.map_or(true, |id| p.user_id == id)
                    && filter
                        .date
                        .map_or(true, |d| p.created_at.date_naive() == d)
                    && filter
                        .username
                        .as_deref()
                        .map_or(true, |u| contains_ignore_case(&p.username, u))
            })
            .collect();

        newest_first(&mut posts);

        let page_size = filter.page_size as usize;
        let offset = (filter.page.max(1) as usize - 1) * page_size;

        Ok(posts.into_iter().skip(offset).take(page_size).collect())
    }

    async fn update_post(&self, id: i64, author_id: i64, content: &str) -> StoreResult<bool> {
        let mut tables = self.tables.write();
        match tables.posts.get_mut(&id) {
            Some(post) if post.user_id == author_id => {
                post.content = content.to_string();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn delete_post(&self, id: i64, author_id: i64) -> StoreResult<bool> {
        let mut tables = self.tables.write();

        let owned = tables
            .posts
            .get(&id)
            .is_some_and(|p| p.user_id == author_id);
        if !owned {
            return Ok(false);
        }

        tables.posts.remove(&id);
        tables.comments.retain(|_, c| c.post_id != id);
        Ok(true)
    }

    async fn create_comment(
        &self,
        post_id: i64,
        user_id: i64,
        content: &str,
    ) -> StoreResult<Comment> {
        let mut tables = self.tables.write();

        if !tables.posts.contains_key(&post_id) {
            return Err(StoreError::NotFound);
        }

        let id = Tables::next_id(&mut tables.next_comment_id);
        let row = CommentRow {
            id,
            post_id,
            user_id,
            content: content.to_string(),
            created_at: Utc::now(),
        };
        let comment = tables.comment(&row);
        tables.comments.insert(id, row);

        Ok(comment)
    }

    async fn list_comments(&self) -> StoreResult<Vec<Comment>> {
        let tables = self.tables.read();
        Ok(tables.comments.values().map(|c| tables.comment(c)).collect())
    }

    async fn update_comment(&self, id: i64, author_id: i64, content: &str) -> StoreResult<bool> {
        let mut tables = self.tables.write();
        match tables.comments.get_mut(&id) {
            Some(comment) if comment.user_id == author_id => {
                comment.content = content.to_string();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn delete_comment(&self, id: i64, caller_id: i64) -> StoreResult<bool> {
        let mut tables = self.tables.write();

        let allowed = match tables.comments.get(&id) {
            Some(comment) => {
                let post_author = tables.posts.get(&comment.post_id).map(|p| p.user_id);
                comment.user_id == caller_id || post_author == Some(caller_id)
            }
            None => false,
        };

        if allowed {
            tables.comments.remove(&id);
        }
        Ok(allowed)
    }

    async fn stats(&self) -> StoreResult<AdminStats> {
        let tables = self.tables.read();
        let since = Utc::now() - Duration::hours(24);

        let active: HashSet<i64> = tables
            .posts
            .values()
            .filter(|p| p.created_at > since)
            .map(|p| p.user_id)
            .chain(
                tables
                    .comments
                    .values()
                    .filter(|c| c.created_at > since)
                    .map(|c| c.user_id),
            )
            .collect();

        Ok(AdminStats {
            total_users: tables.users.len(),
            total_posts: tables.posts.len(),
            total_comments: tables.comments.len(),
            active_users_24h: active.len(),
        })
    }
}
