//! Agora - social network backend
//!
//! This library provides the core of the Agora server: credential hashing,
//! identity tokens, authentication gates, per-client rate limiting, request
//! logging and the HTTP handlers built on them.

pub mod auth;
pub mod broadcast;
pub mod config;
pub mod error;
pub mod mail;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod server;
pub mod store;
pub mod validation;

use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use tracing::{info, warn};

pub use crate::auth::{PasswordHasher, TokenService};
pub use crate::broadcast::Broadcaster;
pub use crate::config::Config;
pub use crate::mail::{HttpMailer, LogMailer, Mailer};
pub use crate::middleware::rate_limiter::{RateLimitConfig, RateLimiter};
pub use crate::store::{MemoryStore, Store};

use crate::models::NewUser;

/// Application state shared across all request handlers
pub struct AppState {
    pub config: Config,
    pub start_time: Instant,
    pub tokens: Arc<TokenService>,
    pub passwords: PasswordHasher,
    pub rate_limiter: Arc<RateLimiter>,
    pub store: Arc<dyn Store>,
    pub mailer: Arc<dyn Mailer>,
    /// Background admin broadcasts; drained on shutdown
    pub broadcaster: Broadcaster,
}

impl AppState {
    /// Create the application state with the in-memory store and the mailer
    /// selected by configuration.
    pub fn new(config: Config) -> Result<Self> {
        let mailer: Arc<dyn Mailer> = match &config.mail_api_url {
            Some(url) => {
                let http_client = reqwest::Client::builder()
                    .pool_max_idle_per_host(10)
                    .timeout(std::time::Duration::from_secs(30))
                    .build()
                    .context("failed to build mail HTTP client")?;
                info!(url = %url, "Using HTTP mail relay");
                Arc::new(HttpMailer::new(
                    http_client,
                    url.clone(),
                    config.mail_api_key.clone(),
                    config.mail_from.clone(),
                ))
            }
            None => {
                warn!("MAIL_API_URL not set, outgoing mail will only be logged");
                Arc::new(LogMailer)
            }
        };

        Ok(Self::with_collaborators(
            config,
            Arc::new(MemoryStore::new()),
            mailer,
        ))
    }

    /// Create the application state around an explicit store and mailer.
    pub fn with_collaborators(
        config: Config,
        store: Arc<dyn Store>,
        mailer: Arc<dyn Mailer>,
    ) -> Self {
        let tokens = Arc::new(TokenService::new(&config.jwt_secret));
        let passwords = PasswordHasher::new(config.bcrypt_cost);
        let rate_limiter = Arc::new(RateLimiter::new(RateLimitConfig::with_max_clients(
            config.rate_limit_max_clients,
        )));
        let broadcaster = Broadcaster::new(mailer.clone());

        Self {
            config,
            start_time: Instant::now(),
            tokens,
            passwords,
            rate_limiter,
            store,
            mailer,
            broadcaster,
        }
    }

    /// Create the configured admin account if it does not exist yet.
    ///
    /// Does nothing unless both `ADMIN_EMAIL` and `ADMIN_PASSWORD` are set.
    pub async fn bootstrap_admin(&self) -> Result<()> {
        let (Some(email), Some(password)) =
            (&self.config.admin_email, &self.config.admin_password)
        else {
            return Ok(());
        };

        if self.store.find_credentials(email).await?.is_some() {
            info!(email = %email, "Admin account already present");
            return Ok(());
        }

        let hasher = self.passwords;
        let password = password.clone();
        let password_hash = tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .context("password hashing task failed")??;

        let admin = self
            .store
            .create_user(NewUser {
                username: self.config.admin_username.clone(),
                email: email.clone(),
                password_hash,
                is_admin: true,
                is_active: true,
            })
            .await?;

        info!(user_id = admin.id, email = %email, "Admin account created");
        Ok(())
    }
}
