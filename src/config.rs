//! Configuration management for Agora
//!
//! Configuration is loaded from environment variables.

use std::env;
use std::time::Duration;

use anyhow::{bail, Context, Result};

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,

    /// HMAC secret used to sign identity tokens
    pub jwt_secret: String,
    /// bcrypt work factor for password hashing
    pub bcrypt_cost: u32,

    /// Upper bound on distinct client addresses tracked by the rate limiter
    pub rate_limit_max_clients: usize,

    /// How long in-flight requests may run after a shutdown signal
    pub shutdown_grace: Duration,
    /// Per-request timeout
    pub request_timeout: Duration,

    /// Mail relay endpoint; `None` means deliveries are only logged
    pub mail_api_url: Option<String>,
    /// Bearer key for the mail relay
    pub mail_api_key: Option<String>,
    /// Sender address for outgoing mail
    pub mail_from: String,

    /// Seed admin account created at startup when both are set
    pub admin_email: Option<String>,
    pub admin_password: Option<String>,
    pub admin_username: String,

    /// Emit JSON log lines instead of the pretty formatter
    pub log_json: bool,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let jwt_secret = lookup("JWT_SECRET")
            .filter(|s| !s.trim().is_empty())
            .context("JWT_SECRET must be set")?;

        let bcrypt_cost: u32 = lookup("BCRYPT_COST")
            .unwrap_or_else(|| bcrypt::DEFAULT_COST.to_string())
            .parse()
            .context("Invalid BCRYPT_COST")?;
        if !(4..=31).contains(&bcrypt_cost) {
            bail!("BCRYPT_COST must be between 4 and 31, got {}", bcrypt_cost);
        }

        let rate_limit_max_clients: usize = lookup("RATE_LIMIT_MAX_CLIENTS")
            .unwrap_or_else(|| "100000".to_string())
            .parse()
            .context("Invalid RATE_LIMIT_MAX_CLIENTS")?;
        if rate_limit_max_clients == 0 {
            bail!("RATE_LIMIT_MAX_CLIENTS must be positive");
        }

        Ok(Self {
            host: lookup("APP_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: lookup("APP_PORT")
                .unwrap_or_else(|| "8080".to_string())
                .parse()
                .context("Invalid APP_PORT")?,

            jwt_secret,
            bcrypt_cost,
            rate_limit_max_clients,

            shutdown_grace: Duration::from_secs(
                lookup("SHUTDOWN_GRACE_SECONDS")
                    .unwrap_or_else(|| "30".to_string())
                    .parse()
                    .context("Invalid SHUTDOWN_GRACE_SECONDS")?,
            ),
            request_timeout: Duration::from_secs(
                lookup("REQUEST_TIMEOUT_SECONDS")
                    .unwrap_or_else(|| "15".to_string())
                    .parse()
                    .context("Invalid REQUEST_TIMEOUT_SECONDS")?,
            ),

            mail_api_url: lookup("MAIL_API_URL").filter(|s| !s.is_empty()),
            mail_api_key: lookup("MAIL_API_KEY").filter(|s| !s.is_empty()),
            mail_from: lookup("MAIL_FROM").unwrap_or_else(|| "no-reply@localhost".to_string()),

            admin_email: lookup("ADMIN_EMAIL").filter(|s| !s.is_empty()),
            admin_password: lookup("ADMIN_PASSWORD").filter(|s| !s.is_empty()),
            admin_username: lookup("ADMIN_USERNAME").unwrap_or_else(|| "admin".to_string()),

            log_json: lookup("LOG_FORMAT")
                .map(|v| v.eq_ignore_ascii_case("json"))
                .unwrap_or(false),
        })
    }
}
