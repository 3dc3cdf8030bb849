//! Outgoing email
//!
//! [`Mailer`] is the delivery seam used by registration and admin
//! broadcasts. [`HttpMailer`] talks to a JSON mail relay; [`LogMailer`] only
//! writes the message to the log and is used when no relay is configured.

pub mod http;

use async_trait::async_trait;
use thiserror::Error;
use tracing::info;

pub use self::http::HttpMailer;

/// A file attached to an outgoing message
#[derive(Debug, Clone)]
pub struct Attachment {
    pub filename: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

#[derive(Debug, Error)]
pub enum MailError {
    #[error("mail transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("mail relay rejected the message with status {status}")]
    Rejected { status: u16 },
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(
        &self,
        to: &str,
        subject: &str,
        body: &str,
        attachment: Option<&Attachment>,
    ) -> Result<(), MailError>;
}

/// Mailer that records deliveries in the log instead of sending them
#[derive(Debug, Default, Clone)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(
        &self,
        to: &str,
        subject: &str,
        body: &str,
        attachment: Option<&Attachment>,
    ) -> Result<(), MailError> {
        info!(
            to = %to,
            subject = %subject,
            body_len = body.len(),
            attachment = attachment.map(|a| a.filename.as_str()),
            "Mail relay not configured, message logged only"
        );
        Ok(())
    }
}
