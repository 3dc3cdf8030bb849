//! JSON mail relay client

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::Serialize;
use tracing::{debug, error, instrument};

use super::{Attachment, MailError, Mailer};

#[derive(Debug, Serialize)]
struct RelayMessage<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    body: &'a str,
    attachments: Vec<RelayAttachment<'a>>,
}

#[derive(Debug, Serialize)]
struct RelayAttachment<'a> {
    filename: &'a str,
    content_type: &'a str,
    /// base64 (standard alphabet, padded)
    content: String,
}

/// Delivers mail by POSTing JSON to an HTTP relay
pub struct HttpMailer {
    client: reqwest::Client,
    url: String,
    api_key: Option<String>,
    from: String,
}

impl HttpMailer {
    pub fn new(
        client: reqwest::Client,
        url: impl Into<String>,
        api_key: Option<String>,
        from: impl Into<String>,
    ) -> Self {
        Self {
            client,
            url: url.into(),
            api_key,
            from: from.into(),
        }
    }
}

#[async_trait]
impl Mailer for HttpMailer {
    #[instrument(skip(self, body, attachment), fields(to = %to))]
    async fn send(
        &self,
        to: &str,
        subject: &str,
        body: &str,
        attachment: Option<&Attachment>,
    ) -> Result<(), MailError> {
        let message = RelayMessage {
            from: &self.from,
            to,
            subject,
            body,
            attachments: attachment
                .map(|a| RelayAttachment {
                    filename: &a.filename,
                    content_type: &a.content_type,
                    content: STANDARD.encode(&a.data),
                })
                .into_iter()
                .collect(),
        };

        let mut request = self.client.post(&self.url).json(&message);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await?;
        let status = response.status();

        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            error!(status = %status, body = %text, "Mail relay rejected message");
            return Err(MailError::Rejected {
                status: status.as_u16(),
            });
        }

        debug!(status = %status, "Mail relay accepted message");
        Ok(())
    }
}
