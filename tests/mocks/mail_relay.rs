//! Mock mail relay for testing
//!
//! Provides a wiremock-backed stand-in for the JSON relay `HttpMailer`
//! posts to:
//! - POST /send - accept or reject a message

#![allow(dead_code)]

use serde_json::Value;
use wiremock::{
    matchers::{header, method, path},
    Mock, MockServer, ResponseTemplate,
};

pub const TEST_MAIL_API_KEY: &str = "test-mail-api-key";

/// Mock mail relay server wrapper
pub struct MockMailRelay {
    server: MockServer,
}

impl MockMailRelay {
    pub async fn start() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    /// Full URL of the send endpoint
    pub fn send_url(&self) -> String {
        format!("{}/send", self.server.uri())
    }

    /// JSON bodies of every message the relay received
    pub async fn received_messages(&self) -> Vec<Value> {
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .filter_map(|r| serde_json::from_slice(&r.body).ok())
            .collect()
    }

    /// Accept messages carrying the test API key
    pub async fn mock_accepts(&self) {
        Mock::given(method("POST"))
            .and(path("/send"))
            .and(header(
                "Authorization",
                format!("Bearer {}", TEST_MAIL_API_KEY).as_str(),
            ))
            .respond_with(ResponseTemplate::new(202))
            .mount(&self.server)
            .await;
    }

    /// Reject every message with `status`
    pub async fn mock_rejects(&self, status: u16) {
        Mock::given(method("POST"))
            .and(path("/send"))
            .respond_with(ResponseTemplate::new(status).set_body_string("relay unavailable"))
            .mount(&self.server)
            .await;
    }
}
