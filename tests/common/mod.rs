//! Common test utilities for Agora
//!
//! Builds an in-process server around a fresh [`MemoryStore`] and a
//! recording mailer, plus helpers for walking accounts through
//! registration.

#![allow(dead_code)]

use std::sync::Arc;

use agora::{
    mail::{Attachment, MailError, Mailer},
    models::NewUser,
    routes::create_router,
    AppState, Config, MemoryStore,
};
use async_trait::async_trait;
use axum::http::{HeaderValue, StatusCode};
use axum_test::TestServer;
use parking_lot::Mutex;
use serde_json::{json, Value};

pub mod constants {
    pub const TEST_JWT_SECRET: &str = "integration-test-secret";
    pub const TEST_PASSWORD: &str = "correct horse battery staple";
}

/// Message captured by [`RecordingMailer`]
#[derive(Debug, Clone)]
pub struct SentMail {
    pub to: String,
    pub subject: String,
    pub body: String,
    pub attachment: Option<Attachment>,
}

/// Mailer that keeps every message in memory.
///
/// Deliveries to addresses registered with `fail_for` return an error.
#[derive(Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<SentMail>>,
    failing: Mutex<Vec<String>>,
}

impl RecordingMailer {
    pub fn sent(&self) -> Vec<SentMail> {
        self.sent.lock().clone()
    }

    pub fn fail_for(&self, address: &str) {
        self.failing.lock().push(address.to_string());
    }

    /// The 4-digit code from the latest verification mail sent to `email`.
    pub fn verification_code(&self, email: &str) -> u32 {
        let sent = self.sent.lock();
        let mail = sent
            .iter()
            .rev()
            .find(|m| m.to == email && m.subject == "Verification Code")
            .expect("no verification mail sent");
        mail.body
            .rsplit(' ')
            .next()
            .and_then(|code| code.parse().ok())
            .expect("verification mail has no code")
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(
        &self,
        to: &str,
        subject: &str,
        body: &str,
        attachment: Option<&Attachment>,
    ) -> Result<(), MailError> {
        if self.failing.lock().iter().any(|f| f == to) {
            return Err(MailError::Rejected { status: 550 });
        }
        self.sent.lock().push(SentMail {
            to: to.to_string(),
            subject: subject.to_string(),
            body: body.to_string(),
            attachment: attachment.cloned(),
        });
        Ok(())
    }
}

pub fn test_config() -> Config {
    Config::from_lookup(|key| match key {
        "JWT_SECRET" => Some(constants::TEST_JWT_SECRET.to_string()),
        "BCRYPT_COST" => Some("4".to_string()),
        _ => None,
    })
    .expect("test config should load")
}

/// A running in-process server and handles on its collaborators
pub struct TestApp {
    pub server: TestServer,
    pub state: Arc<AppState>,
    pub mailer: Arc<RecordingMailer>,
}

impl TestApp {
    pub fn new() -> Self {
        let mailer = Arc::new(RecordingMailer::default());
        let state = Arc::new(AppState::with_collaborators(
            test_config(),
            Arc::new(MemoryStore::new()),
            mailer.clone(),
        ));
        let server =
            TestServer::new(create_router(state.clone())).expect("Failed to create test server");

        Self {
            server,
            state,
            mailer,
        }
    }

    /// Register, verify and log in; returns `(user_id, token)`.
    pub async fn member(&self, username: &str, email: &str) -> (i64, String) {
        self.server
            .post("/api/register")
            .json(&json!({
                "username": username,
                "email": email,
                "password": constants::TEST_PASSWORD,
            }))
            .await
            .assert_status(StatusCode::CREATED);

        let code = self.mailer.verification_code(email);
        self.server
            .post("/api/verify")
            .json(&json!({ "email": email, "code": code }))
            .await
            .assert_status_ok();

        let login: Value = self
            .server
            .post("/api/login")
            .json(&json!({ "email": email, "password": constants::TEST_PASSWORD }))
            .await
            .json();

        (
            login["user_id"].as_i64().expect("user_id"),
            login["token"].as_str().expect("token").to_string(),
        )
    }

    /// Insert an active admin directly and mint a token for it.
    pub async fn admin(&self) -> (i64, String) {
        let admin = self
            .state
            .store
            .create_user(NewUser {
                username: "root".to_string(),
                email: "root@example.com".to_string(),
                password_hash: self.state.passwords.hash(constants::TEST_PASSWORD).unwrap(),
                is_admin: true,
                is_active: true,
            })
            .await
            .unwrap();
        let token = self.state.tokens.issue(admin.id, true).unwrap();
        (admin.id, token)
    }
}

/// `Authorization` header value for `token`
pub fn bearer(token: &str) -> HeaderValue {
    HeaderValue::from_str(&format!("Bearer {}", token)).unwrap()
}

/// Content type and body of a `multipart/form-data` request.
///
/// `files` entries are `(field, filename, content_type, data)`.
pub fn multipart_body(
    fields: &[(&str, &str)],
    files: &[(&str, &str, &str, &[u8])],
) -> (String, Vec<u8>) {
    const BOUNDARY: &str = "agora-test-boundary";
    let mut body = Vec::new();

    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }
    for (name, filename, content_type, data) in files {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"; filename=\"{filename}\"\r\nContent-Type: {content_type}\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

    (format!("multipart/form-data; boundary={BOUNDARY}"), body)
}
