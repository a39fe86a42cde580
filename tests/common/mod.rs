//! Common test utilities for identity integration tests
#![allow(dead_code)]

use std::sync::{Arc, RwLock};

use axum_test::TestServer;
use pollid::{routes, AppState, JwtSigner, MailTemplate, MemoryStore, Notifier};
use serde_json::{json, Value};

pub const TEST_JWT_SECRET: &str = "test-secret";

/// Mock notifier that captures issued codes
#[derive(Default, Clone)]
pub struct MockNotifier {
    /// Captured (email, code) pairs
    pub sent: Arc<RwLock<Vec<(String, String)>>>,
}

impl MockNotifier {
    pub fn new() -> Self {
        Self {
            sent: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Get the last code sent to an email
    pub fn get_code(&self, email: &str) -> Option<String> {
        self.sent
            .read()
            .unwrap()
            .iter()
            .rev()
            .find(|(e, _)| e == email)
            .map(|(_, c)| c.clone())
    }
}

impl Notifier for MockNotifier {
    fn send(&self, to: &str, _template: MailTemplate, code: &str) -> Result<(), String> {
        self.sent
            .write()
            .unwrap()
            .push((to.to_string(), code.to_string()));
        Ok(())
    }
}

/// Create a test server with an in-memory store and mock notifier
pub fn create_test_server() -> (TestServer, MockNotifier) {
    let notifier = MockNotifier::new();

    let state = Arc::new(AppState::new(
        Arc::new(MemoryStore::new()),
        notifier.clone(),
        JwtSigner::new(TEST_JWT_SECRET),
        false,
    ));

    let app = routes::create_router(state);
    let server = TestServer::new(app).expect("Failed to create test server");

    (server, notifier)
}

/// Helper to register a user and complete email verification
pub async fn create_verified_user(
    server: &TestServer,
    notifier: &MockNotifier,
    email: &str,
    password: &str,
) {
    let response = server
        .post("/auth/register")
        .json(&json!({
            "email": email,
            "password": password,
        }))
        .await;
    assert_eq!(response.status_code(), 200);

    let code = notifier.get_code(email).expect("No verification code sent");

    let response = server
        .post("/auth/verify-email")
        .json(&json!({
            "email": email,
            "code": code,
        }))
        .await;
    assert_eq!(response.status_code(), 200);
}

/// Helper to log in, optionally presenting an existing session cookie.
/// Returns (access token, session cookie value).
pub async fn login(
    server: &TestServer,
    email: &str,
    password: &str,
    session: Option<&str>,
) -> (String, String) {
    let mut request = server.post("/auth/login").json(&json!({
        "email": email,
        "password": password,
    }));
    if let Some(token) = session {
        request = request.add_cookie(cookie::Cookie::new("refresh_token", token.to_string()));
    }

    let response = request.await;
    assert_eq!(response.status_code(), 200);

    let body: Value = response.json();
    let access_token = body["token"].as_str().expect("No access token").to_string();
    let session_cookie = response
        .maybe_cookie("refresh_token")
        .expect("No session cookie")
        .value()
        .to_string();

    (access_token, session_cookie)
}
