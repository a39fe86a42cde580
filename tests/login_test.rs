//! Tests for login and access token issuance

mod common;

use common::{create_test_server, create_verified_user, login, TEST_JWT_SECRET};
use pollid::JwtSigner;
use serde_json::{json, Value};

#[tokio::test]
async fn test_login_before_verification_unauthorized() {
    let (server, _) = create_test_server();
    let email = "unverified@example.com";

    server
        .post("/auth/register")
        .json(&json!({ "email": email, "password": "testpassword" }))
        .await;

    let response = server
        .post("/auth/login")
        .json(&json!({ "email": email, "password": "testpassword" }))
        .await;

    assert_eq!(response.status_code(), 401);
    let body: Value = response.json();
    assert_eq!(body["reason"], "Invalid credentials");
}

#[tokio::test]
async fn test_login_after_verification_succeeds() {
    let (server, notifier) = create_test_server();
    let email = "loginok@example.com";

    create_verified_user(&server, &notifier, email, "testpassword").await;

    let (access_token, session_cookie) = login(&server, email, "testpassword", None).await;
    assert!(!session_cookie.is_empty());

    // The access token carries the user's identity
    let claims = JwtSigner::new(TEST_JWT_SECRET).decode(&access_token).unwrap();
    assert_eq!(claims.email, email);
    assert!(claims.exp > claims.iat);
}

#[tokio::test]
async fn test_login_wrong_password_unauthorized() {
    let (server, notifier) = create_test_server();
    let email = "wrongpass@example.com";

    create_verified_user(&server, &notifier, email, "testpassword").await;

    let response = server
        .post("/auth/login")
        .json(&json!({ "email": email, "password": "notthepassword" }))
        .await;

    assert_eq!(response.status_code(), 401);
}

#[tokio::test]
async fn test_login_unknown_email_unauthorized() {
    let (server, _) = create_test_server();

    let response = server
        .post("/auth/login")
        .json(&json!({
            "email": "ghost@example.com",
            "password": "testpassword",
        }))
        .await;

    // Same error as a wrong password: no probing which field was wrong
    assert_eq!(response.status_code(), 401);
    let body: Value = response.json();
    assert_eq!(body["reason"], "Invalid credentials");
}

#[tokio::test]
async fn test_login_with_presented_cookie_reuses_session() {
    let (server, notifier) = create_test_server();
    let email = "onedevice@example.com";

    create_verified_user(&server, &notifier, email, "testpassword").await;

    let (_, first) = login(&server, email, "testpassword", None).await;
    let (_, second) = login(&server, email, "testpassword", Some(&first)).await;

    // Same browser, same session row
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_login_without_cookie_creates_independent_sessions() {
    let (server, notifier) = create_test_server();
    let email = "twodevices@example.com";

    create_verified_user(&server, &notifier, email, "testpassword").await;

    let (_, first) = login(&server, email, "testpassword", None).await;
    let (_, second) = login(&server, email, "testpassword", None).await;

    // Independent devices get independent sessions
    assert_ne!(first, second);
}

#[tokio::test]
async fn test_login_with_stale_cookie_mints_fresh_session() {
    let (server, notifier) = create_test_server();
    let email = "stalecookie@example.com";

    create_verified_user(&server, &notifier, email, "testpassword").await;

    let (_, session) = login(&server, email, "testpassword", Some("not-a-real-token")).await;
    assert_ne!(session, "not-a-real-token");
}
