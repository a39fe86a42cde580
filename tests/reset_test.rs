//! Tests for the password recovery flow

mod common;

use common::{create_test_server, create_verified_user, login};
use serde_json::{json, Value};

#[tokio::test]
async fn test_forgot_password_unknown_user_not_found() {
    let (server, _) = create_test_server();

    let response = server
        .post("/auth/forgot-password")
        .json(&json!({ "email": "nobody@example.com" }))
        .await;

    assert_eq!(response.status_code(), 404);
}

#[tokio::test]
async fn test_forgot_password_unverified_user_rejected() {
    let (server, _) = create_test_server();
    let email = "unverified@example.com";

    server
        .post("/auth/register")
        .json(&json!({ "email": email, "password": "testpassword" }))
        .await;

    let response = server
        .post("/auth/forgot-password")
        .json(&json!({ "email": email }))
        .await;

    assert_eq!(response.status_code(), 400);
    let body: Value = response.json();
    assert_eq!(
        body["reason"],
        "Email not verified. Please verify your email first."
    );
}

#[tokio::test]
async fn test_forgot_password_sends_reset_code() {
    let (server, notifier) = create_test_server();
    let email = "forgot@example.com";

    create_verified_user(&server, &notifier, email, "testpassword").await;

    let response = server
        .post("/auth/forgot-password")
        .json(&json!({ "email": email }))
        .await;

    assert_eq!(response.status_code(), 200);
    let code = notifier.get_code(email).unwrap();
    assert_eq!(code.len(), 6);
}

#[tokio::test]
async fn test_reset_password_swaps_credentials() {
    let (server, notifier) = create_test_server();
    let email = "swap@example.com";
    let old_password = "oldpassword";
    let new_password = "newpassword";

    create_verified_user(&server, &notifier, email, old_password).await;

    server
        .post("/auth/forgot-password")
        .json(&json!({ "email": email }))
        .await;
    let code = notifier.get_code(email).unwrap();

    let response = server
        .post("/auth/reset-password")
        .json(&json!({
            "email": email,
            "code": code,
            "newPassword": new_password,
        }))
        .await;
    assert_eq!(response.status_code(), 200);

    // Old password no longer authenticates
    let response = server
        .post("/auth/login")
        .json(&json!({ "email": email, "password": old_password }))
        .await;
    assert_eq!(response.status_code(), 401);

    // New password does
    login(&server, email, new_password, None).await;
}

#[tokio::test]
async fn test_reset_password_revokes_all_sessions() {
    let (server, notifier) = create_test_server();
    let email = "revoked@example.com";

    create_verified_user(&server, &notifier, email, "oldpassword").await;
    let (_, session) = login(&server, email, "oldpassword", None).await;

    server
        .post("/auth/forgot-password")
        .json(&json!({ "email": email }))
        .await;
    let code = notifier.get_code(email).unwrap();

    server
        .post("/auth/reset-password")
        .json(&json!({
            "email": email,
            "code": code,
            "newPassword": "newpassword",
        }))
        .await;

    // The pre-reset session is gone everywhere
    let response = server
        .post("/auth/refresh")
        .add_cookie(cookie::Cookie::new("refresh_token", session))
        .await;
    assert_eq!(response.status_code(), 401);
}

#[tokio::test]
async fn test_reset_password_wrong_code_rejected() {
    let (server, notifier) = create_test_server();
    let email = "wrongreset@example.com";

    create_verified_user(&server, &notifier, email, "testpassword").await;

    server
        .post("/auth/forgot-password")
        .json(&json!({ "email": email }))
        .await;
    let issued = notifier.get_code(email).unwrap();
    let wrong = if issued == "111111" { "222222" } else { "111111" };

    let response = server
        .post("/auth/reset-password")
        .json(&json!({
            "email": email,
            "code": wrong,
            "newPassword": "newpassword",
        }))
        .await;

    assert_eq!(response.status_code(), 400);
    let body: Value = response.json();
    assert_eq!(body["reason"], "Invalid or expired reset code");
}

#[tokio::test]
async fn test_reset_code_is_single_use() {
    let (server, notifier) = create_test_server();
    let email = "singleuse@example.com";

    create_verified_user(&server, &notifier, email, "testpassword").await;

    server
        .post("/auth/forgot-password")
        .json(&json!({ "email": email }))
        .await;
    let code = notifier.get_code(email).unwrap();

    let response = server
        .post("/auth/reset-password")
        .json(&json!({
            "email": email,
            "code": code,
            "newPassword": "newpassword1",
        }))
        .await;
    assert_eq!(response.status_code(), 200);

    let response = server
        .post("/auth/reset-password")
        .json(&json!({
            "email": email,
            "code": code,
            "newPassword": "newpassword2",
        }))
        .await;
    assert_eq!(response.status_code(), 400);
}

#[tokio::test]
async fn test_reset_password_rejects_short_password() {
    let (server, notifier) = create_test_server();
    let email = "shortreset@example.com";

    create_verified_user(&server, &notifier, email, "testpassword").await;

    server
        .post("/auth/forgot-password")
        .json(&json!({ "email": email }))
        .await;
    let code = notifier.get_code(email).unwrap();

    let response = server
        .post("/auth/reset-password")
        .json(&json!({
            "email": email,
            "code": code,
            "newPassword": "short",
        }))
        .await;

    assert_eq!(response.status_code(), 400);

    // The code was not consumed by the rejected attempt
    let response = server
        .post("/auth/reset-password")
        .json(&json!({
            "email": email,
            "code": code,
            "newPassword": "longenoughpassword",
        }))
        .await;
    assert_eq!(response.status_code(), 200);
}
