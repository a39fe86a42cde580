//! Service error types

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

/// Errors surfaced by the identity service.
///
/// All one-time-code failures collapse to a single "invalid or
/// expired" message so callers cannot distinguish a wrong code from an
/// expired one. Login failures likewise share one message regardless
/// of whether the user is missing, the password is wrong, or the email
/// is unverified.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Email already exists")]
    EmailTaken,

    #[error("User with this email does not exist")]
    UserNotFound,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Invalid refresh token")]
    InvalidSession,

    #[error("Email already verified")]
    AlreadyVerified,

    #[error("Email not verified. Please verify your email first.")]
    EmailNotVerified,

    #[error("Invalid or expired verification code")]
    InvalidVerificationCode,

    #[error("Invalid or expired reset code")]
    InvalidResetCode,

    #[error("Password too short (minimum 8 characters)")]
    PasswordTooShort,

    #[error("Password too long (maximum 80 characters)")]
    PasswordTooLong,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::EmailTaken => (StatusCode::CONFLICT, "Email already exists"),
            ApiError::UserNotFound => {
                (StatusCode::NOT_FOUND, "User with this email does not exist")
            }
            ApiError::InvalidCredentials => (StatusCode::UNAUTHORIZED, "Invalid credentials"),
            ApiError::InvalidSession => (StatusCode::UNAUTHORIZED, "Invalid refresh token"),
            ApiError::AlreadyVerified => (StatusCode::BAD_REQUEST, "Email already verified"),
            ApiError::EmailNotVerified => (
                StatusCode::BAD_REQUEST,
                "Email not verified. Please verify your email first.",
            ),
            ApiError::InvalidVerificationCode => (
                StatusCode::BAD_REQUEST,
                "Invalid or expired verification code",
            ),
            ApiError::InvalidResetCode => {
                (StatusCode::BAD_REQUEST, "Invalid or expired reset code")
            }
            ApiError::PasswordTooShort => (
                StatusCode::BAD_REQUEST,
                "Password too short (minimum 8 characters)",
            ),
            ApiError::PasswordTooLong => (
                StatusCode::BAD_REQUEST,
                "Password too long (maximum 80 characters)",
            ),
            ApiError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
        };

        let body = json!({ "success": false, "reason": message });
        (status, axum::Json(body)).into_response()
    }
}
