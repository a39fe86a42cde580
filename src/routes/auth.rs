//! Registration, verification, login and logout endpoints

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use tower_cookies::Cookies;

use super::session::{
    clear_session_cookie, get_session_cookie, set_session_cookie, TokenResponse,
};
use crate::email::Notifier;
use crate::error::ApiError;
use crate::state::AppState;
use crate::store::CredentialStore;
use crate::token::AccessTokenSigner;

#[derive(Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
}

/// POST /auth/register
pub async fn register<S, N, G>(
    State(state): State<Arc<AppState<S, N, G>>>,
    Json(req): Json<RegisterRequest>,
) -> Result<Json<MessageResponse>, ApiError>
where
    S: CredentialStore,
    N: Notifier,
    G: AccessTokenSigner,
{
    let message = state.identity.register(&req.email, &req.password)?;
    Ok(Json(MessageResponse { message }))
}

#[derive(Deserialize)]
pub struct VerifyEmailRequest {
    pub email: String,
    pub code: String,
}

/// POST /auth/verify-email
pub async fn verify_email<S, N, G>(
    State(state): State<Arc<AppState<S, N, G>>>,
    Json(req): Json<VerifyEmailRequest>,
) -> Result<Json<MessageResponse>, ApiError>
where
    S: CredentialStore,
    N: Notifier,
    G: AccessTokenSigner,
{
    let message = state.identity.verify_email(&req.email, &req.code)?;
    Ok(Json(MessageResponse { message }))
}

#[derive(Deserialize)]
pub struct ResendVerificationRequest {
    pub email: String,
}

/// POST /auth/resend-verification-email
pub async fn resend_verification<S, N, G>(
    State(state): State<Arc<AppState<S, N, G>>>,
    Json(req): Json<ResendVerificationRequest>,
) -> Result<Json<MessageResponse>, ApiError>
where
    S: CredentialStore,
    N: Notifier,
    G: AccessTokenSigner,
{
    let message = state.identity.resend_verification(&req.email)?;
    Ok(Json(MessageResponse { message }))
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// POST /auth/login
///
/// A refresh cookie from a prior login on this client is presented to
/// the service so the same session row is reused instead of piling up
/// one per login.
pub async fn login<S, N, G>(
    State(state): State<Arc<AppState<S, N, G>>>,
    cookies: Cookies,
    Json(req): Json<LoginRequest>,
) -> Result<Json<TokenResponse>, ApiError>
where
    S: CredentialStore,
    N: Notifier,
    G: AccessTokenSigner,
{
    let presented = get_session_cookie(&cookies);

    let tokens = state
        .identity
        .login(&req.email, &req.password, presented.as_deref())?;

    set_session_cookie(&cookies, &tokens.session_token, state.production);

    Ok(Json(TokenResponse {
        token: tokens.access_token,
    }))
}

/// POST /auth/logout
pub async fn logout<S, N, G>(
    State(state): State<Arc<AppState<S, N, G>>>,
    cookies: Cookies,
) -> Json<MessageResponse>
where
    S: CredentialStore,
    N: Notifier,
    G: AccessTokenSigner,
{
    if let Some(token) = get_session_cookie(&cookies) {
        state.identity.logout(&token);
    }

    clear_session_cookie(&cookies);

    Json(MessageResponse {
        message: "Logged out successfully",
    })
}
