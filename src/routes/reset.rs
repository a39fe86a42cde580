//! Password recovery endpoints

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::Deserialize;

use super::auth::MessageResponse;
use crate::email::Notifier;
use crate::error::ApiError;
use crate::state::AppState;
use crate::store::CredentialStore;
use crate::token::AccessTokenSigner;

#[derive(Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

/// POST /auth/forgot-password
pub async fn forgot_password<S, N, G>(
    State(state): State<Arc<AppState<S, N, G>>>,
    Json(req): Json<ForgotPasswordRequest>,
) -> Result<Json<MessageResponse>, ApiError>
where
    S: CredentialStore,
    N: Notifier,
    G: AccessTokenSigner,
{
    let message = state.identity.forgot_password(&req.email)?;
    Ok(Json(MessageResponse { message }))
}

#[derive(Deserialize)]
pub struct ResetPasswordRequest {
    pub email: String,
    pub code: String,
    #[serde(rename = "newPassword")]
    pub new_password: String,
}

/// POST /auth/reset-password
pub async fn reset_password<S, N, G>(
    State(state): State<Arc<AppState<S, N, G>>>,
    Json(req): Json<ResetPasswordRequest>,
) -> Result<Json<MessageResponse>, ApiError>
where
    S: CredentialStore,
    N: Notifier,
    G: AccessTokenSigner,
{
    let message = state
        .identity
        .reset_password(&req.email, &req.code, &req.new_password)?;
    Ok(Json(MessageResponse { message }))
}
