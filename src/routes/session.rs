//! Token refresh endpoint and refresh cookie helpers

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::Serialize;
use tower_cookies::cookie::time::Duration;
use tower_cookies::cookie::SameSite;
use tower_cookies::{Cookie, Cookies};

use crate::email::Notifier;
use crate::error::ApiError;
use crate::session::SESSION_TTL_DAYS;
use crate::state::AppState;
use crate::store::CredentialStore;
use crate::token::AccessTokenSigner;

/// Cookie carrying the long-lived session token
pub const SESSION_COOKIE: &str = "refresh_token";

#[derive(Serialize)]
pub struct TokenResponse {
    pub token: String,
}

/// POST /auth/refresh
pub async fn refresh<S, N, G>(
    State(state): State<Arc<AppState<S, N, G>>>,
    cookies: Cookies,
) -> Result<Json<TokenResponse>, ApiError>
where
    S: CredentialStore,
    N: Notifier,
    G: AccessTokenSigner,
{
    let token = get_session_cookie(&cookies).ok_or(ApiError::InvalidSession)?;

    let tokens = state.identity.refresh_token(&token)?;
    set_session_cookie(&cookies, &tokens.session_token, state.production);

    Ok(Json(TokenResponse {
        token: tokens.access_token,
    }))
}

/// Helper to read the session token off the request cookies
pub fn get_session_cookie(cookies: &Cookies) -> Option<String> {
    cookies.get(SESSION_COOKIE).map(|c| c.value().to_string())
}

/// Helper to set the session cookie with the attributes the clients
/// expect: HttpOnly, SameSite=Strict, Secure in production, expiring
/// with the session's sliding window
pub fn set_session_cookie(cookies: &Cookies, token: &str, production: bool) {
    let cookie = Cookie::build((SESSION_COOKIE, token.to_string()))
        .path("/")
        .http_only(true)
        .secure(production)
        .same_site(SameSite::Strict)
        .max_age(Duration::days(SESSION_TTL_DAYS))
        .build();
    cookies.add(cookie);
}

/// Helper to clear the session cookie
pub fn clear_session_cookie(cookies: &Cookies) {
    let cookie = Cookie::build((SESSION_COOKIE, ""))
        .path("/")
        .http_only(true)
        .max_age(Duration::ZERO)
        .build();
    cookies.add(cookie);
}
