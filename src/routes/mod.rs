//! HTTP routes for the identity service

mod auth;
mod reset;
mod session;

pub use session::SESSION_COOKIE;

use std::sync::Arc;

use axum::routing::post;
use axum::Router;
use tower_cookies::CookieManagerLayer;

use crate::email::Notifier;
use crate::state::AppState;
use crate::store::CredentialStore;
use crate::token::AccessTokenSigner;

/// Create the router with all routes
pub fn create_router<S, N, G>(state: Arc<AppState<S, N, G>>) -> Router
where
    S: CredentialStore + 'static,
    N: Notifier + 'static,
    G: AccessTokenSigner + 'static,
{
    Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/verify-email", post(auth::verify_email))
        .route(
            "/auth/resend-verification-email",
            post(auth::resend_verification),
        )
        .route("/auth/login", post(auth::login))
        .route("/auth/refresh", post(session::refresh))
        .route("/auth/logout", post(auth::logout))
        .route("/auth/forgot-password", post(reset::forgot_password))
        .route("/auth/reset-password", post(reset::reset_password))
        .layer(CookieManagerLayer::new())
        .with_state(state)
}
