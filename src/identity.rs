//! Identity orchestration: registration, login, verification, recovery
//!
//! Every operation here is a short sequence of store calls; all
//! cross-request coordination happens through the store's atomic
//! primitives (see `CredentialStore::consume_code`).

use std::sync::Arc;

use crate::codes::CodeIssuer;
use crate::crypto::{hash_password, verify_password};
use crate::email::{MailTemplate, Notifier};
use crate::error::ApiError;
use crate::session::SessionManager;
use crate::store::{CodeKind, CredentialStore};
use crate::token::AccessTokenSigner;

/// Minimum password length
const MIN_PASSWORD_LENGTH: usize = 8;
/// Maximum password length
const MAX_PASSWORD_LENGTH: usize = 80;

/// Credentials returned by login and refresh
pub struct LoginTokens {
    /// Short-lived signed access token (not persisted server-side)
    pub access_token: String,
    /// Long-lived opaque session token (refresh cookie value)
    pub session_token: String,
}

/// The orchestration layer behind the /auth endpoints.
///
/// Per-user verification state is one-way: `Unverified → Verified`,
/// flipped only by a successful code consumption. Login and password
/// recovery are gated on the verified state.
pub struct IdentityService<S, N, G> {
    store: Arc<S>,
    codes: CodeIssuer<S>,
    sessions: SessionManager<S>,
    notifier: N,
    signer: G,
    /// Verified against when the email is unknown, so login timing
    /// does not reveal whether the account exists
    dummy_hash: String,
}

impl<S, N, G> IdentityService<S, N, G>
where
    S: CredentialStore,
    N: Notifier,
    G: AccessTokenSigner,
{
    pub fn new(store: Arc<S>, notifier: N, signer: G) -> Self {
        Self {
            codes: CodeIssuer::new(store.clone()),
            sessions: SessionManager::new(store.clone()),
            store,
            notifier,
            signer,
            dummy_hash: hash_password("login-timing-pad").unwrap_or_default(),
        }
    }

    /// Create an unverified account and send a verification code
    pub fn register(&self, email: &str, password: &str) -> Result<&'static str, ApiError> {
        check_password_length(password)?;

        let password_hash =
            hash_password(password).map_err(|e| ApiError::Internal(e.to_string()))?;
        let user = self.store.create_user(email, &password_hash)?;

        let code = self.codes.issue(user.id, CodeKind::Verification)?;
        self.notify(&user.email, MailTemplate::Verification, &code);

        Ok("Registration successful. Please check your email to verify your account.")
    }

    /// Flip the account to verified by consuming the emailed code
    pub fn verify_email(&self, email: &str, code: &str) -> Result<&'static str, ApiError> {
        let mut user = self
            .store
            .find_user_by_email(email)?
            .ok_or(ApiError::UserNotFound)?;

        if user.email_verified {
            return Err(ApiError::AlreadyVerified);
        }

        if !self.codes.verify(user.id, CodeKind::Verification, code)? {
            return Err(ApiError::InvalidVerificationCode);
        }

        user.email_verified = true;
        self.store.update_user(&user)?;

        Ok("Email verified successfully")
    }

    /// Reissue a verification code, invalidating any prior one
    pub fn resend_verification(&self, email: &str) -> Result<&'static str, ApiError> {
        let user = self
            .store
            .find_user_by_email(email)?
            .ok_or(ApiError::UserNotFound)?;

        if user.email_verified {
            return Err(ApiError::AlreadyVerified);
        }

        let code = self.codes.issue(user.id, CodeKind::Verification)?;
        self.notify(&user.email, MailTemplate::Verification, &code);

        Ok("Verification code has been sent to your email")
    }

    /// Authenticate and mint an access token plus a session token.
    ///
    /// Missing user, wrong password and unverified email all produce
    /// the same error so callers cannot probe which one it was. A
    /// presented session token from a prior login is reused when still
    /// live.
    pub fn login(
        &self,
        email: &str,
        password: &str,
        presented_token: Option<&str>,
    ) -> Result<LoginTokens, ApiError> {
        let user = match self.store.find_user_by_email(email)? {
            Some(user) => user,
            None => {
                // Burn a verification anyway; an unknown email must
                // cost the same as a wrong password
                let _ = verify_password(password, &self.dummy_hash);
                return Err(ApiError::InvalidCredentials);
            }
        };

        let valid = verify_password(password, &user.password_hash)
            .map_err(|e| ApiError::Internal(e.to_string()))?;
        if !valid {
            return Err(ApiError::InvalidCredentials);
        }

        if !user.email_verified {
            return Err(ApiError::InvalidCredentials);
        }

        let access_token = self.signer.sign(user.id, &user.email)?;
        let session_token = self.sessions.rotate(presented_token, user.id)?;

        Ok(LoginTokens {
            access_token,
            session_token,
        })
    }

    /// Exchange a live session token for a fresh access token,
    /// sliding the session's expiration
    pub fn refresh_token(&self, session_token: &str) -> Result<LoginTokens, ApiError> {
        let (user_id, session_token) = self.sessions.refresh(session_token)?;

        let user = self
            .store
            .find_user_by_id(user_id)?
            .ok_or(ApiError::InvalidSession)?;

        let access_token = self.signer.sign(user.id, &user.email)?;

        Ok(LoginTokens {
            access_token,
            session_token,
        })
    }

    /// Best-effort session revocation; always succeeds for the caller
    pub fn logout(&self, session_token: &str) {
        if let Err(err) = self.sessions.revoke(session_token) {
            tracing::warn!(error = %err, "Session revocation failed during logout");
        }
    }

    /// Issue and send a password reset code (verified accounts only)
    pub fn forgot_password(&self, email: &str) -> Result<&'static str, ApiError> {
        let user = self
            .store
            .find_user_by_email(email)?
            .ok_or(ApiError::UserNotFound)?;

        if !user.email_verified {
            return Err(ApiError::EmailNotVerified);
        }

        let code = self.codes.issue(user.id, CodeKind::Reset)?;
        self.notify(&user.email, MailTemplate::PasswordReset, &code);

        Ok("Password reset code has been sent to your email")
    }

    /// Replace the password by consuming a reset code and revoke every
    /// session the user holds
    pub fn reset_password(
        &self,
        email: &str,
        code: &str,
        new_password: &str,
    ) -> Result<&'static str, ApiError> {
        check_password_length(new_password)?;

        let mut user = self
            .store
            .find_user_by_email(email)?
            .ok_or(ApiError::UserNotFound)?;

        if !self.codes.verify(user.id, CodeKind::Reset, code)? {
            return Err(ApiError::InvalidResetCode);
        }

        user.password_hash =
            hash_password(new_password).map_err(|e| ApiError::Internal(e.to_string()))?;
        self.store.update_user(&user)?;

        // A password reset invalidates all prior sessions
        self.sessions.revoke_all_for_user(user.id)?;

        Ok("Password has been reset successfully")
    }

    /// Failure here does not roll back code issuance; the user can
    /// request a resend
    fn notify(&self, email: &str, template: MailTemplate, code: &str) {
        if let Err(err) = self.notifier.send(email, template, code) {
            tracing::warn!(email = %email, error = %err, "Failed to send notification email");
        }
    }
}

fn check_password_length(password: &str) -> Result<(), ApiError> {
    if password.len() < MIN_PASSWORD_LENGTH {
        return Err(ApiError::PasswordTooShort);
    }
    if password.len() > MAX_PASSWORD_LENGTH {
        return Err(ApiError::PasswordTooLong);
    }
    Ok(())
}
