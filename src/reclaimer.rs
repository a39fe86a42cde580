//! Background reclamation of expired state
//!
//! Both sweeps are hygiene: `consume_code` and `find_live_session`
//! already reject expired rows at read time, so a late sweep only
//! affects storage growth.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;

use crate::error::ApiError;
use crate::store::{CodeKind, CredentialStore};

/// Cadence of the code / abandoned-account sweep
pub const CODE_SWEEP_INTERVAL: Duration = Duration::from_secs(15 * 60);
/// Cadence of the expired-session sweep
pub const SESSION_SWEEP_INTERVAL: Duration = Duration::from_secs(24 * 60 * 60);

/// Periodically deletes expired sessions and codes and purges
/// registrations that were never verified
pub struct Reclaimer<S> {
    store: Arc<S>,
}

impl<S: CredentialStore + 'static> Reclaimer<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Start both sweep loops. Sweep failures are logged and retried
    /// at the next tick; they never take the process down.
    pub fn spawn(self) {
        let codes = Reclaimer {
            store: self.store.clone(),
        };
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(CODE_SWEEP_INTERVAL);
            loop {
                interval.tick().await;
                if let Err(err) = codes.sweep_codes() {
                    tracing::error!(error = %err, "Code sweep failed");
                }
            }
        });

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(SESSION_SWEEP_INTERVAL);
            loop {
                interval.tick().await;
                match self.sweep_sessions() {
                    Ok(deleted) if deleted > 0 => {
                        tracing::info!(deleted, "Deleted expired sessions");
                    }
                    Ok(_) => {}
                    Err(err) => tracing::error!(error = %err, "Session sweep failed"),
                }
            }
        });
    }

    /// Purge abandoned registrations and expired codes.
    ///
    /// A user is deleted only when their verification code has expired
    /// AND the record is still unverified when re-read here, so a
    /// concurrent verification wins the race and keeps the account.
    pub fn sweep_codes(&self) -> Result<(), ApiError> {
        let now = Utc::now();

        for expired in self.store.list_expired_codes(CodeKind::Verification, now)? {
            match self.store.find_user_by_id(expired.user_id)? {
                Some(user) if !user.email_verified => {
                    self.store.delete_sessions_by_user(user.id)?;
                    self.store.delete_codes_by_user(CodeKind::Reset, user.id)?;
                    self.store.delete_user(user.id)?;
                    tracing::info!(email = %user.email, "Deleted unverified user past grace period");
                }
                _ => {}
            }
        }

        self.store.delete_expired_codes(CodeKind::Verification, now)?;
        self.store.delete_expired_codes(CodeKind::Reset, now)?;

        Ok(())
    }

    /// Bulk-delete sessions whose expiration has passed
    pub fn sweep_sessions(&self) -> Result<u64, ApiError> {
        self.store.delete_expired_sessions(Utc::now())
    }
}
