//! Refresh session lifecycle

use std::sync::Arc;

use chrono::{Duration, Utc};

use crate::crypto::generate_session_token;
use crate::error::ApiError;
use crate::store::{CredentialStore, UserId};

/// Sliding-window session lifetime
pub const SESSION_TTL_DAYS: i64 = 3;

/// Manages long-lived refresh sessions.
///
/// Two entry points deal with existing tokens: `rotate` (login from a
/// client that may already hold a session) reuses the presented token
/// when it is still live, so repeated logins from one browser keep a
/// single session row. `refresh` (silent renewal) slides the same
/// token's expiration without ever replacing it. Independent devices
/// get independent rows via `create`.
pub struct SessionManager<S> {
    store: Arc<S>,
}

impl<S: CredentialStore> SessionManager<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Mint a fresh session token for the user
    pub fn create(&self, user_id: UserId) -> Result<String, ApiError> {
        let now = Utc::now();

        // Hygiene, not correctness: expired rows are rejected at read
        // time regardless
        if let Err(err) = self.store.delete_expired_sessions_by_user(user_id, now) {
            tracing::debug!(error = %err, "Expired session cleanup failed");
        }

        let token = generate_session_token();
        self.store
            .create_session(user_id, &token, now + Duration::days(SESSION_TTL_DAYS))?;
        Ok(token)
    }

    /// Reuse the presented token if it resolves to a live session of
    /// this user (extending it in place), otherwise mint a fresh one.
    pub fn rotate(&self, presented: Option<&str>, user_id: UserId) -> Result<String, ApiError> {
        if let Some(token) = presented {
            if let Some(session) = self.store.find_live_session(token)? {
                if session.user_id == user_id {
                    self.store
                        .extend_session(token, Utc::now() + Duration::days(SESSION_TTL_DAYS))?;
                    return Ok(session.token);
                }
            }
        }
        self.create(user_id)
    }

    /// Resolve a token, slide its expiration and return the owner.
    /// The token value is unchanged, so repeated silent refreshes from
    /// a long-lived client keep working.
    pub fn refresh(&self, token: &str) -> Result<(UserId, String), ApiError> {
        let session = self
            .store
            .find_live_session(token)?
            .ok_or(ApiError::InvalidSession)?;

        self.store
            .extend_session(token, Utc::now() + Duration::days(SESSION_TTL_DAYS))?;

        Ok((session.user_id, session.token))
    }

    /// Delete a session; revoking an absent token is not an error
    pub fn revoke(&self, token: &str) -> Result<(), ApiError> {
        self.store.delete_session(token)
    }

    /// Force re-authentication everywhere (used after password reset)
    pub fn revoke_all_for_user(&self, user_id: UserId) -> Result<(), ApiError> {
        self.store.delete_sessions_by_user(user_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn setup() -> (Arc<MemoryStore>, SessionManager<MemoryStore>, UserId) {
        let store = Arc::new(MemoryStore::new());
        let user_id = store.create_user("test@example.com", "hashed").unwrap().id;
        let manager = SessionManager::new(store.clone());
        (store, manager, user_id)
    }

    #[test]
    fn test_create_persists_live_session() {
        let (store, manager, user_id) = setup();

        let token = manager.create(user_id).unwrap();
        let session = store.find_live_session(&token).unwrap().unwrap();
        assert_eq!(session.user_id, user_id);
    }

    #[test]
    fn test_rotate_reuses_live_token() {
        let (_, manager, user_id) = setup();

        let token = manager.create(user_id).unwrap();
        let rotated = manager.rotate(Some(&token), user_id).unwrap();
        assert_eq!(rotated, token);
    }

    #[test]
    fn test_rotate_without_token_mints_fresh() {
        let (_, manager, user_id) = setup();

        let first = manager.rotate(None, user_id).unwrap();
        let second = manager.rotate(None, user_id).unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn test_rotate_rejects_foreign_token() {
        let (store, manager, user_id) = setup();
        let other = store.create_user("other@example.com", "hashed").unwrap().id;

        let token = manager.create(other).unwrap();
        let rotated = manager.rotate(Some(&token), user_id).unwrap();
        assert_ne!(rotated, token);

        // The foreign session is untouched
        let session = store.find_live_session(&token).unwrap().unwrap();
        assert_eq!(session.user_id, other);
    }

    #[test]
    fn test_refresh_slides_expiry_and_keeps_token() {
        let (store, manager, user_id) = setup();

        // Seed a session with a shorter remaining lifetime
        let short = Utc::now() + Duration::days(1);
        store.create_session(user_id, "tok", short).unwrap();

        let (owner, token) = manager.refresh("tok").unwrap();
        assert_eq!(owner, user_id);
        assert_eq!(token, "tok");

        let session = store.find_live_session("tok").unwrap().unwrap();
        assert!(session.expires_at > short);
    }

    #[test]
    fn test_refresh_rejects_expired_token() {
        let (store, manager, user_id) = setup();

        store
            .create_session(user_id, "tok", Utc::now() - Duration::minutes(1))
            .unwrap();

        assert!(matches!(
            manager.refresh("tok"),
            Err(ApiError::InvalidSession)
        ));
    }

    #[test]
    fn test_revoke_is_idempotent() {
        let (_, manager, user_id) = setup();

        let token = manager.create(user_id).unwrap();
        manager.revoke(&token).unwrap();
        manager.revoke(&token).unwrap();

        assert!(matches!(
            manager.refresh(&token),
            Err(ApiError::InvalidSession)
        ));
    }

    #[test]
    fn test_revoke_all_for_user() {
        let (_, manager, user_id) = setup();

        let t1 = manager.create(user_id).unwrap();
        let t2 = manager.create(user_id).unwrap();
        manager.revoke_all_for_user(user_id).unwrap();

        assert!(manager.refresh(&t1).is_err());
        assert!(manager.refresh(&t2).is_err());
    }
}
