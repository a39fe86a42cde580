//! In-memory store implementation (development and tests)

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;

use chrono::{DateTime, Utc};

use super::{CodeKind, CredentialStore, OneTimeCode, Session, StoreResult, User, UserId};
use crate::error::ApiError;

/// In-memory credential store
///
/// Codes are keyed by (kind, user), so the at-most-one-live-code
/// invariant holds structurally. `consume_code` runs entirely under
/// the write lock, which gives the exactly-one-winner guarantee.
pub struct MemoryStore {
    users: RwLock<HashMap<UserId, User>>,
    sessions: RwLock<HashMap<String, Session>>,
    codes: RwLock<HashMap<(CodeKind, UserId), OneTimeCode>>,
    next_user_id: AtomicU64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            users: RwLock::new(HashMap::new()),
            sessions: RwLock::new(HashMap::new()),
            codes: RwLock::new(HashMap::new()),
            next_user_id: AtomicU64::new(1),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CredentialStore for MemoryStore {
    fn create_user(&self, email: &str, password_hash: &str) -> StoreResult<User> {
        let mut users = self.users.write().unwrap();
        if users.values().any(|u| u.email == email) {
            return Err(ApiError::EmailTaken);
        }
        let user = User {
            id: UserId(self.next_user_id.fetch_add(1, Ordering::SeqCst)),
            email: email.to_string(),
            password_hash: password_hash.to_string(),
            email_verified: false,
            created_at: Utc::now(),
        };
        users.insert(user.id, user.clone());
        Ok(user)
    }

    fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let users = self.users.read().unwrap();
        Ok(users.values().find(|u| u.email == email).cloned())
    }

    fn find_user_by_id(&self, user_id: UserId) -> StoreResult<Option<User>> {
        Ok(self.users.read().unwrap().get(&user_id).cloned())
    }

    fn update_user(&self, user: &User) -> StoreResult<()> {
        let mut users = self.users.write().unwrap();
        if !users.contains_key(&user.id) {
            return Err(ApiError::UserNotFound);
        }
        users.insert(user.id, user.clone());
        Ok(())
    }

    fn delete_user(&self, user_id: UserId) -> StoreResult<()> {
        self.users.write().unwrap().remove(&user_id);
        Ok(())
    }

    fn create_session(
        &self,
        user_id: UserId,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> StoreResult<()> {
        let session = Session {
            token: token.to_string(),
            user_id,
            expires_at,
        };
        self.sessions
            .write()
            .unwrap()
            .insert(session.token.clone(), session);
        Ok(())
    }

    fn find_live_session(&self, token: &str) -> StoreResult<Option<Session>> {
        let mut sessions = self.sessions.write().unwrap();
        match sessions.get(token) {
            Some(session) if session.expires_at >= Utc::now() => Ok(Some(session.clone())),
            Some(_) => {
                // Expired on use: drop the row now rather than waiting
                // for the next reclaimer sweep
                sessions.remove(token);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    fn extend_session(&self, token: &str, expires_at: DateTime<Utc>) -> StoreResult<()> {
        let mut sessions = self.sessions.write().unwrap();
        if let Some(session) = sessions.get_mut(token) {
            session.expires_at = expires_at;
            Ok(())
        } else {
            Err(ApiError::InvalidSession)
        }
    }

    fn delete_session(&self, token: &str) -> StoreResult<()> {
        self.sessions.write().unwrap().remove(token);
        Ok(())
    }

    fn delete_sessions_by_user(&self, user_id: UserId) -> StoreResult<()> {
        self.sessions
            .write()
            .unwrap()
            .retain(|_, s| s.user_id != user_id);
        Ok(())
    }

    fn delete_expired_sessions_by_user(
        &self,
        user_id: UserId,
        before: DateTime<Utc>,
    ) -> StoreResult<u64> {
        let mut sessions = self.sessions.write().unwrap();
        let len = sessions.len();
        sessions.retain(|_, s| s.user_id != user_id || s.expires_at >= before);
        Ok((len - sessions.len()) as u64)
    }

    fn delete_expired_sessions(&self, before: DateTime<Utc>) -> StoreResult<u64> {
        let mut sessions = self.sessions.write().unwrap();
        let len = sessions.len();
        sessions.retain(|_, s| s.expires_at >= before);
        Ok((len - sessions.len()) as u64)
    }

    fn put_code(
        &self,
        kind: CodeKind,
        user_id: UserId,
        code: &str,
        expires_at: DateTime<Utc>,
    ) -> StoreResult<()> {
        // Insert replaces any prior code for this (kind, user)
        self.codes.write().unwrap().insert(
            (kind, user_id),
            OneTimeCode {
                kind,
                user_id,
                code: code.to_string(),
                expires_at,
            },
        );
        Ok(())
    }

    fn consume_code(
        &self,
        kind: CodeKind,
        user_id: UserId,
        code: &str,
        now: DateTime<Utc>,
    ) -> StoreResult<bool> {
        let mut codes = self.codes.write().unwrap();
        let matches = codes
            .get(&(kind, user_id))
            .map(|c| c.code == code && c.expires_at >= now)
            .unwrap_or(false);
        if matches {
            codes.remove(&(kind, user_id));
        }
        Ok(matches)
    }

    fn list_expired_codes(
        &self,
        kind: CodeKind,
        before: DateTime<Utc>,
    ) -> StoreResult<Vec<OneTimeCode>> {
        let codes = self.codes.read().unwrap();
        Ok(codes
            .values()
            .filter(|c| c.kind == kind && c.expires_at < before)
            .cloned()
            .collect())
    }

    fn delete_codes_by_user(&self, kind: CodeKind, user_id: UserId) -> StoreResult<()> {
        self.codes.write().unwrap().remove(&(kind, user_id));
        Ok(())
    }

    fn delete_expired_codes(&self, kind: CodeKind, before: DateTime<Utc>) -> StoreResult<u64> {
        let mut codes = self.codes.write().unwrap();
        let len = codes.len();
        codes.retain(|_, c| c.kind != kind || c.expires_at >= before);
        Ok((len - codes.len()) as u64)
    }
}
