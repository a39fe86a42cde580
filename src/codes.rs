//! One-time code issuance and validation

use std::sync::Arc;

use chrono::{Duration, Utc};

use crate::crypto::generate_code;
use crate::error::ApiError;
use crate::store::{CodeKind, CredentialStore, UserId};

/// Lifetime of verification and reset codes
pub const CODE_TTL_MINUTES: i64 = 15;

/// Issues and validates single-use numeric codes
pub struct CodeIssuer<S> {
    store: Arc<S>,
}

impl<S: CredentialStore> CodeIssuer<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Generate a fresh code for the user, superseding any prior code
    /// of the same kind. The caller is responsible for delivering it.
    pub fn issue(&self, user_id: UserId, kind: CodeKind) -> Result<String, ApiError> {
        let code = generate_code();
        let expires_at = Utc::now() + Duration::minutes(CODE_TTL_MINUTES);
        self.store.put_code(kind, user_id, &code, expires_at)?;
        Ok(code)
    }

    /// Consume the code if it matches and is unexpired.
    ///
    /// Returns false for wrong, expired and never-issued codes alike;
    /// the distinction is deliberately not observable.
    pub fn verify(&self, user_id: UserId, kind: CodeKind, code: &str) -> Result<bool, ApiError> {
        self.store.consume_code(kind, user_id, code, Utc::now())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn user(store: &MemoryStore) -> UserId {
        store.create_user("test@example.com", "hashed").unwrap().id
    }

    #[test]
    fn test_issue_then_verify() {
        let store = Arc::new(MemoryStore::new());
        let user_id = user(&store);
        let issuer = CodeIssuer::new(store);

        let code = issuer.issue(user_id, CodeKind::Verification).unwrap();
        assert!(issuer
            .verify(user_id, CodeKind::Verification, &code)
            .unwrap());
    }

    #[test]
    fn test_verify_is_single_use() {
        let store = Arc::new(MemoryStore::new());
        let user_id = user(&store);
        let issuer = CodeIssuer::new(store);

        let code = issuer.issue(user_id, CodeKind::Reset).unwrap();
        assert!(issuer.verify(user_id, CodeKind::Reset, &code).unwrap());
        assert!(!issuer.verify(user_id, CodeKind::Reset, &code).unwrap());
    }

    #[test]
    fn test_reissue_invalidates_previous() {
        let store = Arc::new(MemoryStore::new());
        let user_id = user(&store);
        let issuer = CodeIssuer::new(store);

        let first = issuer.issue(user_id, CodeKind::Verification).unwrap();
        let mut second = issuer.issue(user_id, CodeKind::Verification).unwrap();
        while second == first {
            second = issuer.issue(user_id, CodeKind::Verification).unwrap();
        }

        assert!(!issuer
            .verify(user_id, CodeKind::Verification, &first)
            .unwrap());
        assert!(issuer
            .verify(user_id, CodeKind::Verification, &second)
            .unwrap());
    }

    #[test]
    fn test_wrong_code_rejected() {
        let store = Arc::new(MemoryStore::new());
        let user_id = user(&store);
        let issuer = CodeIssuer::new(store);

        issuer.issue(user_id, CodeKind::Verification).unwrap();
        assert!(!issuer
            .verify(user_id, CodeKind::Verification, "000000")
            .unwrap());
    }
}
