//! Storage abstraction for users, sessions and one-time codes

pub mod memory;
pub mod models;
pub mod sqlite;

pub use memory::MemoryStore;
pub use models::*;
pub use sqlite::SqliteStore;

use chrono::{DateTime, Utc};

use crate::error::ApiError;

/// Result type for store operations
pub type StoreResult<T> = Result<T, ApiError>;

/// Persistence contract for the identity subsystem
///
/// Four logical collections: users, sessions, verification codes and
/// reset codes (the last two share one shape, keyed by `CodeKind`).
/// All coordination between concurrent requests happens through this
/// trait's atomic primitives; there is no other shared mutable state.
pub trait CredentialStore: Send + Sync {
    /// Create a user with the given email and password hash.
    /// Fails with `Conflict` if the email is already registered.
    fn create_user(&self, email: &str, password_hash: &str) -> StoreResult<User>;

    /// Look up a user by exact email match
    fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;

    /// Look up a user by id
    fn find_user_by_id(&self, user_id: UserId) -> StoreResult<Option<User>>;

    /// Replace the stored record for an existing user
    fn update_user(&self, user: &User) -> StoreResult<()>;

    /// Delete a user record (used by the reclaimer)
    fn delete_user(&self, user_id: UserId) -> StoreResult<()>;

    /// Persist a new session token for a user
    fn create_session(
        &self,
        user_id: UserId,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> StoreResult<()>;

    /// Resolve a session token, treating expired rows as absent.
    /// An expired row found here is deleted eagerly.
    fn find_live_session(&self, token: &str) -> StoreResult<Option<Session>>;

    /// Push a session's expiration forward (sliding window)
    fn extend_session(&self, token: &str, expires_at: DateTime<Utc>) -> StoreResult<()>;

    /// Delete a session; deleting an absent token is not an error
    fn delete_session(&self, token: &str) -> StoreResult<()>;

    /// Delete all sessions belonging to a user
    fn delete_sessions_by_user(&self, user_id: UserId) -> StoreResult<()>;

    /// Delete a user's sessions that expired before the given instant
    fn delete_expired_sessions_by_user(
        &self,
        user_id: UserId,
        before: DateTime<Utc>,
    ) -> StoreResult<u64>;

    /// Bulk-delete all sessions that expired before the given instant
    fn delete_expired_sessions(&self, before: DateTime<Utc>) -> StoreResult<u64>;

    /// Store a code for (kind, user), replacing any existing one
    fn put_code(
        &self,
        kind: CodeKind,
        user_id: UserId,
        code: &str,
        expires_at: DateTime<Utc>,
    ) -> StoreResult<()>;

    /// Atomically find-and-delete a matching unexpired code.
    ///
    /// Implemented as a single conditional delete so that of any number
    /// of concurrent callers presenting the same code, exactly one
    /// observes `true`.
    fn consume_code(
        &self,
        kind: CodeKind,
        user_id: UserId,
        code: &str,
        now: DateTime<Utc>,
    ) -> StoreResult<bool>;

    /// List codes of a kind that expired before the given instant
    fn list_expired_codes(
        &self,
        kind: CodeKind,
        before: DateTime<Utc>,
    ) -> StoreResult<Vec<OneTimeCode>>;

    /// Delete any code of a kind belonging to a user
    fn delete_codes_by_user(&self, kind: CodeKind, user_id: UserId) -> StoreResult<()>;

    /// Bulk-delete codes of a kind that expired before the given instant
    fn delete_expired_codes(&self, kind: CodeKind, before: DateTime<Utc>) -> StoreResult<u64>;
}
