//! Data models for credential storage

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Which namespace a one-time code belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CodeKind {
    /// Email verification after registration
    Verification,
    /// Password recovery
    Reset,
}

impl CodeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CodeKind::Verification => "verification",
            CodeKind::Reset => "reset",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "verification" => Some(CodeKind::Verification),
            "reset" => Some(CodeKind::Reset),
            _ => None,
        }
    }
}

/// Unique user identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub u64);

/// A user account
#[derive(Debug, Clone)]
pub struct User {
    pub id: UserId,
    /// Stored exactly as given at registration (case-sensitive)
    pub email: String,
    pub password_hash: String,
    pub email_verified: bool,
    pub created_at: DateTime<Utc>,
}

/// A long-lived refresh session
///
/// The token is opaque and never reassigned to another user; only its
/// expiration moves (sliding window on rotate/refresh).
#[derive(Debug, Clone)]
pub struct Session {
    pub token: String,
    pub user_id: UserId,
    pub expires_at: DateTime<Utc>,
}

/// A single-use numeric code (verification or reset)
///
/// At most one live code per (kind, user) exists at any instant.
#[derive(Debug, Clone)]
pub struct OneTimeCode {
    pub kind: CodeKind,
    pub user_id: UserId,
    pub code: String,
    pub expires_at: DateTime<Utc>,
}
