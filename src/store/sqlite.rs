//! SQLite-backed store implementation

use std::sync::Mutex;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use super::{CodeKind, CredentialStore, OneTimeCode, Session, StoreResult, User, UserId};
use crate::error::ApiError;

/// Current schema version
const SCHEMA_VERSION: i32 = 1;

/// SQLite credential store
///
/// `consume_code` is a single conditional DELETE, so the
/// exactly-one-winner guarantee comes from SQLite itself.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open or create a database at the given path
    pub fn open(path: &str) -> Result<Self, ApiError> {
        let conn = Connection::open(path).map_err(internal)?;

        conn.execute_batch("PRAGMA foreign_keys = ON;")
            .map_err(internal)?;

        Self::migrate(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn migrate(conn: &Connection) -> Result<(), ApiError> {
        let current_version = Self::get_schema_version(conn)?;

        if current_version < SCHEMA_VERSION {
            tracing::info!(
                current = current_version,
                target = SCHEMA_VERSION,
                "Running database migrations"
            );

            if current_version < 1 {
                Self::migrate_v1(conn)?;
            }

            conn.execute(
                "INSERT OR REPLACE INTO schema_version (version) VALUES (?1)",
                params![SCHEMA_VERSION],
            )
            .map_err(internal)?;

            tracing::info!("Database migrations complete");
        }

        Ok(())
    }

    /// Get current schema version (0 if no schema exists)
    fn get_schema_version(conn: &Connection) -> Result<i32, ApiError> {
        let table_exists: bool = conn
            .query_row(
                "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version')",
                [],
                |row| row.get(0),
            )
            .map_err(internal)?;

        if !table_exists {
            return Ok(0);
        }

        conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| {
            row.get::<_, Option<i32>>(0).map(|v| v.unwrap_or(0))
        })
        .map_err(internal)
    }

    /// Migration to version 1: initial schema
    fn migrate_v1(conn: &Connection) -> Result<(), ApiError> {
        conn.execute_batch(
            r#"
            -- Schema version tracking
            CREATE TABLE IF NOT EXISTS schema_version (
                version INTEGER PRIMARY KEY
            );

            -- Users
            CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                email TEXT NOT NULL UNIQUE,
                password_hash TEXT NOT NULL,
                email_verified INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL
            );

            -- Refresh sessions (multiple per user, one per device)
            CREATE TABLE IF NOT EXISTS sessions (
                token TEXT PRIMARY KEY,
                user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                expires_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_sessions_user_id ON sessions(user_id);

            -- One-time codes; the primary key enforces at most one
            -- live code per (kind, user)
            CREATE TABLE IF NOT EXISTS codes (
                kind TEXT NOT NULL,
                user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                code TEXT NOT NULL,
                expires_at TEXT NOT NULL,
                PRIMARY KEY (kind, user_id)
            );
            "#,
        )
        .map_err(internal)?;

        Ok(())
    }
}

fn internal(e: rusqlite::Error) -> ApiError {
    ApiError::Internal(e.to_string())
}

fn parse_instant(idx: usize, s: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
        })
}

fn row_to_user(row: &rusqlite::Row<'_>) -> rusqlite::Result<User> {
    let id: i64 = row.get(0)?;
    let email: String = row.get(1)?;
    let password_hash: String = row.get(2)?;
    let email_verified: i32 = row.get(3)?;
    let created_at: String = row.get(4)?;
    Ok(User {
        id: UserId(id as u64),
        email,
        password_hash,
        email_verified: email_verified != 0,
        created_at: parse_instant(4, &created_at)?,
    })
}

impl CredentialStore for SqliteStore {
    fn create_user(&self, email: &str, password_hash: &str) -> StoreResult<User> {
        let conn = self.conn.lock().unwrap();
        let now = Utc::now();

        conn.execute(
            "INSERT INTO users (email, password_hash, email_verified, created_at) VALUES (?1, ?2, 0, ?3)",
            params![email, password_hash, now.to_rfc3339()],
        )
        .map_err(|e| {
            if let rusqlite::Error::SqliteFailure(ref err, _) = e {
                if err.code == rusqlite::ErrorCode::ConstraintViolation {
                    return ApiError::EmailTaken;
                }
            }
            internal(e)
        })?;

        Ok(User {
            id: UserId(conn.last_insert_rowid() as u64),
            email: email.to_string(),
            password_hash: password_hash.to_string(),
            email_verified: false,
            created_at: now,
        })
    }

    fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let conn = self.conn.lock().unwrap();

        conn.query_row(
            "SELECT id, email, password_hash, email_verified, created_at FROM users WHERE email = ?1",
            params![email],
            row_to_user,
        )
        .optional()
        .map_err(internal)
    }

    fn find_user_by_id(&self, user_id: UserId) -> StoreResult<Option<User>> {
        let conn = self.conn.lock().unwrap();

        conn.query_row(
            "SELECT id, email, password_hash, email_verified, created_at FROM users WHERE id = ?1",
            params![user_id.0 as i64],
            row_to_user,
        )
        .optional()
        .map_err(internal)
    }

    fn update_user(&self, user: &User) -> StoreResult<()> {
        let conn = self.conn.lock().unwrap();

        let rows_affected = conn
            .execute(
                "UPDATE users SET email = ?1, password_hash = ?2, email_verified = ?3 WHERE id = ?4",
                params![
                    user.email,
                    user.password_hash,
                    user.email_verified as i32,
                    user.id.0 as i64
                ],
            )
            .map_err(internal)?;

        if rows_affected == 0 {
            return Err(ApiError::UserNotFound);
        }

        Ok(())
    }

    fn delete_user(&self, user_id: UserId) -> StoreResult<()> {
        let conn = self.conn.lock().unwrap();

        // ON DELETE CASCADE takes sessions and codes with it
        conn.execute("DELETE FROM users WHERE id = ?1", params![user_id.0 as i64])
            .map_err(internal)?;

        Ok(())
    }

    fn create_session(
        &self,
        user_id: UserId,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> StoreResult<()> {
        let conn = self.conn.lock().unwrap();

        conn.execute(
            "INSERT INTO sessions (token, user_id, expires_at) VALUES (?1, ?2, ?3)",
            params![token, user_id.0 as i64, expires_at.to_rfc3339()],
        )
        .map_err(internal)?;

        Ok(())
    }

    fn find_live_session(&self, token: &str) -> StoreResult<Option<Session>> {
        let conn = self.conn.lock().unwrap();

        let session = conn
            .query_row(
                "SELECT token, user_id, expires_at FROM sessions WHERE token = ?1",
                params![token],
                |row| {
                    let token: String = row.get(0)?;
                    let user_id: i64 = row.get(1)?;
                    let expires_at: String = row.get(2)?;
                    Ok(Session {
                        token,
                        user_id: UserId(user_id as u64),
                        expires_at: parse_instant(2, &expires_at)?,
                    })
                },
            )
            .optional()
            .map_err(internal)?;

        match session {
            Some(s) if s.expires_at >= Utc::now() => Ok(Some(s)),
            Some(s) => {
                // Expired on use: delete eagerly
                conn.execute("DELETE FROM sessions WHERE token = ?1", params![s.token])
                    .map_err(internal)?;
                Ok(None)
            }
            None => Ok(None),
        }
    }

    fn extend_session(&self, token: &str, expires_at: DateTime<Utc>) -> StoreResult<()> {
        let conn = self.conn.lock().unwrap();

        let rows_affected = conn
            .execute(
                "UPDATE sessions SET expires_at = ?1 WHERE token = ?2",
                params![expires_at.to_rfc3339(), token],
            )
            .map_err(internal)?;

        if rows_affected == 0 {
            return Err(ApiError::InvalidSession);
        }

        Ok(())
    }

    fn delete_session(&self, token: &str) -> StoreResult<()> {
        let conn = self.conn.lock().unwrap();

        conn.execute("DELETE FROM sessions WHERE token = ?1", params![token])
            .map_err(internal)?;

        Ok(())
    }

    fn delete_sessions_by_user(&self, user_id: UserId) -> StoreResult<()> {
        let conn = self.conn.lock().unwrap();

        conn.execute(
            "DELETE FROM sessions WHERE user_id = ?1",
            params![user_id.0 as i64],
        )
        .map_err(internal)?;

        Ok(())
    }

    fn delete_expired_sessions_by_user(
        &self,
        user_id: UserId,
        before: DateTime<Utc>,
    ) -> StoreResult<u64> {
        let conn = self.conn.lock().unwrap();

        let rows_deleted = conn
            .execute(
                "DELETE FROM sessions WHERE user_id = ?1 AND expires_at < ?2",
                params![user_id.0 as i64, before.to_rfc3339()],
            )
            .map_err(internal)?;

        Ok(rows_deleted as u64)
    }

    fn delete_expired_sessions(&self, before: DateTime<Utc>) -> StoreResult<u64> {
        let conn = self.conn.lock().unwrap();

        let rows_deleted = conn
            .execute(
                "DELETE FROM sessions WHERE expires_at < ?1",
                params![before.to_rfc3339()],
            )
            .map_err(internal)?;

        Ok(rows_deleted as u64)
    }

    fn put_code(
        &self,
        kind: CodeKind,
        user_id: UserId,
        code: &str,
        expires_at: DateTime<Utc>,
    ) -> StoreResult<()> {
        let conn = self.conn.lock().unwrap();

        conn.execute(
            "INSERT OR REPLACE INTO codes (kind, user_id, code, expires_at) VALUES (?1, ?2, ?3, ?4)",
            params![
                kind.as_str(),
                user_id.0 as i64,
                code,
                expires_at.to_rfc3339()
            ],
        )
        .map_err(internal)?;

        Ok(())
    }

    fn consume_code(
        &self,
        kind: CodeKind,
        user_id: UserId,
        code: &str,
        now: DateTime<Utc>,
    ) -> StoreResult<bool> {
        let conn = self.conn.lock().unwrap();

        // Single conditional delete: exactly one concurrent caller can
        // observe a deleted row
        let rows_deleted = conn
            .execute(
                "DELETE FROM codes WHERE kind = ?1 AND user_id = ?2 AND code = ?3 AND expires_at >= ?4",
                params![kind.as_str(), user_id.0 as i64, code, now.to_rfc3339()],
            )
            .map_err(internal)?;

        Ok(rows_deleted == 1)
    }

    fn list_expired_codes(
        &self,
        kind: CodeKind,
        before: DateTime<Utc>,
    ) -> StoreResult<Vec<OneTimeCode>> {
        let conn = self.conn.lock().unwrap();

        let mut stmt = conn
            .prepare(
                "SELECT kind, user_id, code, expires_at FROM codes WHERE kind = ?1 AND expires_at < ?2",
            )
            .map_err(internal)?;

        let codes = stmt
            .query_map(params![kind.as_str(), before.to_rfc3339()], |row| {
                let kind: String = row.get(0)?;
                let user_id: i64 = row.get(1)?;
                let code: String = row.get(2)?;
                let expires_at: String = row.get(3)?;
                Ok(OneTimeCode {
                    kind: CodeKind::from_str(&kind).unwrap_or(CodeKind::Verification),
                    user_id: UserId(user_id as u64),
                    code,
                    expires_at: parse_instant(3, &expires_at)?,
                })
            })
            .map_err(internal)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(internal)?;

        Ok(codes)
    }

    fn delete_codes_by_user(&self, kind: CodeKind, user_id: UserId) -> StoreResult<()> {
        let conn = self.conn.lock().unwrap();

        conn.execute(
            "DELETE FROM codes WHERE kind = ?1 AND user_id = ?2",
            params![kind.as_str(), user_id.0 as i64],
        )
        .map_err(internal)?;

        Ok(())
    }

    fn delete_expired_codes(&self, kind: CodeKind, before: DateTime<Utc>) -> StoreResult<u64> {
        let conn = self.conn.lock().unwrap();

        let rows_deleted = conn
            .execute(
                "DELETE FROM codes WHERE kind = ?1 AND expires_at < ?2",
                params![kind.as_str(), before.to_rfc3339()],
            )
            .map_err(internal)?;

        Ok(rows_deleted as u64)
    }
}
