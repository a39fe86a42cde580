//! pollid: identity and session service for a poll platform
//!
//! Account registration with mandatory email verification, password
//! login issuing a short-lived access token plus a long-lived sliding
//! refresh session, one-time-code password recovery, and background
//! reclamation of expired state.

pub mod codes;
pub mod config;
pub mod crypto;
pub mod email;
pub mod error;
pub mod identity;
pub mod reclaimer;
pub mod routes;
pub mod session;
pub mod state;
pub mod store;
pub mod token;

pub use codes::CodeIssuer;
pub use config::Config;
pub use email::{ConsoleNotifier, MailTemplate, Notifier, SmtpConfig, SmtpNotifier};
pub use error::ApiError;
pub use identity::{IdentityService, LoginTokens};
pub use reclaimer::Reclaimer;
pub use session::SessionManager;
pub use state::AppState;
pub use store::{CredentialStore, MemoryStore, SqliteStore};
pub use token::{AccessTokenSigner, JwtSigner};
