//! Service configuration

use crate::email::SmtpConfig;

#[derive(Debug, Clone)]
pub struct Config {
    /// Port to listen on
    pub port: u16,

    /// Path to the SQLite database; in-memory store when unset
    pub database_path: Option<String>,

    /// Secret for signing access tokens
    pub jwt_secret: String,

    /// Whether cookies should carry the Secure attribute
    pub production: bool,

    /// SMTP configuration; console notifier when unset
    pub smtp: Option<SmtpConfig>,
}

impl Config {
    /// Load configuration from environment variables
    ///
    /// - PORT (default: 3000)
    /// - DATABASE_PATH (default: in-memory store)
    /// - JWT_SECRET (default: a development-only value)
    /// - APP_ENV ("production" enables Secure cookies)
    /// - SMTP_* (see `SmtpConfig::from_env`)
    pub fn from_env() -> Self {
        let port = std::env::var("PORT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(3000);

        let database_path = std::env::var("DATABASE_PATH")
            .ok()
            .filter(|s| !s.is_empty());

        let jwt_secret = std::env::var("JWT_SECRET")
            .ok()
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| {
                tracing::warn!("JWT_SECRET not set; using a development-only secret");
                "pollid-dev-secret".to_string()
            });

        let production = std::env::var("APP_ENV")
            .map(|v| v == "production")
            .unwrap_or(false);

        Self {
            port,
            database_path,
            jwt_secret,
            production,
            smtp: SmtpConfig::from_env(),
        }
    }
}
