//! pollid: identity and session service for a poll platform

use std::sync::Arc;

use anyhow::Result;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pollid::{
    routes, AppState, Config, ConsoleNotifier, CredentialStore, JwtSigner, MemoryStore, Notifier,
    Reclaimer, SmtpNotifier, SqliteStore,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pollid=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env();
    tracing::info!(port = config.port, production = config.production, "Loaded configuration");

    // Pick the notifier: SMTP when configured, console otherwise
    let notifier: Box<dyn Notifier> = match config.smtp.clone() {
        Some(smtp) => Box::new(SmtpNotifier::new(smtp).map_err(anyhow::Error::msg)?),
        None => {
            tracing::info!("SMTP not configured; codes will be printed to the console");
            Box::new(ConsoleNotifier::new())
        }
    };

    // Pick the store: durable when a database path is configured
    match config.database_path.clone() {
        Some(path) => {
            tracing::info!(path = %path, "Using SQLite store");
            let store = Arc::new(SqliteStore::open(&path)?);
            serve(store, notifier, config).await
        }
        None => {
            tracing::info!("DATABASE_PATH not set; using in-memory store");
            serve(Arc::new(MemoryStore::new()), notifier, config).await
        }
    }
}

async fn serve<S>(store: Arc<S>, notifier: Box<dyn Notifier>, config: Config) -> Result<()>
where
    S: CredentialStore + 'static,
{
    let signer = JwtSigner::new(&config.jwt_secret);

    // Background reclamation runs independently of request traffic
    Reclaimer::new(store.clone()).spawn();

    let state = Arc::new(AppState::new(store, notifier, signer, config.production));
    let app = routes::create_router(state);

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("Identity service listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
