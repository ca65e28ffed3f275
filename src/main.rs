//! # Snipit Server
//!
//! Entry point: logging, configuration, database, session store, then the
//! HTTP server.

use snipit::config::Config;
use snipit::state::AppState;
use snipit::{db, routes};
use std::net::SocketAddr;
// Session records live in the same SQLite database as the application data
use tower_sessions::ExpiredDeletion;
use tower_sessions_sqlx_store::SqliteStore;
// Structured logging setup
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Main application entry point
///
/// 1. Set up logging
/// 2. Load configuration from the environment
/// 3. Open the database and apply migrations
/// 4. Prepare the session store and its cleanup task
/// 5. Build the request pipeline and serve until Ctrl-C
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Default: info for dependencies, debug for this crate.
    // Can be overridden with RUST_LOG.
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,snipit=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    tracing::info!("Configuration loaded: {:?}", config);

    let pool = db::connect(&config).await?;
    tracing::info!("Database ready");

    let session_store = SqliteStore::new(pool.clone());
    // Creates the session table
    session_store.migrate().await?;

    // Expired sessions are already ignored on load; this just reclaims the rows
    let deletion_task = tokio::task::spawn(
        session_store
            .clone()
            .continuously_delete_expired(tokio::time::Duration::from_secs(60)),
    );

    let bind_addr = config.bind_address();
    let app = routes::app(AppState::from_pool(config, pool), session_store);

    tracing::info!("Starting server on {}", bind_addr);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    deletion_task.abort();
    tracing::info!("Server stopped");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        // Without a signal handler, keep serving until the process is killed
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
