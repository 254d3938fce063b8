//! Pulse message API server
//!
//! Stores message requests and serves them to the board.

use pulse_api::{app, AppState};
use pulse_services::PulseConfig;
use std::net::SocketAddr;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env.local file
    if let Err(e) = dotenvy::from_filename(".env.local") {
        // Not an error if the file doesn't exist
        if !matches!(e, dotenvy::Error::Io(_)) {
            eprintln!("Warning: Failed to load .env.local: {}", e);
        }
    }

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,pulse_api=debug,tower_http=debug")),
        )
        .init();

    info!("Starting Pulse message API");

    let config = PulseConfig::from_env()?;

    match &config.message_db_path {
        Some(path) => info!("Initializing message store at: {}", path.display()),
        None => info!("MESSAGE_DB_PATH not set, keeping messages in memory"),
    }
    let store = config.message_store()?;
    info!("Message store ready with {} message(s)", store.count()?);

    let app = app(AppState::new(store));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    info!("Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
