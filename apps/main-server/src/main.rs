//! Event Manager Server binary.

use std::net::SocketAddr;

use event_store::{EventStore, MemoryEventStore, SqliteEventStore};
use main_server::{
    bootstrap_admin,
    config::{Config, StoreBackend},
    create_app, create_state, init_tracing,
};

async fn serve<S: EventStore + 'static>(config: Config, store: S) -> anyhow::Result<()> {
    // Create application state
    let state = create_state(config.clone(), store);

    if let Some(admin) = &config.bootstrap_admin {
        bootstrap_admin(&state, admin).await?;
    }

    // Create application router
    let app = create_app(state);

    // Parse server address
    let addr: SocketAddr = config.server_addr().parse()?;

    tracing::info!(addr = %addr, "Server listening");

    // Start server
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env if present
    dotenvy::dotenv().ok();

    // Load configuration
    let config = Config::from_env()?;

    // Initialize tracing
    init_tracing(&config.log_level, config.log_format);

    tracing::info!(
        allow_self_assigned_role = config.allow_self_assigned_role,
        "Starting Event Manager Server"
    );

    match config.store_backend() {
        StoreBackend::Memory => {
            tracing::warn!("Using the in-memory store; data is lost on restart");
            serve(config, MemoryEventStore::new()).await
        }
        StoreBackend::Sqlite(url) => {
            let store = SqliteEventStore::connect(&url).await?;
            serve(config, store).await
        }
    }
}
