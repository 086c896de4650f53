//! Event Manager Server
//!
//! REST API for events, RSVPs and users with role-based access control.
//! Anonymous callers see public events only; authenticated users also see
//! their own; managers and administrators see everything.

pub mod api;
pub mod config;
pub mod error;
pub mod extract;
pub mod middleware;
pub mod services;
pub mod state;

use auth::PasswordManager;
use axum::{Router, middleware::from_fn_with_state};
use event_store::EventStore;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::config::{Config, LogFormat};
use crate::state::{SharedState, create_shared_state};

pub use crate::services::bootstrap::bootstrap_admin;

/// Creates the application router with all routes configured.
pub fn create_app<S: EventStore + 'static>(state: SharedState<S>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    api::create_router::<S>()
        .layer(from_fn_with_state(
            state.clone(),
            middleware::auth_middleware::<S>,
        ))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

/// Creates the application state with the given configuration and store.
pub fn create_state<S: EventStore>(config: Config, store: S) -> SharedState<S> {
    create_shared_state(config, store, PasswordManager::new())
}

/// Initializes tracing with the given log level and format.
pub fn init_tracing(log_level: &str, log_format: LogFormat) {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    let registry = tracing_subscriber::registry().with(filter);
    match log_format {
        LogFormat::Text => registry.with(fmt::layer()).init(),
        LogFormat::Json => registry.with(fmt::layer().json()).init(),
    }
}
