//! Application state.

use std::sync::Arc;

use auth::{JwtConfig, JwtManager, PasswordManager};
use event_store::EventStore;

use crate::config::Config;

/// Shared application state.
pub struct AppState<S: EventStore> {
    /// Server configuration.
    pub config: Config,
    /// Record store.
    pub store: S,
    /// Issues and validates bearer tokens.
    pub jwt_manager: JwtManager,
    /// Hashes and verifies passwords.
    pub password_manager: PasswordManager,
}

impl<S: EventStore> AppState<S> {
    /// Creates new application state.
    pub fn new(config: Config, store: S, password_manager: PasswordManager) -> Self {
        let jwt_config = JwtConfig::new(config.jwt_secret.clone())
            .with_access_token_minutes(config.access_token_minutes)
            .with_refresh_token_hours(config.refresh_token_hours);

        Self {
            config,
            store,
            jwt_manager: JwtManager::new(jwt_config),
            password_manager,
        }
    }
}

/// Type alias for shared state.
pub type SharedState<S> = Arc<AppState<S>>;

/// Creates shared state from config and store.
pub fn create_shared_state<S: EventStore>(
    config: Config,
    store: S,
    password_manager: PasswordManager,
) -> SharedState<S> {
    Arc::new(AppState::new(config, store, password_manager))
}
