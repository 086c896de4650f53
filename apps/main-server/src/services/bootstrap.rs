//! Startup provisioning.

use entities::{Role, User};
use event_store::{EventStore, EventStoreError};

use crate::config::BootstrapAdmin;
use crate::error::ServerResult;
use crate::state::AppState;

/// Creates the configured administrator unless the username is taken.
///
/// Returns the created user, or `None` when nothing was done. An existing
/// account with that username is left untouched, whatever its role.
pub async fn bootstrap_admin<S: EventStore>(
    state: &AppState<S>,
    admin: &BootstrapAdmin,
) -> ServerResult<Option<User>> {
    if let Some(existing) = state.store.get_user_by_username(&admin.username).await? {
        if !existing.role.is_admin() {
            tracing::warn!(
                username = %existing.username,
                role = %existing.role,
                "Bootstrap admin username belongs to a non-admin user"
            );
        }
        return Ok(None);
    }

    let password_hash = state
        .password_manager
        .hash_blocking(admin.password.clone())
        .await?;
    let user = User::new(admin.username.clone(), password_hash)
        .with_email(admin.email.clone())
        .with_role(Role::Admin);

    match state.store.create_user(user).await {
        Ok(user) => {
            tracing::info!(user_id = %user.id, username = %user.username, "Bootstrap admin created");
            Ok(Some(user))
        }
        // Lost a race with another instance creating the same account.
        Err(EventStoreError::AlreadyExists { .. }) => Ok(None),
        Err(e) => Err(e.into()),
    }
}
