//! Authentication API endpoints.

use api_protocol::{requests::*, responses::*, UserView};
use auth::AuthError;
use axum::{extract::State, http::StatusCode, Json};
use entities::{Role, User};
use event_store::EventStore;
use validator::Validate;

use crate::error::{ServerError, ServerResult};
use crate::extract::ApiJson;
use crate::middleware::CurrentUser;
use crate::state::SharedState;

/// Picks the role for a self-registration.
fn registration_role(requested: Option<&str>, allow_self_assigned_role: bool) -> Role {
    match requested {
        Some(role) if allow_self_assigned_role => Role::parse_lossy(role),
        _ => Role::User,
    }
}

/// Registers a new account.
pub async fn register<S: EventStore>(
    State(state): State<SharedState<S>>,
    ApiJson(request): ApiJson<RegisterRequest>,
) -> ServerResult<(StatusCode, Json<UserView>)> {
    request.validate()?;

    let role = registration_role(request.role.as_deref(), state.config.allow_self_assigned_role);
    if request.role.is_some() && !state.config.allow_self_assigned_role {
        tracing::debug!(username = %request.username, "Ignoring self-assigned role on registration");
    }

    let password_hash = state.password_manager.hash_blocking(request.password).await?;
    let user = User::new(request.username, password_hash)
        .with_email(request.email.unwrap_or_default())
        .with_role(role);

    let user = state.store.create_user(user).await?;

    tracing::info!(user_id = %user.id, username = %user.username, role = %user.role, "User registered");

    Ok((StatusCode::CREATED, Json(UserView::from(&user))))
}

/// Exchanges credentials for an access/refresh token pair.
pub async fn obtain_token<S: EventStore>(
    State(state): State<SharedState<S>>,
    ApiJson(request): ApiJson<TokenRequest>,
) -> ServerResult<Json<TokenPairResponse>> {
    request.validate()?;

    let user = state.store.get_user_by_username(&request.username).await?;
    let verified = state
        .password_manager
        .verify_login_blocking(request.password, user.as_ref().map(|u| u.password_hash.clone()))
        .await?;
    let user = user.filter(|_| verified).ok_or_else(|| {
        tracing::debug!(username = %request.username, "Rejected login");
        AuthError::InvalidCredentials
    })?;

    let pair = state.jwt_manager.generate_token_pair(&user)?;

    tracing::info!(user_id = %user.id, "Issued token pair");

    Ok(Json(TokenPairResponse {
        access: pair.access,
        refresh: pair.refresh,
        token_type: BEARER_TOKEN_TYPE.to_string(),
        expires_in: state.jwt_manager.access_expiration_seconds(),
    }))
}

/// Issues a fresh access token for a valid refresh token.
pub async fn refresh_token<S: EventStore>(
    State(state): State<SharedState<S>>,
    ApiJson(request): ApiJson<RefreshTokenRequest>,
) -> ServerResult<Json<AccessTokenResponse>> {
    request.validate()?;

    let claims = state.jwt_manager.validate_refresh_token(&request.refresh)?;
    let user = state
        .store
        .get_user(claims.user_id()?)
        .await?
        .ok_or(AuthError::UserNotFound)?;

    let access = state.jwt_manager.generate_access_token(&user)?;

    tracing::debug!(user_id = %user.id, "Refreshed access token");

    Ok(Json(AccessTokenResponse {
        access,
        token_type: BEARER_TOKEN_TYPE.to_string(),
        expires_in: state.jwt_manager.access_expiration_seconds(),
    }))
}

/// Gets the current user.
pub async fn get_current_user<S: EventStore>(
    State(state): State<SharedState<S>>,
    CurrentUser(requester): CurrentUser,
) -> ServerResult<Json<UserView>> {
    let user = state
        .store
        .get_user(requester.id)
        .await?
        .ok_or(ServerError::AuthenticationRequired)?;

    Ok(Json(UserView::from(&user)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registration_role_is_forced_by_default() {
        assert_eq!(registration_role(Some("admin"), false), Role::User);
        assert_eq!(registration_role(None, false), Role::User);
    }

    #[test]
    fn test_registration_role_when_self_assignment_allowed() {
        assert_eq!(registration_role(Some("manager"), true), Role::Manager);
        assert_eq!(registration_role(Some("superuser"), true), Role::User);
        assert_eq!(registration_role(None, true), Role::User);
    }
}
