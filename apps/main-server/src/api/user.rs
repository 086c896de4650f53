//! User administration endpoints. Administrators only.

use api_protocol::{requests::*, responses::*, UserView};
use auth::{policy::can_administer_users, Requester};
use axum::{extract::State, http::StatusCode, Json};
use chrono::Utc;
use entities::User;
use event_store::{EventStore, UserFilter};
use uuid::Uuid;
use validator::Validate;

use crate::error::{ServerError, ServerResult};
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::middleware::CurrentUser;
use crate::state::SharedState;

fn ensure_admin(requester: &Requester) -> ServerResult<()> {
    if can_administer_users(Some(requester)) {
        return Ok(());
    }
    tracing::warn!(user_id = %requester.id, "Denied user administration");
    Err(ServerError::PermissionDenied(
        "User administration requires the admin role".to_string(),
    ))
}

async fn find_user<S: EventStore>(store: &S, user_id: Uuid) -> ServerResult<User> {
    store
        .get_user(user_id)
        .await?
        .ok_or_else(|| ServerError::NotFound(format!("User {user_id}")))
}

/// Lists users.
pub async fn list_users<S: EventStore>(
    State(state): State<SharedState<S>>,
    CurrentUser(requester): CurrentUser,
    ApiQuery(query): ApiQuery<ListUsersQuery>,
) -> ServerResult<Json<ListUsersResponse>> {
    ensure_admin(&requester)?;
    query.validate()?;

    let filter = UserFilter {
        role: query.role,
        search: query.search,
        limit: query.limit,
        offset: query.offset,
    };

    let (users, total_count) = state.store.list_users(filter).await?;

    Ok(Json(ListUsersResponse {
        users: users.iter().map(UserView::from).collect(),
        total_count,
    }))
}

/// Creates a user with any role.
pub async fn create_user<S: EventStore>(
    State(state): State<SharedState<S>>,
    CurrentUser(requester): CurrentUser,
    ApiJson(request): ApiJson<CreateUserRequest>,
) -> ServerResult<(StatusCode, Json<UserView>)> {
    ensure_admin(&requester)?;
    request.validate()?;

    let password_hash = state.password_manager.hash_blocking(request.password).await?;
    let user = User::new(request.username, password_hash)
        .with_email(request.email.unwrap_or_default())
        .with_role(request.role);

    let user = state.store.create_user(user).await?;

    tracing::info!(user_id = %user.id, role = %user.role, admin_id = %requester.id, "User created");

    Ok((StatusCode::CREATED, Json(UserView::from(&user))))
}

/// Gets a user.
pub async fn get_user<S: EventStore>(
    State(state): State<SharedState<S>>,
    CurrentUser(requester): CurrentUser,
    ApiPath(user_id): ApiPath<Uuid>,
) -> ServerResult<Json<UserView>> {
    ensure_admin(&requester)?;
    let user = find_user(&state.store, user_id).await?;
    Ok(Json(UserView::from(&user)))
}

/// Replaces a user's writable fields.
pub async fn update_user<S: EventStore>(
    State(state): State<SharedState<S>>,
    CurrentUser(requester): CurrentUser,
    ApiPath(user_id): ApiPath<Uuid>,
    ApiJson(request): ApiJson<UpdateUserRequest>,
) -> ServerResult<Json<UserView>> {
    ensure_admin(&requester)?;
    request.validate()?;
    let mut user = find_user(&state.store, user_id).await?;

    user.username = request.username;
    user.email = request.email.unwrap_or_default();
    user.role = request.role;
    if let Some(password) = request.password {
        user.password_hash = state.password_manager.hash_blocking(password).await?;
    }
    user.updated_at = Utc::now();

    let user = state.store.update_user(user).await?;

    tracing::info!(user_id = %user.id, role = %user.role, admin_id = %requester.id, "User updated");

    Ok(Json(UserView::from(&user)))
}

/// Changes the given fields of a user.
pub async fn patch_user<S: EventStore>(
    State(state): State<SharedState<S>>,
    CurrentUser(requester): CurrentUser,
    ApiPath(user_id): ApiPath<Uuid>,
    ApiJson(request): ApiJson<PatchUserRequest>,
) -> ServerResult<Json<UserView>> {
    ensure_admin(&requester)?;
    request.validate()?;
    let mut user = find_user(&state.store, user_id).await?;

    if let Some(username) = request.username {
        user.username = username;
    }
    if let Some(email) = request.email {
        user.email = email;
    }
    if let Some(role) = request.role {
        user.role = role;
    }
    if let Some(password) = request.password {
        user.password_hash = state.password_manager.hash_blocking(password).await?;
    }
    user.updated_at = Utc::now();

    let user = state.store.update_user(user).await?;

    tracing::info!(user_id = %user.id, role = %user.role, admin_id = %requester.id, "User patched");

    Ok(Json(UserView::from(&user)))
}

/// Deletes a user along with their events and RSVPs.
pub async fn delete_user<S: EventStore>(
    State(state): State<SharedState<S>>,
    CurrentUser(requester): CurrentUser,
    ApiPath(user_id): ApiPath<Uuid>,
) -> ServerResult<StatusCode> {
    ensure_admin(&requester)?;
    state.store.delete_user(user_id).await?;

    tracing::info!(user_id = %user_id, admin_id = %requester.id, "User deleted");

    Ok(StatusCode::NO_CONTENT)
}
