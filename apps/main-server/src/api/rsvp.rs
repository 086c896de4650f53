//! RSVP API endpoints.

use api_protocol::{requests::*, responses::*, RsvpView};
use auth::{
    policy::{can_modify_rsvp, rsvp_scope, Access},
    Requester,
};
use axum::{extract::State, http::StatusCode, Json};
use entities::{Rsvp, RsvpStatus};
use event_store::{EventStore, EventStoreError, RsvpFilter};
use uuid::Uuid;
use validator::Validate;

use crate::api::event::find_visible_event;
use crate::error::{ServerError, ServerResult};
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::middleware::CurrentUser;
use crate::services::projection::{rsvp_view, rsvp_views};
use crate::state::SharedState;

async fn find_visible_rsvp<S: EventStore>(
    store: &S,
    requester: &Requester,
    rsvp_id: Uuid,
) -> ServerResult<Rsvp> {
    store
        .get_rsvp(rsvp_id)
        .await?
        .filter(|rsvp| rsvp_scope(requester).permits(rsvp))
        .ok_or_else(|| ServerError::NotFound(format!("RSVP {rsvp_id}")))
}

async fn find_writable_rsvp<S: EventStore>(
    store: &S,
    requester: &Requester,
    rsvp_id: Uuid,
) -> ServerResult<Rsvp> {
    let rsvp = find_visible_rsvp(store, requester, rsvp_id).await?;
    if !can_modify_rsvp(Some(requester), Access::Write, &rsvp) {
        tracing::warn!(rsvp_id = %rsvp.id, user_id = %requester.id, "Denied RSVP modification");
        return Err(ServerError::PermissionDenied(
            "Only the responder or a manager can modify this RSVP".to_string(),
        ));
    }
    Ok(rsvp)
}

async fn save_status<S: EventStore>(
    store: &S,
    mut rsvp: Rsvp,
    status: RsvpStatus,
) -> ServerResult<Json<RsvpView>> {
    rsvp.status = status;
    let rsvp = store.update_rsvp(rsvp).await?;

    tracing::info!(rsvp_id = %rsvp.id, status = rsvp.status.as_str(), "RSVP updated");

    Ok(Json(rsvp_view(store, &rsvp).await?))
}

/// Lists the RSVPs visible to the requester.
pub async fn list_rsvps<S: EventStore>(
    State(state): State<SharedState<S>>,
    CurrentUser(requester): CurrentUser,
    ApiQuery(query): ApiQuery<ListRsvpsQuery>,
) -> ServerResult<Json<ListRsvpsResponse>> {
    query.validate()?;

    let filter = RsvpFilter {
        event_id: query.event_id,
        status: query.status,
        limit: query.limit,
        offset: query.offset,
        ..RsvpFilter::new(rsvp_scope(&requester))
    };

    let (rsvps, total_count) = state.store.list_rsvps(filter).await?;
    let rsvps = rsvp_views(&state.store, &rsvps).await?;

    Ok(Json(ListRsvpsResponse { rsvps, total_count }))
}

/// Records the requester's answer to an event.
///
/// A second answer to the same event is a conflict; the first one stays as
/// it was and must be changed through update.
pub async fn create_rsvp<S: EventStore>(
    State(state): State<SharedState<S>>,
    CurrentUser(requester): CurrentUser,
    ApiJson(request): ApiJson<CreateRsvpRequest>,
) -> ServerResult<(StatusCode, Json<RsvpView>)> {
    request.validate()?;

    let event = find_visible_event(&state.store, Some(&requester), request.event_id).await?;

    let rsvp = state
        .store
        .create_rsvp(Rsvp::new(event.id, requester.id, request.status))
        .await
        .map_err(|e| match e {
            EventStoreError::AlreadyExists { .. } => {
                ServerError::Conflict("You have already responded to this event".to_string())
            }
            other => other.into(),
        })?;

    tracing::info!(
        rsvp_id = %rsvp.id,
        event_id = %event.id,
        user_id = %requester.id,
        status = rsvp.status.as_str(),
        "RSVP created"
    );

    Ok((StatusCode::CREATED, Json(rsvp_view(&state.store, &rsvp).await?)))
}

/// Gets a single RSVP.
pub async fn get_rsvp<S: EventStore>(
    State(state): State<SharedState<S>>,
    CurrentUser(requester): CurrentUser,
    ApiPath(rsvp_id): ApiPath<Uuid>,
) -> ServerResult<Json<RsvpView>> {
    let rsvp = find_visible_rsvp(&state.store, &requester, rsvp_id).await?;
    Ok(Json(rsvp_view(&state.store, &rsvp).await?))
}

/// Replaces the status of an RSVP.
pub async fn update_rsvp<S: EventStore>(
    State(state): State<SharedState<S>>,
    CurrentUser(requester): CurrentUser,
    ApiPath(rsvp_id): ApiPath<Uuid>,
    ApiJson(request): ApiJson<UpdateRsvpRequest>,
) -> ServerResult<Json<RsvpView>> {
    let rsvp = find_writable_rsvp(&state.store, &requester, rsvp_id).await?;
    save_status(&state.store, rsvp, request.status).await
}

/// Changes the status of an RSVP when one is given.
pub async fn patch_rsvp<S: EventStore>(
    State(state): State<SharedState<S>>,
    CurrentUser(requester): CurrentUser,
    ApiPath(rsvp_id): ApiPath<Uuid>,
    ApiJson(request): ApiJson<PatchRsvpRequest>,
) -> ServerResult<Json<RsvpView>> {
    let rsvp = find_writable_rsvp(&state.store, &requester, rsvp_id).await?;
    let status = request.status.unwrap_or(rsvp.status);
    save_status(&state.store, rsvp, status).await
}

/// Deletes an RSVP.
pub async fn delete_rsvp<S: EventStore>(
    State(state): State<SharedState<S>>,
    CurrentUser(requester): CurrentUser,
    ApiPath(rsvp_id): ApiPath<Uuid>,
) -> ServerResult<StatusCode> {
    let rsvp = find_writable_rsvp(&state.store, &requester, rsvp_id).await?;
    state.store.delete_rsvp(rsvp.id).await?;

    tracing::info!(rsvp_id = %rsvp.id, user_id = %requester.id, "RSVP deleted");

    Ok(StatusCode::NO_CONTENT)
}
