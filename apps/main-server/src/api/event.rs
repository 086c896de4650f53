//! Event API endpoints.

use api_protocol::{requests::*, responses::*, EventView};
use auth::{
    policy::{can_modify_event, event_scope, Access},
    Requester,
};
use axum::{extract::State, http::StatusCode, Json};
use chrono::Utc;
use entities::Event;
use event_store::{EventFilter, EventStore};
use uuid::Uuid;
use validator::Validate;

use crate::error::{ServerError, ServerResult};
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::middleware::{CurrentUser, MaybeUser};
use crate::services::projection::{event_view, event_views};
use crate::state::SharedState;

/// Loads an event the requester is allowed to see. Anything outside the
/// requester's scope is reported exactly like a missing record.
pub(crate) async fn find_visible_event<S: EventStore>(
    store: &S,
    requester: Option<&Requester>,
    event_id: Uuid,
) -> ServerResult<Event> {
    store
        .get_event(event_id)
        .await?
        .filter(|event| event_scope(requester).permits(event))
        .ok_or_else(|| ServerError::NotFound(format!("Event {event_id}")))
}

/// Loads a visible event and checks that the requester may change it.
async fn find_writable_event<S: EventStore>(
    store: &S,
    requester: &Requester,
    event_id: Uuid,
) -> ServerResult<Event> {
    let event = find_visible_event(store, Some(requester), event_id).await?;
    if !can_modify_event(Some(requester), Access::Write, &event) {
        tracing::warn!(
            event_id = %event.id,
            user_id = %requester.id,
            "Denied event modification"
        );
        return Err(ServerError::PermissionDenied(
            "Only the event owner or an administrator can modify this event".to_string(),
        ));
    }
    Ok(event)
}

/// Lists the events visible to the requester.
pub async fn list_events<S: EventStore>(
    State(state): State<SharedState<S>>,
    MaybeUser(requester): MaybeUser,
    ApiQuery(query): ApiQuery<ListEventsQuery>,
) -> ServerResult<Json<ListEventsResponse>> {
    query.validate()?;

    let filter = EventFilter {
        is_public: query.is_public,
        search: query.search,
        limit: query.limit,
        offset: query.offset,
        ..EventFilter::new(event_scope(requester.as_ref()))
    };

    let (events, total_count) = state.store.list_events(filter).await?;
    let events = event_views(&state.store, &events).await?;

    Ok(Json(ListEventsResponse {
        events,
        total_count,
    }))
}

/// Creates an event owned by the requester.
pub async fn create_event<S: EventStore>(
    State(state): State<SharedState<S>>,
    CurrentUser(requester): CurrentUser,
    ApiJson(request): ApiJson<CreateEventRequest>,
) -> ServerResult<(StatusCode, Json<EventView>)> {
    request.validate()?;

    let event = Event::new(requester.id, request.title, request.start_time, request.end_time)
        .with_description(request.description)
        .with_location(request.location)
        .with_public(request.is_public);

    let event = state.store.create_event(event).await?;

    tracing::info!(event_id = %event.id, user_id = %requester.id, "Event created");

    Ok((StatusCode::CREATED, Json(event_view(&state.store, &event).await?)))
}

/// Gets a single event.
pub async fn get_event<S: EventStore>(
    State(state): State<SharedState<S>>,
    MaybeUser(requester): MaybeUser,
    ApiPath(event_id): ApiPath<Uuid>,
) -> ServerResult<Json<EventView>> {
    let event = find_visible_event(&state.store, requester.as_ref(), event_id).await?;
    Ok(Json(event_view(&state.store, &event).await?))
}

/// Replaces every writable field of an event.
pub async fn update_event<S: EventStore>(
    State(state): State<SharedState<S>>,
    CurrentUser(requester): CurrentUser,
    ApiPath(event_id): ApiPath<Uuid>,
    ApiJson(request): ApiJson<UpdateEventRequest>,
) -> ServerResult<Json<EventView>> {
    let mut event = find_writable_event(&state.store, &requester, event_id).await?;
    request.validate()?;

    event.title = request.title;
    event.description = request.description;
    event.location = request.location;
    event.start_time = request.start_time;
    event.end_time = request.end_time;
    event.is_public = request.is_public;
    event.updated_at = Utc::now();

    let event = state.store.update_event(event).await?;

    tracing::info!(event_id = %event.id, user_id = %requester.id, "Event updated");

    Ok(Json(event_view(&state.store, &event).await?))
}

/// Changes the given fields of an event.
pub async fn patch_event<S: EventStore>(
    State(state): State<SharedState<S>>,
    CurrentUser(requester): CurrentUser,
    ApiPath(event_id): ApiPath<Uuid>,
    ApiJson(request): ApiJson<PatchEventRequest>,
) -> ServerResult<Json<EventView>> {
    let mut event = find_writable_event(&state.store, &requester, event_id).await?;
    request.validate()?;

    if let Some(title) = request.title {
        event.title = title;
    }
    if let Some(description) = request.description {
        event.description = description;
    }
    if let Some(location) = request.location {
        event.location = location;
    }
    if let Some(start_time) = request.start_time {
        event.start_time = start_time;
    }
    if let Some(end_time) = request.end_time {
        event.end_time = end_time;
    }
    if let Some(is_public) = request.is_public {
        event.is_public = is_public;
    }
    validate_time_window(&event.start_time, &event.end_time)
        .map_err(|e| ServerError::InvalidRequest(e.to_string()))?;
    event.updated_at = Utc::now();

    let event = state.store.update_event(event).await?;

    tracing::info!(event_id = %event.id, user_id = %requester.id, "Event patched");

    Ok(Json(event_view(&state.store, &event).await?))
}

/// Deletes an event together with its RSVPs.
pub async fn delete_event<S: EventStore>(
    State(state): State<SharedState<S>>,
    CurrentUser(requester): CurrentUser,
    ApiPath(event_id): ApiPath<Uuid>,
) -> ServerResult<StatusCode> {
    let event = find_writable_event(&state.store, &requester, event_id).await?;
    state.store.delete_event(event.id).await?;

    tracing::info!(event_id = %event.id, user_id = %requester.id, "Event deleted");

    Ok(StatusCode::NO_CONTENT)
}

/// Flips the visibility of an event.
pub async fn toggle_public<S: EventStore>(
    State(state): State<SharedState<S>>,
    CurrentUser(requester): CurrentUser,
    ApiPath(event_id): ApiPath<Uuid>,
) -> ServerResult<Json<ToggleVisibilityResponse>> {
    let mut event = find_writable_event(&state.store, &requester, event_id).await?;
    let is_public = event.toggle_public();
    state.store.update_event(event).await?;

    tracing::info!(event_id = %event_id, is_public, "Event visibility toggled");

    Ok(Json(ToggleVisibilityResponse { is_public }))
}
