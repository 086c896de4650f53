//! Builds the nested read projections from stored records.

use std::collections::HashMap;

use api_protocol::{EventView, RsvpView};
use entities::{Event, Rsvp, User};
use event_store::EventStore;
use uuid::Uuid;

use crate::error::{ServerError, ServerResult};

/// Loads the given users, keyed by id. A referenced user that no longer
/// exists is an internal fault since deletes cascade.
async fn load_users<S: EventStore>(
    store: &S,
    ids: impl IntoIterator<Item = Uuid>,
) -> ServerResult<HashMap<Uuid, User>> {
    let mut ids: Vec<Uuid> = ids.into_iter().collect();
    ids.sort_unstable();
    ids.dedup();

    let users = store.get_users(&ids).await?;
    let users: HashMap<Uuid, User> = users.into_iter().map(|u| (u.id, u)).collect();

    if let Some(missing) = ids.iter().find(|id| !users.contains_key(id)) {
        return Err(ServerError::Internal(format!("referenced user {missing} is missing")));
    }
    Ok(users)
}

fn lookup<'a>(users: &'a HashMap<Uuid, User>, id: &Uuid) -> ServerResult<&'a User> {
    users
        .get(id)
        .ok_or_else(|| ServerError::Internal(format!("referenced user {id} is missing")))
}

/// Projects a single event.
pub async fn event_view<S: EventStore>(store: &S, event: &Event) -> ServerResult<EventView> {
    let mut views = event_views(store, std::slice::from_ref(event)).await?;
    views
        .pop()
        .ok_or_else(|| ServerError::Internal("event projection is empty".to_string()))
}

/// Projects events, preserving order.
pub async fn event_views<S: EventStore>(store: &S, events: &[Event]) -> ServerResult<Vec<EventView>> {
    let users = load_users(store, events.iter().map(|e| e.created_by)).await?;

    events
        .iter()
        .map(|event| Ok(EventView::from_event(event, lookup(&users, &event.created_by)?)))
        .collect()
}

/// Projects a single RSVP.
pub async fn rsvp_view<S: EventStore>(store: &S, rsvp: &Rsvp) -> ServerResult<RsvpView> {
    let mut views = rsvp_views(store, std::slice::from_ref(rsvp)).await?;
    views
        .pop()
        .ok_or_else(|| ServerError::Internal("RSVP projection is empty".to_string()))
}

/// Projects RSVPs, preserving order. Each embeds its full event, whatever the
/// event's visibility.
pub async fn rsvp_views<S: EventStore>(store: &S, rsvps: &[Rsvp]) -> ServerResult<Vec<RsvpView>> {
    let mut event_ids: Vec<Uuid> = rsvps.iter().map(|r| r.event_id).collect();
    event_ids.sort_unstable();
    event_ids.dedup();

    let events: HashMap<Uuid, Event> = store
        .get_events(&event_ids)
        .await?
        .into_iter()
        .map(|e| (e.id, e))
        .collect();
    if let Some(missing) = event_ids.iter().find(|id| !events.contains_key(id)) {
        return Err(ServerError::Internal(format!("referenced event {missing} is missing")));
    }

    let users = load_users(
        store,
        events
            .values()
            .map(|e| e.created_by)
            .chain(rsvps.iter().map(|r| r.user_id)),
    )
    .await?;

    rsvps
        .iter()
        .map(|rsvp| {
            let event = events.get(&rsvp.event_id).ok_or_else(|| {
                ServerError::Internal(format!("referenced event {} is missing", rsvp.event_id))
            })?;
            let event_view = EventView::from_event(event, lookup(&users, &event.created_by)?);
            Ok(RsvpView::from_rsvp(rsvp, event_view, lookup(&users, &rsvp.user_id)?))
        })
        .collect()
}
