//! In-memory event store implementation.

use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
};

use async_trait::async_trait;
use entities::{Event, Rsvp, User};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    EventFilter, EventStore, EventStoreError, EventStoreResult, RsvpFilter, UserFilter,
};

/// In-memory event store.
///
/// Tables are always locked in the order users, events, rsvps so that
/// cascading deletes never deadlock against inserts.
#[derive(Debug, Default, Clone)]
pub struct MemoryEventStore {
    users: Arc<RwLock<HashMap<Uuid, User>>>,
    events: Arc<RwLock<HashMap<Uuid, Event>>>,
    rsvps: Arc<RwLock<HashMap<Uuid, Rsvp>>>,
}

impl MemoryEventStore {
    /// Creates a new in-memory event store.
    pub fn new() -> Self {
        Self::default()
    }
}

fn paginate<T>(items: Vec<T>, offset: Option<u32>, limit: Option<u32>) -> Vec<T> {
    items
        .into_iter()
        .skip(offset.unwrap_or(0) as usize)
        .take(limit.map_or(usize::MAX, |l| l as usize))
        .collect()
}

#[async_trait]
impl EventStore for MemoryEventStore {
    // =========================================================================
    // User operations
    // =========================================================================

    async fn create_user(&self, user: User) -> EventStoreResult<User> {
        let mut users = self.users.write().await;
        if users.contains_key(&user.id) {
            return Err(EventStoreError::already_exists("User", user.id.to_string()));
        }
        if users.values().any(|u| u.username == user.username) {
            return Err(EventStoreError::already_exists("User", user.username));
        }
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn get_user(&self, id: Uuid) -> EventStoreResult<Option<User>> {
        let users = self.users.read().await;
        Ok(users.get(&id).cloned())
    }

    async fn get_user_by_username(&self, username: &str) -> EventStoreResult<Option<User>> {
        let users = self.users.read().await;
        Ok(users.values().find(|u| u.username == username).cloned())
    }

    async fn get_users(&self, ids: &[Uuid]) -> EventStoreResult<Vec<User>> {
        let users = self.users.read().await;
        Ok(ids.iter().filter_map(|id| users.get(id).cloned()).collect())
    }

    async fn list_users(&self, filter: UserFilter) -> EventStoreResult<(Vec<User>, u32)> {
        let users = self.users.read().await;
        let mut result: Vec<User> = users
            .values()
            .filter(|u| filter.matches(u))
            .cloned()
            .collect();
        result.sort_by(|a, b| a.username.cmp(&b.username));

        let total = result.len() as u32;
        Ok((paginate(result, filter.offset, filter.limit), total))
    }

    async fn update_user(&self, user: User) -> EventStoreResult<User> {
        let mut users = self.users.write().await;
        if !users.contains_key(&user.id) {
            return Err(EventStoreError::not_found("User", user.id.to_string()));
        }
        if users
            .values()
            .any(|u| u.id != user.id && u.username == user.username)
        {
            return Err(EventStoreError::already_exists("User", user.username));
        }
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn delete_user(&self, id: Uuid) -> EventStoreResult<()> {
        let mut users = self.users.write().await;
        let mut events = self.events.write().await;
        let mut rsvps = self.rsvps.write().await;

        if users.remove(&id).is_none() {
            return Err(EventStoreError::not_found("User", id.to_string()));
        }

        let owned_events: HashSet<Uuid> = events
            .values()
            .filter(|e| e.created_by == id)
            .map(|e| e.id)
            .collect();
        events.retain(|event_id, _| !owned_events.contains(event_id));
        rsvps.retain(|_, r| r.user_id != id && !owned_events.contains(&r.event_id));

        Ok(())
    }

    // =========================================================================
    // Event operations
    // =========================================================================

    async fn create_event(&self, event: Event) -> EventStoreResult<Event> {
        let users = self.users.read().await;
        let mut events = self.events.write().await;
        if events.contains_key(&event.id) {
            return Err(EventStoreError::already_exists("Event", event.id.to_string()));
        }
        if !users.contains_key(&event.created_by) {
            return Err(EventStoreError::ForeignKeyViolation(format!(
                "event owner {} does not exist",
                event.created_by
            )));
        }
        events.insert(event.id, event.clone());
        Ok(event)
    }

    async fn get_event(&self, id: Uuid) -> EventStoreResult<Option<Event>> {
        let events = self.events.read().await;
        Ok(events.get(&id).cloned())
    }

    async fn get_events(&self, ids: &[Uuid]) -> EventStoreResult<Vec<Event>> {
        let events = self.events.read().await;
        Ok(ids.iter().filter_map(|id| events.get(id).cloned()).collect())
    }

    async fn list_events(&self, filter: EventFilter) -> EventStoreResult<(Vec<Event>, u32)> {
        let events = self.events.read().await;
        let mut result: Vec<Event> = events
            .values()
            .filter(|e| filter.matches(e))
            .cloned()
            .collect();
        result.sort_by(|a, b| b.start_time.cmp(&a.start_time).then(a.id.cmp(&b.id)));

        let total = result.len() as u32;
        Ok((paginate(result, filter.offset, filter.limit), total))
    }

    async fn update_event(&self, event: Event) -> EventStoreResult<Event> {
        let users = self.users.read().await;
        let mut events = self.events.write().await;
        if !events.contains_key(&event.id) {
            return Err(EventStoreError::not_found("Event", event.id.to_string()));
        }
        if !users.contains_key(&event.created_by) {
            return Err(EventStoreError::ForeignKeyViolation(format!(
                "event owner {} does not exist",
                event.created_by
            )));
        }
        events.insert(event.id, event.clone());
        Ok(event)
    }

    async fn delete_event(&self, id: Uuid) -> EventStoreResult<()> {
        let mut events = self.events.write().await;
        let mut rsvps = self.rsvps.write().await;
        if events.remove(&id).is_none() {
            return Err(EventStoreError::not_found("Event", id.to_string()));
        }
        rsvps.retain(|_, r| r.event_id != id);
        Ok(())
    }

    // =========================================================================
    // RSVP operations
    // =========================================================================

    async fn create_rsvp(&self, rsvp: Rsvp) -> EventStoreResult<Rsvp> {
        let users = self.users.read().await;
        let events = self.events.read().await;
        let mut rsvps = self.rsvps.write().await;

        if rsvps.contains_key(&rsvp.id) {
            return Err(EventStoreError::already_exists("Rsvp", rsvp.id.to_string()));
        }
        if !users.contains_key(&rsvp.user_id) {
            return Err(EventStoreError::ForeignKeyViolation(format!(
                "user {} does not exist",
                rsvp.user_id
            )));
        }
        if !events.contains_key(&rsvp.event_id) {
            return Err(EventStoreError::ForeignKeyViolation(format!(
                "event {} does not exist",
                rsvp.event_id
            )));
        }
        if rsvps
            .values()
            .any(|r| r.event_id == rsvp.event_id && r.user_id == rsvp.user_id)
        {
            return Err(EventStoreError::already_exists(
                "Rsvp",
                format!("event {} user {}", rsvp.event_id, rsvp.user_id),
            ));
        }

        rsvps.insert(rsvp.id, rsvp.clone());
        Ok(rsvp)
    }

    async fn get_rsvp(&self, id: Uuid) -> EventStoreResult<Option<Rsvp>> {
        let rsvps = self.rsvps.read().await;
        Ok(rsvps.get(&id).cloned())
    }

    async fn list_rsvps(&self, filter: RsvpFilter) -> EventStoreResult<(Vec<Rsvp>, u32)> {
        let rsvps = self.rsvps.read().await;
        let mut result: Vec<Rsvp> = rsvps
            .values()
            .filter(|r| filter.matches(r))
            .cloned()
            .collect();
        result.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));

        let total = result.len() as u32;
        Ok((paginate(result, filter.offset, filter.limit), total))
    }

    async fn update_rsvp(&self, rsvp: Rsvp) -> EventStoreResult<Rsvp> {
        let mut rsvps = self.rsvps.write().await;
        if !rsvps.contains_key(&rsvp.id) {
            return Err(EventStoreError::not_found("Rsvp", rsvp.id.to_string()));
        }
        if rsvps.values().any(|r| {
            r.id != rsvp.id && r.event_id == rsvp.event_id && r.user_id == rsvp.user_id
        }) {
            return Err(EventStoreError::already_exists(
                "Rsvp",
                format!("event {} user {}", rsvp.event_id, rsvp.user_id),
            ));
        }
        rsvps.insert(rsvp.id, rsvp.clone());
        Ok(rsvp)
    }

    async fn delete_rsvp(&self, id: Uuid) -> EventStoreResult<()> {
        let mut rsvps = self.rsvps.write().await;
        if rsvps.remove(&id).is_none() {
            return Err(EventStoreError::not_found("Rsvp", id.to_string()));
        }
        Ok(())
    }
}
