//! Event store trait definitions.

use async_trait::async_trait;
use entities::{Event, EventScope, Role, Rsvp, RsvpScope, RsvpStatus, User};
use uuid::Uuid;

use crate::EventStoreResult;

/// Filter options for listing users.
#[derive(Debug, Clone, Default)]
pub struct UserFilter {
    /// Filter by role.
    pub role: Option<Role>,
    /// Substring match on username or email, ignoring ASCII case.
    pub search: Option<String>,
    /// Maximum number of results.
    pub limit: Option<u32>,
    /// Offset for pagination.
    pub offset: Option<u32>,
}

impl UserFilter {
    /// Returns true if `user` passes this filter.
    pub fn matches(&self, user: &User) -> bool {
        if self.role.is_some_and(|role| user.role != role) {
            return false;
        }
        match &self.search {
            Some(term) => contains_ci(&user.username, term) || contains_ci(&user.email, term),
            None => true,
        }
    }
}

/// Filter options for listing events.
///
/// Has no `Default`: every listing names its scope.
#[derive(Debug, Clone)]
pub struct EventFilter {
    /// Visibility scope, applied before everything else.
    pub scope: EventScope,
    /// Narrow to public or private events.
    pub is_public: Option<bool>,
    /// Substring match on title, location or description, ignoring ASCII
    /// case.
    pub search: Option<String>,
    /// Maximum number of results.
    pub limit: Option<u32>,
    /// Offset for pagination.
    pub offset: Option<u32>,
}

impl EventFilter {
    /// Creates a filter that returns everything inside `scope`.
    pub fn new(scope: EventScope) -> Self {
        Self {
            scope,
            is_public: None,
            search: None,
            limit: None,
            offset: None,
        }
    }

    /// Returns true if `event` is inside the scope and passes the narrowing
    /// filters.
    pub fn matches(&self, event: &Event) -> bool {
        if !self.scope.permits(event) {
            return false;
        }
        if self.is_public.is_some_and(|is_public| event.is_public != is_public) {
            return false;
        }
        match &self.search {
            Some(term) => {
                contains_ci(&event.title, term)
                    || contains_ci(&event.location, term)
                    || contains_ci(&event.description, term)
            }
            None => true,
        }
    }
}

/// Filter options for listing RSVPs.
#[derive(Debug, Clone)]
pub struct RsvpFilter {
    /// Visibility scope, applied before everything else.
    pub scope: RsvpScope,
    /// Filter by event.
    pub event_id: Option<Uuid>,
    /// Filter by status.
    pub status: Option<RsvpStatus>,
    /// Maximum number of results.
    pub limit: Option<u32>,
    /// Offset for pagination.
    pub offset: Option<u32>,
}

impl RsvpFilter {
    /// Creates a filter that returns everything inside `scope`.
    pub fn new(scope: RsvpScope) -> Self {
        Self {
            scope,
            event_id: None,
            status: None,
            limit: None,
            offset: None,
        }
    }

    /// Returns true if `rsvp` is inside the scope and passes the narrowing
    /// filters.
    pub fn matches(&self, rsvp: &Rsvp) -> bool {
        self.scope.permits(rsvp)
            && self.event_id.is_none_or(|event_id| rsvp.event_id == event_id)
            && self.status.is_none_or(|status| rsvp.status == status)
    }
}

/// Substring match that folds ASCII letters only, the same comparison
/// SQLite's built-in `LIKE` performs. Other characters must match exactly.
fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack
        .to_ascii_lowercase()
        .contains(&needle.to_ascii_lowercase())
}

/// Trait for event manager storage operations.
///
/// Implementations own the integrity rules: usernames are unique, at most one
/// RSVP exists per (event, user) pair, events and RSVPs must reference
/// existing rows, and deletes cascade from users to events to RSVPs.
#[async_trait]
pub trait EventStore: Send + Sync {
    // =========================================================================
    // User operations
    // =========================================================================

    /// Creates a new user. Fails with `AlreadyExists` on a taken username.
    async fn create_user(&self, user: User) -> EventStoreResult<User>;

    /// Gets a user by ID.
    async fn get_user(&self, id: Uuid) -> EventStoreResult<Option<User>>;

    /// Gets a user by username.
    async fn get_user_by_username(&self, username: &str) -> EventStoreResult<Option<User>>;

    /// Gets every user whose ID is in `ids`. Unknown IDs are skipped.
    async fn get_users(&self, ids: &[Uuid]) -> EventStoreResult<Vec<User>>;

    /// Lists users ordered by username.
    async fn list_users(&self, filter: UserFilter) -> EventStoreResult<(Vec<User>, u32)>;

    /// Updates a user.
    async fn update_user(&self, user: User) -> EventStoreResult<User>;

    /// Deletes a user together with their events and RSVPs.
    async fn delete_user(&self, id: Uuid) -> EventStoreResult<()>;

    // =========================================================================
    // Event operations
    // =========================================================================

    /// Creates a new event.
    async fn create_event(&self, event: Event) -> EventStoreResult<Event>;

    /// Gets an event by ID, regardless of visibility.
    async fn get_event(&self, id: Uuid) -> EventStoreResult<Option<Event>>;

    /// Gets every event whose ID is in `ids`, regardless of visibility.
    /// Unknown IDs are skipped.
    async fn get_events(&self, ids: &[Uuid]) -> EventStoreResult<Vec<Event>>;

    /// Lists events ordered by start time, latest first.
    async fn list_events(&self, filter: EventFilter) -> EventStoreResult<(Vec<Event>, u32)>;

    /// Updates an event.
    async fn update_event(&self, event: Event) -> EventStoreResult<Event>;

    /// Deletes an event together with its RSVPs.
    async fn delete_event(&self, id: Uuid) -> EventStoreResult<()>;

    // =========================================================================
    // RSVP operations
    // =========================================================================

    /// Creates a new RSVP. Fails with `AlreadyExists` if the responder has
    /// already answered the event.
    async fn create_rsvp(&self, rsvp: Rsvp) -> EventStoreResult<Rsvp>;

    /// Gets an RSVP by ID, regardless of scope.
    async fn get_rsvp(&self, id: Uuid) -> EventStoreResult<Option<Rsvp>>;

    /// Lists RSVPs ordered by creation time.
    async fn list_rsvps(&self, filter: RsvpFilter) -> EventStoreResult<(Vec<Rsvp>, u32)>;

    /// Updates an RSVP.
    async fn update_rsvp(&self, rsvp: Rsvp) -> EventStoreResult<Rsvp>;

    /// Deletes an RSVP.
    async fn delete_rsvp(&self, id: Uuid) -> EventStoreResult<()>;
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    #[test]
    fn test_event_filter_applies_scope_first() {
        let owner = Uuid::new_v4();
        let now = Utc::now();
        let private = Event::new(owner, "Board meeting", now, now).with_public(false);

        let mut filter = EventFilter::new(EventScope::PublicOnly);
        filter.is_public = Some(false);
        assert!(!filter.matches(&private));

        let mut filter = EventFilter::new(EventScope::PublicOrOwnedBy(owner));
        filter.search = Some("BOARD".to_string());
        assert!(filter.matches(&private));
    }

    #[test]
    fn test_rsvp_filter() {
        let user_id = Uuid::new_v4();
        let event_id = Uuid::new_v4();
        let rsvp = Rsvp::new(event_id, user_id, RsvpStatus::Maybe);

        let mut filter = RsvpFilter::new(RsvpScope::OwnedBy(user_id));
        assert!(filter.matches(&rsvp));

        filter.status = Some(RsvpStatus::Going);
        assert!(!filter.matches(&rsvp));

        let mut filter = RsvpFilter::new(RsvpScope::OwnedBy(Uuid::new_v4()));
        filter.event_id = Some(event_id);
        assert!(!filter.matches(&rsvp));
    }

    #[test]
    fn test_user_filter() {
        let user = User::new("Alice", "hash")
            .with_email("alice@example.com")
            .with_role(Role::Manager);

        assert!(UserFilter::default().matches(&user));
        assert!(UserFilter {
            search: Some("EXAMPLE".to_string()),
            ..Default::default()
        }
        .matches(&user));
        assert!(!UserFilter {
            role: Some(Role::Admin),
            ..Default::default()
        }
        .matches(&user));
    }

    #[test]
    fn test_search_folds_ascii_case_only() {
        let now = Utc::now();
        let event = Event::new(Uuid::new_v4(), "Fête d'été", now, now);

        let mut filter = EventFilter::new(EventScope::All);
        filter.search = Some("FÊTE".to_string());
        assert!(!filter.matches(&event));

        filter.search = Some("fête D'".to_string());
        assert!(filter.matches(&event));

        filter.search = Some("été".to_string());
        assert!(filter.matches(&event));
    }
}
