//! Read projections returned by the API.

use chrono::{DateTime, Utc};
use entities::{Event, Role, Rsvp, RsvpStatus, User};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Safe user representation. Never carries a credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserView {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub role: Role,
}

impl From<&User> for UserView {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            role: user.role,
        }
    }
}

/// Event with its creator embedded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventView {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub location: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub created_by: UserView,
    pub is_public: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl EventView {
    /// Builds the view from an event and its creator.
    pub fn from_event(event: &Event, creator: &User) -> Self {
        Self {
            id: event.id,
            title: event.title.clone(),
            description: event.description.clone(),
            location: event.location.clone(),
            start_time: event.start_time,
            end_time: event.end_time,
            created_by: UserView::from(creator),
            is_public: event.is_public,
            created_at: event.created_at,
            updated_at: event.updated_at,
        }
    }
}

/// RSVP with both the responder and the full event embedded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RsvpView {
    pub id: Uuid,
    pub event: EventView,
    pub user: UserView,
    pub status: RsvpStatus,
    pub created_at: DateTime<Utc>,
}

impl RsvpView {
    /// Builds the view from an RSVP, its event view and its responder.
    pub fn from_rsvp(rsvp: &Rsvp, event: EventView, responder: &User) -> Self {
        Self {
            id: rsvp.id,
            event,
            user: UserView::from(responder),
            status: rsvp.status,
            created_at: rsvp.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    #[test]
    fn test_user_view_omits_password_hash() {
        let user = User::new("alice", "$argon2id$secret").with_email("alice@example.com");
        let json = serde_json::to_value(UserView::from(&user)).unwrap();

        assert_eq!(json["username"], "alice");
        assert_eq!(json["role"], "user");
        assert!(json.get("password_hash").is_none());
    }

    #[test]
    fn test_rsvp_view_nests_event_and_creator() {
        let owner = User::new("owner", "hash").with_role(Role::Manager);
        let guest = User::new("guest", "hash");
        let start = Utc::now();
        let event = Event::new(owner.id, "Launch", start, start + Duration::hours(2));
        let rsvp = Rsvp::new(event.id, guest.id, RsvpStatus::Maybe);

        let view = RsvpView::from_rsvp(&rsvp, EventView::from_event(&event, &owner), &guest);
        let json = serde_json::to_value(&view).unwrap();

        assert_eq!(json["status"], "maybe");
        assert_eq!(json["user"]["username"], "guest");
        assert_eq!(json["event"]["title"], "Launch");
        assert_eq!(json["event"]["created_by"]["role"], "manager");
    }
}
