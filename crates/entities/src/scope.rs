//! Visibility scopes.
//!
//! A scope is the largest set of records a requester may ever see. Stores
//! apply it before any narrowing filter and before pagination.

use uuid::Uuid;

use crate::{Event, Rsvp};

/// Which events are visible.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventScope {
    /// Every event, public or private.
    All,
    /// Public events only.
    PublicOnly,
    /// Public events plus every event owned by the given user.
    PublicOrOwnedBy(Uuid),
}

impl EventScope {
    /// Returns true if `event` lies inside this scope.
    pub fn permits(&self, event: &Event) -> bool {
        match self {
            Self::All => true,
            Self::PublicOnly => event.is_public,
            Self::PublicOrOwnedBy(user_id) => event.is_public || event.is_owned_by(*user_id),
        }
    }
}

/// Which RSVPs are visible.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RsvpScope {
    /// Every RSVP.
    All,
    /// Only RSVPs answered by the given user.
    OwnedBy(Uuid),
}

impl RsvpScope {
    /// Returns true if `rsvp` lies inside this scope.
    pub fn permits(&self, rsvp: &Rsvp) -> bool {
        match self {
            Self::All => true,
            Self::OwnedBy(user_id) => rsvp.is_owned_by(*user_id),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::RsvpStatus;

    fn event(owner: Uuid, is_public: bool) -> Event {
        let now = Utc::now();
        Event::new(owner, "Event", now, now).with_public(is_public)
    }

    #[test]
    fn test_event_scope() {
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();
        let public = event(alice, true);
        let private = event(alice, false);

        assert!(EventScope::All.permits(&private));
        assert!(EventScope::PublicOnly.permits(&public));
        assert!(!EventScope::PublicOnly.permits(&private));
        assert!(EventScope::PublicOrOwnedBy(alice).permits(&private));
        assert!(EventScope::PublicOrOwnedBy(bob).permits(&public));
        assert!(!EventScope::PublicOrOwnedBy(bob).permits(&private));
    }

    #[test]
    fn test_rsvp_scope() {
        let alice = Uuid::new_v4();
        let rsvp = Rsvp::new(Uuid::new_v4(), alice, RsvpStatus::Maybe);

        assert!(RsvpScope::All.permits(&rsvp));
        assert!(RsvpScope::OwnedBy(alice).permits(&rsvp));
        assert!(!RsvpScope::OwnedBy(Uuid::new_v4()).permits(&rsvp));
    }
}
