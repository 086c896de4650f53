//! Authorization policy and query scoping.
//!
//! Every access decision in the server goes through these functions. They are
//! pure: a denial is `false`, never an error, and an absent requester is an
//! ordinary input rather than a failure.

use entities::{Event, EventScope, Rsvp, RsvpScope};

use crate::Requester;

/// Kind of access being requested on a single record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Read,
    Write,
}

/// True iff the requester is authenticated with a manager-level role.
pub fn can_manage(requester: Option<&Requester>) -> bool {
    requester.is_some_and(|r| r.role.is_manager())
}

/// True iff the requester is authenticated as an administrator.
pub fn can_administer_users(requester: Option<&Requester>) -> bool {
    requester.is_some_and(|r| r.role.is_admin())
}

/// Decides access to a single event.
///
/// Reads are always allowed here; whether the event is visible at all is
/// decided by [`event_scope`]. Writes require the owner or an administrator.
pub fn can_modify_event(requester: Option<&Requester>, access: Access, event: &Event) -> bool {
    match access {
        Access::Read => true,
        Access::Write => {
            requester.is_some_and(|r| event.is_owned_by(r.id) || r.role.is_admin())
        }
    }
}

/// Decides access to a single RSVP. Writes require the responder or a
/// manager-level role.
pub fn can_modify_rsvp(requester: Option<&Requester>, access: Access, rsvp: &Rsvp) -> bool {
    match access {
        Access::Read => true,
        Access::Write => {
            requester.is_some_and(|r| rsvp.is_owned_by(r.id)) || can_manage(requester)
        }
    }
}

/// Largest set of events the requester may see.
pub fn event_scope(requester: Option<&Requester>) -> EventScope {
    match requester {
        None => EventScope::PublicOnly,
        Some(_) if can_manage(requester) => EventScope::All,
        Some(r) => EventScope::PublicOrOwnedBy(r.id),
    }
}

/// Largest set of RSVPs the requester may see.
pub fn rsvp_scope(requester: &Requester) -> RsvpScope {
    if can_manage(Some(requester)) {
        RsvpScope::All
    } else {
        RsvpScope::OwnedBy(requester.id)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use entities::{Role, RsvpStatus};
    use uuid::Uuid;

    use super::*;

    fn requester(role: Role) -> Requester {
        Requester::new(Uuid::new_v4(), format!("{role}-user"), role)
    }

    fn event_owned_by(owner: &Requester, is_public: bool) -> Event {
        let now = Utc::now();
        Event::new(owner.id, "Event", now, now).with_public(is_public)
    }

    #[test]
    fn test_can_manage() {
        assert!(!can_manage(None));
        assert!(!can_manage(Some(&requester(Role::User))));
        assert!(can_manage(Some(&requester(Role::Manager))));
        assert!(can_manage(Some(&requester(Role::Admin))));
    }

    #[test]
    fn test_can_administer_users() {
        assert!(!can_administer_users(None));
        assert!(!can_administer_users(Some(&requester(Role::User))));
        assert!(!can_administer_users(Some(&requester(Role::Manager))));
        assert!(can_administer_users(Some(&requester(Role::Admin))));
    }

    #[test]
    fn test_event_reads_always_allowed() {
        let owner = requester(Role::User);
        let event = event_owned_by(&owner, false);

        assert!(can_modify_event(None, Access::Read, &event));
        assert!(can_modify_event(
            Some(&requester(Role::User)),
            Access::Read,
            &event
        ));
    }

    #[test]
    fn test_event_writes() {
        let owner = requester(Role::User);
        let event = event_owned_by(&owner, true);

        assert!(!can_modify_event(None, Access::Write, &event));
        assert!(can_modify_event(Some(&owner), Access::Write, &event));
        assert!(!can_modify_event(
            Some(&requester(Role::User)),
            Access::Write,
            &event
        ));
        // Managers see everything but only admins edit events they don't own.
        assert!(!can_modify_event(
            Some(&requester(Role::Manager)),
            Access::Write,
            &event
        ));
        assert!(can_modify_event(
            Some(&requester(Role::Admin)),
            Access::Write,
            &event
        ));
    }

    #[test]
    fn test_rsvp_writes() {
        let responder = requester(Role::User);
        let rsvp = Rsvp::new(Uuid::new_v4(), responder.id, RsvpStatus::Going);

        assert!(!can_modify_rsvp(None, Access::Write, &rsvp));
        assert!(can_modify_rsvp(Some(&responder), Access::Write, &rsvp));
        assert!(!can_modify_rsvp(
            Some(&requester(Role::User)),
            Access::Write,
            &rsvp
        ));
        assert!(can_modify_rsvp(
            Some(&requester(Role::Manager)),
            Access::Write,
            &rsvp
        ));
        assert!(can_modify_rsvp(
            Some(&requester(Role::Admin)),
            Access::Write,
            &rsvp
        ));
    }

    #[test]
    fn test_event_scope() {
        let user = requester(Role::User);

        assert_eq!(event_scope(None), EventScope::PublicOnly);
        assert_eq!(event_scope(Some(&user)), EventScope::PublicOrOwnedBy(user.id));
        assert_eq!(event_scope(Some(&requester(Role::Manager))), EventScope::All);
        assert_eq!(event_scope(Some(&requester(Role::Admin))), EventScope::All);
    }

    #[test]
    fn test_rsvp_scope() {
        let user = requester(Role::User);

        assert_eq!(rsvp_scope(&user), RsvpScope::OwnedBy(user.id));
        assert_eq!(rsvp_scope(&requester(Role::Manager)), RsvpScope::All);
        assert_eq!(rsvp_scope(&requester(Role::Admin)), RsvpScope::All);
    }
}
