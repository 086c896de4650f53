//! RSVP entity definitions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Attendance answer of an RSVP.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RsvpStatus {
    /// Attending.
    #[default]
    Going,
    /// Undecided.
    Maybe,
    /// Not attending.
    #[serde(alias = "not")]
    NotGoing,
}

impl RsvpStatus {
    /// Returns the wire name of this status.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Going => "going",
            Self::Maybe => "maybe",
            Self::NotGoing => "not_going",
        }
    }
}

impl std::str::FromStr for RsvpStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "going" => Ok(Self::Going),
            "maybe" => Ok(Self::Maybe),
            "not_going" | "not" => Ok(Self::NotGoing),
            other => Err(format!("unknown RSVP status: {other}")),
        }
    }
}

/// One user's answer to one event. At most one exists per (event, user).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rsvp {
    /// Unique identifier.
    pub id: Uuid,
    /// Event being answered.
    pub event_id: Uuid,
    /// Responding user.
    pub user_id: Uuid,
    /// Attendance answer.
    pub status: RsvpStatus,
    /// When this record was created.
    pub created_at: DateTime<Utc>,
}

impl Rsvp {
    /// Creates a new RSVP.
    pub fn new(event_id: Uuid, user_id: Uuid, status: RsvpStatus) -> Self {
        Self {
            id: Uuid::new_v4(),
            event_id,
            user_id,
            status,
            created_at: Utc::now(),
        }
    }

    /// Returns true if `user_id` is the responder.
    pub fn is_owned_by(&self, user_id: Uuid) -> bool {
        self.user_id == user_id
    }
}
