//! Event entity definitions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An event created by a user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    /// Unique identifier.
    pub id: Uuid,
    /// Title.
    pub title: String,
    /// Free-form description (may be empty).
    pub description: String,
    /// Location (may be empty).
    pub location: String,
    /// When the event starts.
    pub start_time: DateTime<Utc>,
    /// When the event ends.
    pub end_time: DateTime<Utc>,
    /// Owning user.
    pub created_by: Uuid,
    /// Whether the event is listed for everyone.
    pub is_public: bool,
    /// When this record was created.
    pub created_at: DateTime<Utc>,
    /// When this record was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Event {
    /// Creates a new public event owned by `created_by`.
    pub fn new(
        created_by: Uuid,
        title: impl Into<String>,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            description: String::new(),
            location: String::new(),
            start_time,
            end_time,
            created_by,
            is_public: true,
            created_at: now,
            updated_at: now,
        }
    }

    /// Sets the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Sets the location.
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = location.into();
        self
    }

    /// Sets the visibility flag.
    pub fn with_public(mut self, is_public: bool) -> Self {
        self.is_public = is_public;
        self
    }

    /// Returns true if `user_id` owns this event.
    pub fn is_owned_by(&self, user_id: Uuid) -> bool {
        self.created_by == user_id
    }

    /// Flips the visibility flag and returns the new value.
    pub fn toggle_public(&mut self) -> bool {
        self.is_public = !self.is_public;
        self.updated_at = Utc::now();
        self.is_public
    }
}
