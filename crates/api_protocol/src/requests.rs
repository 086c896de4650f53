//! Request bodies and query strings.
//!
//! None of these types nest another record: ownership fields are taken from
//! the requester, never from the body.

use chrono::{DateTime, Utc};
use entities::{Role, RsvpStatus};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

/// Upper bound accepted for `limit` on every listing; keep in sync with the
/// `range` attributes below.
pub const MAX_PAGE_SIZE: u32 = 1000;

/// Rejects an event whose end precedes its start.
pub fn validate_time_window(
    start_time: &DateTime<Utc>,
    end_time: &DateTime<Utc>,
) -> Result<(), ValidationError> {
    if end_time < start_time {
        let mut error = ValidationError::new("time_window");
        error.message = Some("end_time must not be before start_time".into());
        return Err(error);
    }
    Ok(())
}

fn validate_event_window(request: &CreateEventRequest) -> Result<(), ValidationError> {
    validate_time_window(&request.start_time, &request.end_time)
}

/// A blank address means "no email"; anything else must be well formed.
fn validate_optional_email(email: &str) -> Result<(), ValidationError> {
    if email.is_empty() || validator::validate_email(email) {
        return Ok(());
    }
    Err(ValidationError::new("email"))
}

fn default_true() -> bool {
    true
}

// ============================================================================
// Auth Requests
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 1, max = 150))]
    pub username: String,
    #[validate(custom = "validate_optional_email")]
    pub email: Option<String>,
    #[validate(length(min = 1))]
    pub password: String,
    /// Requested role, honoured only when the server allows self-assigned roles.
    pub role: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct TokenRequest {
    #[validate(length(min = 1))]
    pub username: String,
    #[validate(length(min = 1))]
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RefreshTokenRequest {
    #[validate(length(min = 1))]
    pub refresh: String,
}

// ============================================================================
// Event Requests
// ============================================================================

/// Body of `POST /events` and `PUT /events/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[validate(schema(function = "validate_event_window"))]
pub struct CreateEventRequest {
    #[validate(length(min = 1, max = 255))]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    #[validate(length(max = 255))]
    pub location: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    #[serde(default = "default_true")]
    pub is_public: bool,
}

/// Full replacement of an event's writable fields.
pub type UpdateEventRequest = CreateEventRequest;

/// Body of `PATCH /events/{id}`. The merged time window is checked by the
/// handler once the patch is applied.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct PatchEventRequest {
    #[validate(length(min = 1, max = 255))]
    pub title: Option<String>,
    pub description: Option<String>,
    #[validate(length(max = 255))]
    pub location: Option<String>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub is_public: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct ListEventsQuery {
    pub is_public: Option<bool>,
    #[validate(length(min = 1))]
    pub search: Option<String>,
    #[validate(range(min = 1, max = 1000))]
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

// ============================================================================
// RSVP Requests
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateRsvpRequest {
    pub event_id: Uuid,
    #[serde(default)]
    pub status: RsvpStatus,
}

/// Body of `PUT /rsvps/{id}`. Only the status is writable.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct UpdateRsvpRequest {
    pub status: RsvpStatus,
}

/// Body of `PATCH /rsvps/{id}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct PatchRsvpRequest {
    pub status: Option<RsvpStatus>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct ListRsvpsQuery {
    pub event_id: Option<Uuid>,
    pub status: Option<RsvpStatus>,
    #[validate(range(min = 1, max = 1000))]
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

// ============================================================================
// User Administration Requests
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateUserRequest {
    #[validate(length(min = 1, max = 150))]
    pub username: String,
    #[validate(custom = "validate_optional_email")]
    pub email: Option<String>,
    #[validate(length(min = 1))]
    pub password: String,
    #[serde(default)]
    pub role: Role,
}

/// Body of `PUT /users/{id}`. A missing password keeps the current one.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct UpdateUserRequest {
    #[validate(length(min = 1, max = 150))]
    pub username: String,
    #[validate(custom = "validate_optional_email")]
    pub email: Option<String>,
    #[validate(length(min = 1))]
    pub password: Option<String>,
    #[serde(default)]
    pub role: Role,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct PatchUserRequest {
    #[validate(length(min = 1, max = 150))]
    pub username: Option<String>,
    #[validate(custom = "validate_optional_email")]
    pub email: Option<String>,
    #[validate(length(min = 1))]
    pub password: Option<String>,
    pub role: Option<Role>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct ListUsersQuery {
    pub role: Option<Role>,
    #[validate(length(min = 1))]
    pub search: Option<String>,
    #[validate(range(min = 1, max = 1000))]
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    fn event_request(start: DateTime<Utc>, end: DateTime<Utc>) -> CreateEventRequest {
        CreateEventRequest {
            title: "Meetup".to_string(),
            description: String::new(),
            location: "Room 1".to_string(),
            start_time: start,
            end_time: end,
            is_public: true,
        }
    }

    #[test]
    fn test_event_request_defaults() {
        let request: CreateEventRequest = serde_json::from_value(serde_json::json!({
            "title": "Meetup",
            "start_time": "2026-05-01T18:00:00Z",
            "end_time": "2026-05-01T20:00:00Z",
        }))
        .unwrap();

        assert!(request.is_public);
        assert!(request.location.is_empty());
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_event_request_rejects_inverted_window() {
        let start = Utc::now();
        let request = event_request(start, start - Duration::minutes(1));
        assert!(request.validate().is_err());

        assert!(event_request(start, start).validate().is_ok());
    }

    #[test]
    fn test_event_request_rejects_empty_title() {
        let start = Utc::now();
        let mut request = event_request(start, start);
        request.title.clear();
        assert!(request.validate().is_err());

        request.title = "x".repeat(256);
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_register_request_validates_email() {
        let request = RegisterRequest {
            username: "alice".to_string(),
            email: Some("not-an-email".to_string()),
            password: "pw".to_string(),
            role: None,
        };
        assert!(request.validate().is_err());

        let request = RegisterRequest {
            email: None,
            ..request
        };
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_blank_email_is_accepted() {
        let request: RegisterRequest = serde_json::from_value(serde_json::json!({
            "username": "bob",
            "email": "",
            "password": "pw",
        }))
        .unwrap();
        assert!(request.validate().is_ok());

        let patch = PatchUserRequest {
            email: Some(String::new()),
            ..Default::default()
        };
        assert!(patch.validate().is_ok());

        let patch = PatchUserRequest {
            email: Some("bob@".to_string()),
            ..Default::default()
        };
        assert!(patch.validate().is_err());
    }

    #[test]
    fn test_rsvp_request_accepts_short_not_status() {
        let request: CreateRsvpRequest = serde_json::from_value(serde_json::json!({
            "event_id": Uuid::nil(),
            "status": "not",
        }))
        .unwrap();
        assert_eq!(request.status, RsvpStatus::NotGoing);

        let request: CreateRsvpRequest =
            serde_json::from_value(serde_json::json!({ "event_id": Uuid::nil() })).unwrap();
        assert_eq!(request.status, RsvpStatus::Going);
    }

    #[test]
    fn test_list_query_limit_bounds() {
        let query = ListEventsQuery {
            limit: Some(0),
            ..Default::default()
        };
        assert!(query.validate().is_err());

        let query = ListEventsQuery {
            limit: Some(MAX_PAGE_SIZE),
            ..Default::default()
        };
        assert!(query.validate().is_ok());
    }
}
