//! Response bodies that are not plain views.

use serde::{Deserialize, Serialize};

use crate::types::*;

/// Scheme reported in `token_type`.
pub const BEARER_TOKEN_TYPE: &str = "Bearer";

// ============================================================================
// Auth Responses
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenPairResponse {
    pub access: String,
    pub refresh: String,
    pub token_type: String,
    /// Access token lifetime in seconds.
    pub expires_in: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessTokenResponse {
    pub access: String,
    pub token_type: String,
    pub expires_in: u64,
}

// ============================================================================
// Collection Responses
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListEventsResponse {
    pub events: Vec<EventView>,
    pub total_count: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListRsvpsResponse {
    pub rsvps: Vec<RsvpView>,
    pub total_count: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListUsersResponse {
    pub users: Vec<UserView>,
    pub total_count: u32,
}

// ============================================================================
// Event Actions
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToggleVisibilityResponse {
    pub is_public: bool,
}
