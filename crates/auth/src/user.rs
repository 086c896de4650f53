//! Requester identity.

use entities::{Role, User};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The authenticated identity attached to a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Requester {
    /// User ID.
    pub id: Uuid,
    /// Username.
    pub username: String,
    /// Current role.
    pub role: Role,
}

impl Requester {
    /// Creates a requester.
    pub fn new(id: Uuid, username: impl Into<String>, role: Role) -> Self {
        Self {
            id,
            username: username.into(),
            role,
        }
    }
}

impl From<&User> for Requester {
    fn from(user: &User) -> Self {
        Self::new(user.id, user.username.clone(), user.role)
    }
}
