//! Error body shared by every failing response.

use serde::{Deserialize, Serialize};

/// Machine-readable error codes carried in `error.code`.
pub mod error_codes {
    /// No valid identity was presented.
    pub const AUTHENTICATION_REQUIRED: &str = "authentication_required";
    /// The identity lacks the required role or ownership.
    pub const PERMISSION_DENIED: &str = "permission_denied";
    /// The record does not exist or is outside the requester's scope.
    pub const NOT_FOUND: &str = "not_found";
    /// Malformed or missing fields.
    pub const INVALID_REQUEST: &str = "invalid_request";
    /// Uniqueness violation.
    pub const CONFLICT: &str = "conflict";
    /// Unexpected server-side failure.
    pub const INTERNAL_ERROR: &str = "internal_error";
}

/// `{ "error": { "code": ..., "message": ... } }`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
}

impl ErrorBody {
    /// Creates an error body.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: ErrorDetail {
                code: code.into(),
                message: message.into(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_body_shape() {
        let body = ErrorBody::new(error_codes::CONFLICT, "RSVP already exists");
        let json = serde_json::to_value(&body).unwrap();

        assert_eq!(json["error"]["code"], "conflict");
        assert_eq!(json["error"]["message"], "RSVP already exists");
    }
}
