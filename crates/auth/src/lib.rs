//! Authentication and authorization for the event manager.
//!
//! This crate provides:
//! - JWT access/refresh token generation and validation
//! - Argon2 password hashing
//! - The authorization policy and query scoping rules

mod error;
mod jwt;
mod password;
pub mod policy;
mod user;

pub use error::*;
pub use jwt::*;
pub use password::*;
pub use user::*;

/// Default access token lifetime in minutes.
pub const DEFAULT_ACCESS_TOKEN_MINUTES: u64 = 5;

/// Default refresh token lifetime in hours.
pub const DEFAULT_REFRESH_TOKEN_HOURS: u64 = 24;

/// Longest accepted access token lifetime: one year, in minutes.
pub const MAX_ACCESS_TOKEN_MINUTES: u64 = 365 * 24 * 60;

/// Longest accepted refresh token lifetime: ten years, in hours.
pub const MAX_REFRESH_TOKEN_HOURS: u64 = 10 * 365 * 24;

/// Default JWT issuer.
pub const DEFAULT_JWT_ISSUER: &str = "event-manager";
