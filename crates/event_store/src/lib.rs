//! Storage for users, events and RSVPs.
//!
//! This crate provides the [`EventStore`] abstraction together with an
//! in-memory implementation (tests and ephemeral deployments) and a SQLite
//! implementation backed by sqlx. Both enforce the same integrity rules:
//! unique usernames, one RSVP per (event, user) pair, and cascading deletes
//! from users to events to RSVPs.

mod error;
mod memory;
mod sqlite;
mod traits;

pub use error::*;
pub use memory::*;
pub use sqlite::*;
pub use traits::*;
