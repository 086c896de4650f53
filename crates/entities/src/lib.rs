//! Core entity definitions for the event manager.
//!
//! This crate defines the records shared by every layer of the server: users
//! and their roles, events, RSVPs, and the visibility scopes that bound what a
//! given requester may see.

mod event;
mod rsvp;
mod scope;
mod user;

pub use event::*;
pub use rsvp::*;
pub use scope::*;
pub use user::*;
