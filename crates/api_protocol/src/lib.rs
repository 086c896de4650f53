//! HTTP protocol definitions for the event manager API.
//!
//! This crate defines the JSON shapes exchanged between the server and its
//! clients. Input types (`requests`) never nest other records; read
//! projections (`types`) embed the records they reference.

mod error;
pub mod requests;
pub mod responses;
mod types;

pub use error::*;
pub use types::*;
