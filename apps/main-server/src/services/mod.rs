//! Application services shared by the HTTP handlers and startup.

pub mod bootstrap;
pub mod projection;
