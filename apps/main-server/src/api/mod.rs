//! API endpoints.

pub mod auth;
pub mod event;
pub mod rsvp;
pub mod user;

use axum::{
    Router,
    routing::{get, post},
};
use event_store::EventStore;

use crate::state::SharedState;

/// Creates the API router with all endpoints.
pub fn create_router<S: EventStore + 'static>() -> Router<SharedState<S>> {
    Router::new()
        // Auth endpoints
        .route("/auth/register", post(auth::register::<S>))
        .route("/auth/token", post(auth::obtain_token::<S>))
        .route("/auth/token/refresh", post(auth::refresh_token::<S>))
        .route("/auth/me", get(auth::get_current_user::<S>))
        // Event endpoints
        .route(
            "/events",
            get(event::list_events::<S>).post(event::create_event::<S>),
        )
        .route(
            "/events/:id",
            get(event::get_event::<S>)
                .put(event::update_event::<S>)
                .patch(event::patch_event::<S>)
                .delete(event::delete_event::<S>),
        )
        .route("/events/:id/toggle_public", post(event::toggle_public::<S>))
        // RSVP endpoints
        .route(
            "/rsvps",
            get(rsvp::list_rsvps::<S>).post(rsvp::create_rsvp::<S>),
        )
        .route(
            "/rsvps/:id",
            get(rsvp::get_rsvp::<S>)
                .put(rsvp::update_rsvp::<S>)
                .patch(rsvp::patch_rsvp::<S>)
                .delete(rsvp::delete_rsvp::<S>),
        )
        // User administration endpoints
        .route(
            "/users",
            get(user::list_users::<S>).post(user::create_user::<S>),
        )
        .route(
            "/users/:id",
            get(user::get_user::<S>)
                .put(user::update_user::<S>)
                .patch(user::patch_user::<S>)
                .delete(user::delete_user::<S>),
        )
        // Health check
        .route("/health", get(health_check))
}

/// Health check endpoint.
async fn health_check() -> &'static str {
    "OK"
}
