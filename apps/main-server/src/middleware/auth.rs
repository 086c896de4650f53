//! Authentication middleware.

use std::convert::Infallible;

use auth::{AuthError, Requester};
use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::{IntoResponse, Response},
};
use event_store::EventStore;

use crate::error::{ServerError, ServerResult};
use crate::state::SharedState;

/// Extracts the bearer token from the Authorization header.
///
/// Returns `None` when no bearer credential was presented at all, and
/// `Some("")` for a bare `Bearer` scheme.
fn extract_token(request: &Request) -> Option<&str> {
    let value = request.headers().get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ').unwrap_or((value, ""));
    scheme.eq_ignore_ascii_case("bearer").then_some(token.trim())
}

/// Resolves a token to the current state of its user.
async fn authenticate<S: EventStore>(state: &SharedState<S>, token: &str) -> ServerResult<Requester> {
    let claims = state.jwt_manager.validate_access_token(token)?;
    let user = state
        .store
        .get_user(claims.user_id()?)
        .await?
        .ok_or(AuthError::UserNotFound)?;

    Ok(Requester::from(&user))
}

/// Authentication middleware.
///
/// A request without a bearer token proceeds anonymously. A presented token
/// must be a valid access token for an existing user, otherwise the request
/// is rejected with 401. On success the [`Requester`], built from the stored
/// user rather than the token claims, is placed in the request extensions.
pub async fn auth_middleware<S: EventStore + 'static>(
    State(state): State<SharedState<S>>,
    mut request: Request,
    next: Next,
) -> Response {
    let Some(token) = extract_token(&request).map(str::to_owned) else {
        return next.run(request).await;
    };

    match authenticate(&state, &token).await {
        Ok(requester) => {
            request.extensions_mut().insert(requester);
            next.run(request).await
        }
        Err(e) => {
            tracing::debug!(error = %e, "Rejected bearer token");
            e.into_response()
        }
    }
}

/// The authenticated requester. Rejects anonymous requests with 401.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub Requester);

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for CurrentUser {
    type Rejection = ServerError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Requester>()
            .cloned()
            .map(CurrentUser)
            .ok_or(ServerError::AuthenticationRequired)
    }
}

/// The requester, if any.
#[derive(Debug, Clone)]
pub struct MaybeUser(pub Option<Requester>);

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for MaybeUser {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(MaybeUser(parts.extensions.get::<Requester>().cloned()))
    }
}
