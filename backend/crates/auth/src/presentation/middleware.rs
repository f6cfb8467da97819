//! Auth Middleware
//!
//! Session gates for routes outside the auth router. Both read the
//! signed session cookie only; no database round trip.

use axum::body::Body;
use axum::extract::{FromRequestParts, State};
use axum::http::Request;
use axum::http::request::Parts;
use axum::middleware::Next;
use axum::response::Response;
use std::sync::Arc;

use crate::application::session_store::SessionStore;
use crate::domain::entity::session::SessionState;
use crate::domain::value_object::user_id::UserId;
use crate::error::AuthError;

/// Session of the current request, set by [`check_auth_session`]
#[derive(Debug, Clone, Copy)]
pub struct CurrentSession(pub SessionState);

/// Authenticated user, set by [`require_auth_session`]
#[derive(Debug, Clone, Copy)]
pub struct CurrentUser(pub UserId);

/// Middleware that requires an authenticated session (401 otherwise)
pub async fn require_auth_session(
    State(sessions): State<Arc<SessionStore>>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AuthError> {
    let session = sessions.load(req.headers());
    let user_id = session.user_id().ok_or(AuthError::Unauthenticated)?;

    req.extensions_mut().insert(CurrentSession(session));
    req.extensions_mut().insert(CurrentUser(user_id));

    Ok(next.run(req).await)
}

/// Middleware that checks the session but doesn't require it
pub async fn check_auth_session(
    State(sessions): State<Arc<SessionStore>>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let session = sessions.load(req.headers());
    req.extensions_mut().insert(CurrentSession(session));

    next.run(req).await
}

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentUser>()
            .copied()
            .ok_or(AuthError::Unauthenticated)
    }
}

impl<S> FromRequestParts<S> for CurrentSession
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts
            .extensions
            .get::<CurrentSession>()
            .copied()
            .unwrap_or(CurrentSession(SessionState::anonymous())))
    }
}
