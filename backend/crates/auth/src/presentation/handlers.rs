//! HTTP Handlers

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use std::sync::Arc;

use crate::application::{AuthFlowController, CallbackParams, InitiateOutcome};
use crate::domain::provider::IdentityProvider;
use crate::domain::repository::{OAuthIdentityRepository, UserRepository};
use crate::error::{AuthError, AuthResult};
use crate::presentation::dto::{CallbackQuery, SessionStatusResponse};

/// Shared state for auth handlers
pub struct AuthAppState<R, P>
where
    R: UserRepository + OAuthIdentityRepository + Send + Sync + 'static,
    P: IdentityProvider + Send + Sync + 'static,
{
    pub flow: Arc<AuthFlowController<R, R, P>>,
}

impl<R, P> Clone for AuthAppState<R, P>
where
    R: UserRepository + OAuthIdentityRepository + Send + Sync + 'static,
    P: IdentityProvider + Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            flow: self.flow.clone(),
        }
    }
}

/// 302 to `location`, appending one `Set-Cookie` per cookie
fn redirect_with_cookies(
    location: &str,
    cookies: Vec<HeaderValue>,
) -> AuthResult<Response> {
    let location = HeaderValue::from_str(location)
        .map_err(|e| AuthError::Internal(format!("Invalid redirect target: {e}")))?;

    let mut response = StatusCode::FOUND.into_response();
    let headers = response.headers_mut();
    headers.insert(header::LOCATION, location);
    for cookie in cookies {
        headers.append(header::SET_COOKIE, cookie);
    }

    Ok(response)
}

// ============================================================================
// Initiate
// ============================================================================

/// GET /auth/{provider}
pub async fn initiate<R, P>(
    State(state): State<AuthAppState<R, P>>,
    Path(provider): Path<String>,
    headers: HeaderMap,
) -> AuthResult<Response>
where
    R: UserRepository + OAuthIdentityRepository + Send + Sync + 'static,
    P: IdentityProvider + Send + Sync + 'static,
{
    let session = state.flow.sessions().load(&headers);

    match state.flow.initiate(&provider, &session).await? {
        InitiateOutcome::AlreadyAuthenticated { redirect_to } => {
            redirect_with_cookies(&redirect_to, vec![])
        }
        InitiateOutcome::BeginHandshake {
            redirect_to,
            handshake_cookie,
        } => redirect_with_cookies(&redirect_to, vec![handshake_cookie]),
    }
}

// ============================================================================
// Callback
// ============================================================================

/// GET /auth/{provider}/callback
pub async fn callback<R, P>(
    State(state): State<AuthAppState<R, P>>,
    Path(provider): Path<String>,
    Query(query): Query<CallbackQuery>,
    headers: HeaderMap,
) -> AuthResult<Response>
where
    R: UserRepository + OAuthIdentityRepository + Send + Sync + 'static,
    P: IdentityProvider + Send + Sync + 'static,
{
    let pending = state.flow.handshakes().load(&headers);
    let params = CallbackParams::from(query);

    let assertion = state
        .flow
        .verify_callback(&provider, &params, pending.as_ref())
        .await?;

    let output = state.flow.callback(assertion).await?;

    redirect_with_cookies(
        &output.redirect_to,
        vec![output.session_cookie, output.clear_handshake_cookie],
    )
}

// ============================================================================
// Logout
// ============================================================================

/// GET /auth/{provider}/logout
pub async fn logout<R, P>(
    State(state): State<AuthAppState<R, P>>,
    Path(provider): Path<String>,
    headers: HeaderMap,
) -> AuthResult<Response>
where
    R: UserRepository + OAuthIdentityRepository + Send + Sync + 'static,
    P: IdentityProvider + Send + Sync + 'static,
{
    let session = state.flow.sessions().load(&headers);
    let output = state.flow.logout(&provider, &session).await?;

    match output.session_cookie {
        Ok(session_cookie) => redirect_with_cookies(
            &output.redirect_to,
            vec![session_cookie, output.clear_handshake_cookie],
        ),
        Err(e) => {
            let mut response = e.into_response();
            response
                .headers_mut()
                .append(header::SET_COOKIE, output.clear_handshake_cookie);
            Ok(response)
        }
    }
}

// ============================================================================
// Session Status
// ============================================================================

/// GET /auth/session
pub async fn session_status<R, P>(
    State(state): State<AuthAppState<R, P>>,
    headers: HeaderMap,
) -> Json<SessionStatusResponse>
where
    R: UserRepository + OAuthIdentityRepository + Send + Sync + 'static,
    P: IdentityProvider + Send + Sync + 'static,
{
    Json(state.flow.sessions().load(&headers).into())
}
