//! Auth Error Types
//!
//! This module provides auth-specific error variants that integrate
//! with the unified `kernel::error::AppError` system.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use kernel::error::{app_error::AppError, kind::ErrorKind};
use thiserror::Error;

/// Auth-specific result type alias
pub type AuthResult<T> = Result<T, AuthError>;

/// Auth-specific error variants
#[derive(Debug, Error)]
pub enum AuthError {
    /// Provider path parameter is not in the configured allow-list
    #[error("Unknown identity provider: {0}")]
    UnknownProvider(String),

    /// Remote verification failed or the user cancelled at the provider
    #[error("Identity provider authentication failed: {0}")]
    ProviderAuth(String),

    /// Durable-store read or write failed
    #[error("Identity store error: {0}")]
    IdentityLookup(#[from] sqlx::Error),

    /// Racing user creation could not be settled within the retry budget
    #[error("User creation conflict after {attempts} attempts")]
    UserCreationConflict { attempts: u32 },

    /// Session could not be encoded or signed
    #[error("Session could not be persisted: {0}")]
    SessionPersist(String),

    /// Unique violation on `users.email`; retried by reconciliation
    #[error("Email already belongs to another user")]
    EmailTaken,

    /// Unique violation on `(provider, user_id)`; retried by reconciliation
    #[error("Identity already linked for this provider")]
    IdentityAlreadyLinked,

    /// Protected resource requested without an authenticated session
    #[error("Not authenticated")]
    Unauthenticated,

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AuthError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::UnknownProvider(_) => StatusCode::BAD_REQUEST,
            AuthError::ProviderAuth(_) => StatusCode::BAD_GATEWAY,
            AuthError::Unauthenticated => StatusCode::UNAUTHORIZED,
            AuthError::IdentityLookup(_)
            | AuthError::UserCreationConflict { .. }
            | AuthError::SessionPersist(_)
            | AuthError::EmailTaken
            | AuthError::IdentityAlreadyLinked
            | AuthError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the ErrorKind for this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            AuthError::UnknownProvider(_) => ErrorKind::BadRequest,
            AuthError::ProviderAuth(_) => ErrorKind::BadGateway,
            AuthError::Unauthenticated => ErrorKind::Unauthorized,
            AuthError::EmailTaken | AuthError::IdentityAlreadyLinked => ErrorKind::Conflict,
            AuthError::IdentityLookup(_)
            | AuthError::UserCreationConflict { .. }
            | AuthError::SessionPersist(_)
            | AuthError::Internal(_) => ErrorKind::InternalServerError,
        }
    }

    /// Whether this is a unique-key race that reconciliation may retry
    pub fn is_reconcile_conflict(&self) -> bool {
        matches!(self, AuthError::EmailTaken | AuthError::IdentityAlreadyLinked)
    }

    /// Convert to AppError
    pub fn to_app_error(&self) -> AppError {
        AppError::new(self.kind(), self.to_string())
    }

    /// Log the error with appropriate level
    fn log(&self) {
        match self {
            AuthError::IdentityLookup(e) => {
                tracing::error!(error = %e, "Identity store error");
            }
            AuthError::UserCreationConflict { attempts } => {
                tracing::error!(attempts = attempts, "User creation conflict not settled");
            }
            AuthError::SessionPersist(msg) => {
                tracing::error!(message = %msg, "Session persist failed");
            }
            AuthError::Internal(msg) => {
                tracing::error!(message = %msg, "Auth internal error");
            }
            AuthError::ProviderAuth(msg) => {
                tracing::warn!(message = %msg, "Provider authentication failed");
            }
            AuthError::EmailTaken | AuthError::IdentityAlreadyLinked => {
                tracing::error!(error = %self, "Unhandled reconciliation conflict");
            }
            _ => {
                tracing::debug!(error = %self, "Auth error");
            }
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        self.log();
        // Status only; internal detail never reaches the client
        (self.status_code(), ()).into_response()
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        err.to_app_error()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    #[tokio::test]
    async fn test_error_responses_have_status_and_no_body() {
        let cases: Vec<(AuthError, StatusCode)> = vec![
            (AuthError::UnknownProvider("myspace".into()), StatusCode::BAD_REQUEST),
            (AuthError::ProviderAuth("access_denied".into()), StatusCode::BAD_GATEWAY),
            (AuthError::IdentityLookup(sqlx::Error::PoolTimedOut), StatusCode::INTERNAL_SERVER_ERROR),
            (AuthError::UserCreationConflict { attempts: 3 }, StatusCode::INTERNAL_SERVER_ERROR),
            (AuthError::SessionPersist("encode".into()), StatusCode::INTERNAL_SERVER_ERROR),
            (AuthError::Unauthenticated, StatusCode::UNAUTHORIZED),
        ];

        for (error, expected) in cases {
            let response = error.into_response();
            assert_eq!(response.status(), expected);
            let body = to_bytes(response.into_body(), 1024).await.unwrap();
            assert!(body.is_empty());
        }
    }

    #[test]
    fn test_kind_matches_status() {
        let err = AuthError::ProviderAuth("timeout".into());
        assert_eq!(err.kind().status_code(), err.status_code().as_u16());

        let app: AppError = AuthError::UnknownProvider("x".into()).into();
        assert_eq!(app.status_code(), 400);
    }

    #[test]
    fn test_reconcile_conflicts() {
        assert!(AuthError::EmailTaken.is_reconcile_conflict());
        assert!(AuthError::IdentityAlreadyLinked.is_reconcile_conflict());
        assert!(!AuthError::UserCreationConflict { attempts: 1 }.is_reconcile_conflict());
    }
}
