//! Auth (Authentication) Backend Module
//!
//! Clean Architecture structure:
//! - `domain/` - Entities, value objects, repository and provider traits
//! - `application/` - Auth flow, identity reconciliation, session codec
//! - `infra/` - PostgreSQL repository and OIDC provider client
//! - `presentation/` - HTTP handlers, DTOs, router, middleware
//!
//! ## Features
//! - Login through external identity providers (Google preset)
//! - One local user per email, linked to each provider at most once
//! - Signed-cookie sessions; no server-side session table
//!
//! ## Security Model
//! - Authorization-code flow with PKCE (S256) and a `state` check
//! - Handshake and session cookies HMAC-SHA256 signed, HttpOnly
//! - Provider identity tokens stored only as SHA-256 digests

pub mod application;
pub mod domain;
pub mod error;
pub mod infra;
pub mod presentation;

#[cfg(test)]
mod tests;

// Re-exports for convenience
pub use application::config::AuthConfig;
pub use application::session_store::SessionStore;
pub use domain::provider::{IdentityProvider, ProviderRegistry};
pub use domain::value_object::provider_name::ProviderName;
pub use error::{AuthError, AuthResult};
pub use infra::oidc::{OidcConfig, OidcProvider};
pub use infra::postgres::PgAuthRepository;
pub use presentation::router::auth_router;

// Re-export kernel error types for unified error handling
pub use kernel::error::{
    app_error::{AppError, AppResult},
    kind::ErrorKind,
};

// Convenience re-exports
pub mod config {
    pub use crate::application::config::*;
}

pub mod models {
    pub use crate::domain::entity::*;
    pub use crate::domain::value_object::*;
    pub use crate::presentation::dto::*;
}

pub mod handlers {
    pub use crate::presentation::handlers::*;
}

pub mod router {
    pub use crate::presentation::router::*;
}

pub mod middleware {
    pub use crate::presentation::middleware::*;
}
