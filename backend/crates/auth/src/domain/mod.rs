//! Domain Layer
//!
//! Contains entities, value objects, repository traits and the
//! identity provider seam.

pub mod entity;
pub mod provider;
pub mod repository;
pub mod value_object;

// Re-exports
pub use entity::{oauth_identity::OAuthIdentity, session::SessionState, user::User};
pub use provider::{IdentityProvider, ProviderRegistry, RemoteIdentityAssertion};
pub use repository::{OAuthIdentityRepository, UserRepository};
