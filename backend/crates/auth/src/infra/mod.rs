//! Infrastructure Layer
//!
//! PostgreSQL repositories and the OIDC identity provider client.

pub mod oidc;
pub mod postgres;

pub use oidc::{OidcConfig, OidcProvider};
pub use postgres::PgAuthRepository;
