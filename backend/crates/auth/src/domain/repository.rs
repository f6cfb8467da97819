//! Repository Traits
//!
//! Interfaces for data persistence. Implementation is in infrastructure layer.
//!
//! `create` methods must report unique-key races with the dedicated
//! conflict errors so reconciliation can re-read and retry.

use crate::domain::entity::{oauth_identity::OAuthIdentity, user::User};
use crate::domain::value_object::{
    email::Email, provider_name::ProviderName, user_id::UserId,
};
use crate::error::AuthResult;

/// User repository trait
#[trait_variant::make(UserRepository: Send)]
pub trait LocalUserRepository {
    /// Find user by normalized email
    async fn find_by_email(&self, email: &Email) -> AuthResult<Option<User>>;

    /// Find user by ID
    async fn find_by_id(&self, user_id: &UserId) -> AuthResult<Option<User>>;

    /// Create a new user. `AuthError::EmailTaken` if the email already exists.
    async fn create(&self, user: &User) -> AuthResult<()>;
}

/// OAuth identity repository trait
#[trait_variant::make(OAuthIdentityRepository: Send)]
pub trait LocalOAuthIdentityRepository {
    /// Find the link for a user at one provider
    async fn find_by_provider_and_user(
        &self,
        provider: &ProviderName,
        user_id: &UserId,
    ) -> AuthResult<Option<OAuthIdentity>>;

    /// Create a link. `AuthError::IdentityAlreadyLinked` if one exists.
    async fn create(&self, identity: &OAuthIdentity) -> AuthResult<()>;

    /// Persist a refreshed token hash
    async fn update_token_hash(&self, identity: &OAuthIdentity) -> AuthResult<()>;
}
