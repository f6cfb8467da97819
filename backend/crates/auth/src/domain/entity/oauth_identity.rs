//! OAuth Identity Entity
//!
//! Link between a local user and one identity provider. At most one
//! link exists per (provider, user).

use chrono::{DateTime, Utc};

use crate::domain::value_object::{
    identity_token::TokenHash,
    provider_name::ProviderName,
    user_id::{OAuthIdentityId, UserId},
};

/// OAuth identity entity
#[derive(Debug, Clone)]
pub struct OAuthIdentity {
    pub identity_id: OAuthIdentityId,
    pub provider: ProviderName,
    pub user_id: UserId,
    /// Digest of the most recently asserted identity token
    pub token_hash: TokenHash,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl OAuthIdentity {
    /// Link a user to a provider
    pub fn new(provider: ProviderName, user_id: UserId, token_hash: TokenHash) -> Self {
        let now = Utc::now();

        Self {
            identity_id: OAuthIdentityId::new(),
            provider,
            user_id,
            token_hash,
            created_at: now,
            updated_at: now,
        }
    }

    /// Replace the stored digest after a fresh login
    pub fn refresh_token_hash(&mut self, token_hash: TokenHash) {
        self.token_hash = token_hash;
        self.updated_at = Utc::now();
    }
}
