//! Identity Provider Seam
//!
//! Remote identity providers sit behind [`IdentityProvider`]. The
//! registry is the allow-list consulted for every `{provider}` path
//! segment; it is built once at startup and never mutated.

use std::collections::HashMap;
use std::sync::Arc;

use crate::domain::value_object::{
    email::Email, identity_token::RawIdentityToken, provider_name::ProviderName,
};
use crate::error::{AuthError, AuthResult};

/// Redirect target plus the values the callback must be checked against
#[derive(Debug, Clone)]
pub struct AuthorizationRequest {
    pub url: String,
    pub state: String,
    pub code_verifier: String,
}

/// What the provider vouched for after a successful code exchange
#[derive(Debug, Clone)]
pub struct VerifiedIdentity {
    /// Provider-side subject identifier
    pub subject: String,
    pub email: Email,
    pub raw_token: RawIdentityToken,
    pub display_name: Option<String>,
}

/// A verified identity bound to the provider that asserted it
#[derive(Debug, Clone)]
pub struct RemoteIdentityAssertion {
    pub provider: ProviderName,
    pub subject: String,
    pub email: Email,
    pub raw_token: RawIdentityToken,
    pub display_name: Option<String>,
}

impl RemoteIdentityAssertion {
    pub fn new(provider: ProviderName, verified: VerifiedIdentity) -> Self {
        Self {
            provider,
            subject: verified.subject,
            email: verified.email,
            raw_token: verified.raw_token,
            display_name: verified.display_name,
        }
    }
}

/// Identity provider trait
#[trait_variant::make(IdentityProvider: Send)]
pub trait LocalIdentityProvider {
    /// Build the redirect that starts the remote handshake
    fn authorization_request(&self) -> AuthorizationRequest;

    /// Exchange the callback code and fetch the asserted identity.
    /// Failures are `AuthError::ProviderAuth`.
    async fn exchange_code(&self, code: &str, code_verifier: &str) -> AuthResult<VerifiedIdentity>;

    /// End any provider-side state for the current client. Best effort.
    async fn end_session(&self) -> AuthResult<()>;
}

/// Immutable allow-list of configured providers
pub struct ProviderRegistry<P> {
    providers: HashMap<ProviderName, Arc<P>>,
}

impl<P> ProviderRegistry<P> {
    pub fn new() -> Self {
        Self {
            providers: HashMap::new(),
        }
    }

    /// Register a provider under `name`
    pub fn with_provider(mut self, name: ProviderName, provider: P) -> Self {
        self.providers.insert(name, Arc::new(provider));
        self
    }

    /// Resolve a raw path segment. Unknown or malformed names are
    /// `AuthError::UnknownProvider`.
    pub fn resolve(&self, name: &str) -> AuthResult<(ProviderName, Arc<P>)> {
        let unknown = || AuthError::UnknownProvider(name.chars().take(64).collect());

        let name = ProviderName::new(name).map_err(|_| unknown())?;
        let provider = self.providers.get(&name).cloned().ok_or_else(unknown)?;

        Ok((name, provider))
    }

    pub fn names(&self) -> impl Iterator<Item = &ProviderName> {
        self.providers.keys()
    }
}

impl<P> Default for ProviderRegistry<P> {
    fn default() -> Self {
        Self::new()
    }
}
