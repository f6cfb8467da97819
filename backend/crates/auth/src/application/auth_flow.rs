//! Auth Flow Controller
//!
//! Drives the three browser-facing operations:
//!
//! - `initiate`: short-circuit when already signed in, else start the
//!   provider handshake.
//! - `callback`: verify the provider's answer, reconcile the identity
//!   and mark the session authenticated.
//! - `logout`: clear the session and end provider-side state.

use axum::http::HeaderValue;
use chrono::Utc;
use std::sync::Arc;

use crate::application::config::AuthConfig;
use crate::application::handshake::{CallbackParams, HandshakeStore, PendingHandshake};
use crate::application::reconcile_identity::{ReconcileIdentityUseCase, ReconcileInput};
use crate::application::session_store::SessionStore;
use crate::domain::entity::session::SessionState;
use crate::domain::provider::{IdentityProvider, ProviderRegistry, RemoteIdentityAssertion};
use crate::domain::repository::{OAuthIdentityRepository, UserRepository};
use crate::domain::value_object::{identity_token::TokenHasher, user_id::UserId};
use crate::error::{AuthError, AuthResult};

/// Result of starting a login
#[derive(Debug, Clone)]
pub enum InitiateOutcome {
    /// Session already authenticated; no provider round trip
    AlreadyAuthenticated { redirect_to: String },
    /// Send the client to the provider with the pending handshake cookie
    BeginHandshake {
        redirect_to: String,
        handshake_cookie: HeaderValue,
    },
}

/// Result of a completed login
#[derive(Debug, Clone)]
pub struct CallbackOutput {
    pub session: SessionState,
    pub user_id: UserId,
    pub user_created: bool,
    pub session_cookie: HeaderValue,
    pub clear_handshake_cookie: HeaderValue,
    pub redirect_to: String,
}

/// Result of a logout
#[derive(Debug)]
pub struct LogoutOutput {
    /// Anonymous session cookie, or the `SessionPersist` error
    pub session_cookie: AuthResult<HeaderValue>,
    pub clear_handshake_cookie: HeaderValue,
    pub redirect_to: String,
    /// False when the provider-side cleanup reported an error
    pub provider_session_ended: bool,
}

/// Login/logout orchestration over a provider registry
pub struct AuthFlowController<U, I, P>
where
    U: UserRepository + Send + Sync + 'static,
    I: OAuthIdentityRepository + Send + Sync + 'static,
    P: IdentityProvider + Send + Sync + 'static,
{
    user_repo: Arc<U>,
    reconcile: ReconcileIdentityUseCase<U, I>,
    providers: Arc<ProviderRegistry<P>>,
    sessions: SessionStore,
    handshakes: HandshakeStore,
    config: Arc<AuthConfig>,
}

impl<U, I, P> AuthFlowController<U, I, P>
where
    U: UserRepository + Send + Sync + 'static,
    I: OAuthIdentityRepository + Send + Sync + 'static,
    P: IdentityProvider + Send + Sync + 'static,
{
    pub fn new(
        user_repo: Arc<U>,
        identity_repo: Arc<I>,
        providers: Arc<ProviderRegistry<P>>,
        config: Arc<AuthConfig>,
    ) -> Self {
        Self {
            reconcile: ReconcileIdentityUseCase::new(
                user_repo.clone(),
                identity_repo,
                config.clone(),
            ),
            user_repo,
            providers,
            sessions: SessionStore::new(&config),
            handshakes: HandshakeStore::new(&config),
            config,
        }
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    pub fn handshakes(&self) -> &HandshakeStore {
        &self.handshakes
    }

    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    /// Start a login with `provider`
    pub async fn initiate(
        &self,
        provider: &str,
        session: &SessionState,
    ) -> AuthResult<InitiateOutcome> {
        let (provider_name, provider) = self.providers.resolve(provider)?;

        if let Some(user_id) = session.user_id() {
            if self.session_user_exists(&user_id).await? {
                tracing::debug!(user_id = %user_id, "Already authenticated, skipping handshake");
                return Ok(InitiateOutcome::AlreadyAuthenticated {
                    redirect_to: self.config.home_url(),
                });
            }
            tracing::info!(user_id = %user_id, "Session user no longer exists, starting handshake");
        }

        let request = provider.authorization_request();
        let pending = PendingHandshake::new(
            &provider_name,
            &request,
            self.config.handshake_ttl_ms(),
            Utc::now().timestamp_millis(),
        );
        let handshake_cookie = self.handshakes.issue(&pending)?;

        tracing::debug!(provider = %provider_name, "Handshake started");

        Ok(InitiateOutcome::BeginHandshake {
            redirect_to: request.url,
            handshake_cookie,
        })
    }

    async fn session_user_exists(&self, user_id: &UserId) -> AuthResult<bool> {
        if !self.config.revalidate_on_initiate {
            return Ok(true);
        }
        Ok(self.user_repo.find_by_id(user_id).await?.is_some())
    }

    /// Check the provider's callback and obtain the asserted identity
    pub async fn verify_callback(
        &self,
        provider: &str,
        params: &CallbackParams,
        pending: Option<&PendingHandshake>,
    ) -> AuthResult<RemoteIdentityAssertion> {
        let (provider_name, provider) = self.providers.resolve(provider)?;
        let code = params.authorize(&provider_name, pending)?;

        let code_verifier = pending
            .map(|p| p.code_verifier.as_str())
            .ok_or_else(|| AuthError::ProviderAuth("no pending handshake".to_string()))?;

        let verified = provider.exchange_code(code, code_verifier).await?;

        if verified.raw_token.is_empty() {
            return Err(AuthError::ProviderAuth("empty identity token".to_string()));
        }

        Ok(RemoteIdentityAssertion::new(provider_name, verified))
    }

    /// Complete a login from a verified assertion
    pub async fn callback(&self, assertion: RemoteIdentityAssertion) -> AuthResult<CallbackOutput> {
        let input = ReconcileInput {
            token_hash: TokenHasher::hash(&assertion.raw_token),
            provider: assertion.provider,
            email: assertion.email,
            display_name: assertion.display_name,
        };

        let output = self.reconcile.execute(input).await?;

        let session = SessionState::authenticated(output.user.user_id);
        let session_cookie = self.sessions.persist(&session)?;

        tracing::info!(
            user_id = %output.user.user_id,
            provider = %output.identity.provider,
            "Login completed"
        );

        Ok(CallbackOutput {
            session,
            user_id: output.user.user_id,
            user_created: output.user_created,
            session_cookie,
            clear_handshake_cookie: self.handshakes.clear()?,
            redirect_to: self.config.home_url(),
        })
    }

    /// Sign out. The local session is cleared before the provider is
    /// resolved, and the provider cleanup runs even when that write failed.
    /// A write failure is carried in `session_cookie`, next to the
    /// handshake cookie that must still be cleared.
    pub async fn logout(&self, provider: &str, session: &SessionState) -> AuthResult<LogoutOutput> {
        let session_cookie = self.sessions.persist(&SessionState::anonymous());
        let clear_handshake_cookie = self.handshakes.clear()?;

        let provider_session_ended = match self.providers.resolve(provider) {
            Ok((provider_name, provider)) => match provider.end_session().await {
                Ok(()) => true,
                Err(e) => {
                    tracing::warn!(
                        error = %e,
                        provider = %provider_name,
                        "Provider session cleanup failed"
                    );
                    false
                }
            },
            Err(e) => {
                tracing::warn!(error = %e, "Logout for unknown provider, local session only");
                false
            }
        };

        if session_cookie.is_ok() {
            tracing::info!(user_id = ?session.user_id(), provider_session_ended, "Logged out");
        }

        Ok(LogoutOutput {
            session_cookie,
            clear_handshake_cookie,
            redirect_to: self.config.home_url(),
            provider_session_ended,
        })
    }
}
