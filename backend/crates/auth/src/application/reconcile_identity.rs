//! Reconcile Identity Use Case
//!
//! Maps a verified remote identity onto exactly one local user and one
//! (provider, user) link:
//!
//! 1. Find the user by email, or create it.
//! 2. Find the link for (provider, user), refreshing its token hash, or
//!    create it.
//!
//! Concurrent callbacks for the same email race on the unique keys.
//! The loser sees `EmailTaken` or `IdentityAlreadyLinked`, re-reads and
//! converges on the winner's rows. Every step is idempotent on retry.

use std::sync::Arc;

use crate::application::config::AuthConfig;
use crate::domain::entity::{oauth_identity::OAuthIdentity, user::User};
use crate::domain::repository::{OAuthIdentityRepository, UserRepository};
use crate::domain::value_object::{
    email::Email, identity_token::TokenHash, provider_name::ProviderName,
};
use crate::error::{AuthError, AuthResult};

/// Reconcile input
#[derive(Debug, Clone)]
pub struct ReconcileInput {
    pub provider: ProviderName,
    pub email: Email,
    pub token_hash: TokenHash,
    pub display_name: Option<String>,
}

/// Reconcile output
#[derive(Debug, Clone)]
pub struct ReconcileOutput {
    pub user: User,
    pub identity: OAuthIdentity,
    pub user_created: bool,
    pub identity_created: bool,
}

/// Reconcile identity use case
pub struct ReconcileIdentityUseCase<U, I>
where
    U: UserRepository + Send + Sync + 'static,
    I: OAuthIdentityRepository + Send + Sync + 'static,
{
    user_repo: Arc<U>,
    identity_repo: Arc<I>,
    config: Arc<AuthConfig>,
}

impl<U, I> ReconcileIdentityUseCase<U, I>
where
    U: UserRepository + Send + Sync + 'static,
    I: OAuthIdentityRepository + Send + Sync + 'static,
{
    pub fn new(user_repo: Arc<U>, identity_repo: Arc<I>, config: Arc<AuthConfig>) -> Self {
        Self {
            user_repo,
            identity_repo,
            config,
        }
    }

    pub async fn execute(&self, input: ReconcileInput) -> AuthResult<ReconcileOutput> {
        let max_attempts = self.config.reconcile_max_attempts.max(1);

        for attempt in 1..=max_attempts {
            match self.reconcile_once(&input).await {
                Ok(output) => {
                    tracing::info!(
                        user_id = %output.user.user_id,
                        provider = %input.provider,
                        user_created = output.user_created,
                        identity_created = output.identity_created,
                        attempt = attempt,
                        "Identity reconciled"
                    );
                    return Ok(output);
                }
                Err(e) if e.is_reconcile_conflict() => {
                    tracing::debug!(
                        error = %e,
                        provider = %input.provider,
                        attempt = attempt,
                        "Lost reconciliation race, retrying"
                    );
                }
                Err(e) => return Err(e),
            }
        }

        Err(AuthError::UserCreationConflict {
            attempts: max_attempts,
        })
    }

    async fn reconcile_once(&self, input: &ReconcileInput) -> AuthResult<ReconcileOutput> {
        let (user, user_created) = match self.user_repo.find_by_email(&input.email).await? {
            Some(user) => (user, false),
            None => {
                let user = User::new(input.email.clone(), input.display_name.clone());
                self.user_repo.create(&user).await?;
                (user, true)
            }
        };

        let existing = self
            .identity_repo
            .find_by_provider_and_user(&input.provider, &user.user_id)
            .await?;

        let (identity, identity_created) = match existing {
            Some(mut identity) => {
                identity.refresh_token_hash(input.token_hash.clone());
                self.identity_repo.update_token_hash(&identity).await?;
                (identity, false)
            }
            None => {
                let identity = OAuthIdentity::new(
                    input.provider.clone(),
                    user.user_id,
                    input.token_hash.clone(),
                );
                self.identity_repo.create(&identity).await?;
                (identity, true)
            }
        };

        Ok(ReconcileOutput {
            user,
            identity,
            user_created,
            identity_created,
        })
    }
}
