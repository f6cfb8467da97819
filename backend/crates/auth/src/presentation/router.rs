//! Auth Router

use axum::{Router, routing::get};
use std::sync::Arc;

use crate::application::{AuthConfig, AuthFlowController};
use crate::domain::provider::{IdentityProvider, ProviderRegistry};
use crate::domain::repository::{OAuthIdentityRepository, UserRepository};
use crate::infra::postgres::PgAuthRepository;
use crate::presentation::handlers::{self, AuthAppState};

/// Create the Auth router with PostgreSQL repository
pub fn auth_router<P>(
    repo: PgAuthRepository,
    providers: ProviderRegistry<P>,
    config: AuthConfig,
) -> Router
where
    P: IdentityProvider + Send + Sync + 'static,
{
    auth_router_generic(repo, providers, config)
}

/// Create a generic Auth router for any repository implementation
pub fn auth_router_generic<R, P>(
    repo: R,
    providers: ProviderRegistry<P>,
    config: AuthConfig,
) -> Router
where
    R: UserRepository + OAuthIdentityRepository + Send + Sync + 'static,
    P: IdentityProvider + Send + Sync + 'static,
{
    let repo = Arc::new(repo);
    let flow = AuthFlowController::new(
        repo.clone(),
        repo,
        Arc::new(providers),
        Arc::new(config),
    );
    let state = AuthAppState {
        flow: Arc::new(flow),
    };

    Router::new()
        .route("/session", get(handlers::session_status::<R, P>))
        .route("/{provider}", get(handlers::initiate::<R, P>))
        .route("/{provider}/callback", get(handlers::callback::<R, P>))
        .route("/{provider}/logout", get(handlers::logout::<R, P>))
        .with_state(state)
}
