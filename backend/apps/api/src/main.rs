//! API Server Entry Point
//!
//! Application entry point and server initialization.
//! Uses `anyhow` for startup errors; request-level errors are the
//! auth crate's `AuthError`.

mod config;

use auth::middleware::{CurrentUser, require_auth_session};
use auth::{
    OidcConfig, OidcProvider, PgAuthRepository, ProviderName, ProviderRegistry, SessionStore,
    auth_router,
};
use axum::{
    Json, Router,
    http::{self, Method, header},
    middleware::from_fn_with_state,
    routing::get,
};
use serde::Serialize;
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{AllowHeaders, AllowMethods, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::ServerConfig;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RestrictedResponse {
    user_id: String,
}

/// GET /api/restricted
async fn restricted(CurrentUser(user_id): CurrentUser) -> Json<RestrictedResponse> {
    Json(RestrictedResponse {
        user_id: user_id.to_string(),
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "api=info,auth=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ServerConfig::from_env()?;

    // Database connection
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.database_url)
        .await?;

    tracing::info!("Connected to database");

    // Run migrations
    sqlx::migrate!("../../../database/migrations")
        .run(&pool)
        .await?;

    tracing::info!("Migrations completed");

    // Identity providers
    let google_redirect = config.auth.callback_url("google").parse()?;
    let google = OidcProvider::new(OidcConfig::google(
        config.google.client_id.clone(),
        config.google.client_secret.clone(),
        google_redirect,
    )?);
    let providers = ProviderRegistry::new().with_provider(ProviderName::new("google")?, google);

    for name in providers.names() {
        tracing::info!(provider = %name, "Identity provider enabled");
    }

    // CORS configuration
    let allowed_origins: Vec<http::HeaderValue> = config
        .frontend_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(allowed_origins)
        .allow_methods(AllowMethods::list([Method::GET, Method::OPTIONS]))
        .allow_headers(AllowHeaders::list([
            header::CONTENT_TYPE,
            header::ACCEPT,
        ]))
        .allow_credentials(true);

    // Protected API
    let sessions = Arc::new(SessionStore::new(&config.auth));
    let api = Router::new()
        .route("/api/restricted", get(restricted))
        .route_layer(from_fn_with_state(sessions, require_auth_session));

    // Build router
    let repo = PgAuthRepository::new(pool.clone());
    let app = Router::new()
        .nest("/auth", auth_router(repo, providers, config.auth.clone()))
        .merge(api)
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!(base_url = %config.auth.base_url, "Listening on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
