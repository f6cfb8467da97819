//! Server Configuration
//!
//! Reads the process environment (after `.env` is loaded) into typed
//! settings for the server and the auth crate.

use anyhow::{Context, bail};
use auth::AuthConfig;
use base64::Engine;
use base64::engine::general_purpose;
use platform::secret::SecretString;
use std::time::Duration;

const DEFAULT_PORT: u16 = 31113;
const DEFAULT_FRONTEND_ORIGINS: &str = "http://localhost:40922,http://127.0.0.1:40922";
/// Upper bound for `AUTH_MAX_AGE` (400 days, the longest cookie lifetime browsers honor)
const MAX_SESSION_AGE_SECS: u64 = 400 * 24 * 3600;

/// Google OAuth client credentials
#[derive(Debug, Clone)]
pub struct GoogleCredentials {
    pub client_id: String,
    pub client_secret: SecretString,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub database_url: String,
    pub port: u16,
    pub frontend_origins: Vec<String>,
    pub google: GoogleCredentials,
    pub auth: AuthConfig,
}

impl ServerConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let database_url = get("DATABASE_URL").context("DATABASE_URL must be set")?;

        let port = match get("SERVER_PORT") {
            Some(raw) => raw
                .trim()
                .parse()
                .with_context(|| format!("SERVER_PORT is not a port: {raw}"))?,
            None => DEFAULT_PORT,
        };

        let frontend_origins = get("FRONTEND_ORIGINS")
            .unwrap_or_else(|| DEFAULT_FRONTEND_ORIGINS.to_string())
            .split(',')
            .map(|origin| origin.trim().to_string())
            .filter(|origin| !origin.is_empty())
            .collect();

        let google = GoogleCredentials {
            client_id: get("GOOGLE_CLIENT_ID").context("GOOGLE_CLIENT_ID must be set")?,
            client_secret: SecretString::new(
                get("GOOGLE_CLIENT_SECRET").context("GOOGLE_CLIENT_SECRET must be set")?,
            ),
        };

        let auth = auth_config(&get)?;

        Ok(Self {
            database_url,
            port,
            frontend_origins,
            google,
            auth,
        })
    }
}

fn auth_config(get: &impl Fn(&str) -> Option<String>) -> anyhow::Result<AuthConfig> {
    let protocol = get("PROTOCOL").unwrap_or_else(|| "http".to_string());
    let domain = get("DOMAIN").unwrap_or_else(|| "localhost".to_string());

    let mut config = match get("SECRET_KEY") {
        Some(secret_b64) => AuthConfig {
            session_secret: decode_secret(&secret_b64)?,
            ..AuthConfig::default()
        },
        None if cfg!(debug_assertions) => {
            tracing::warn!("SECRET_KEY not set, using a random session secret");
            AuthConfig::development()
        }
        None => bail!("SECRET_KEY must be set in production"),
    };

    config.base_url = AuthConfig::base_url_from(&protocol, &domain);
    config.cookie_secure = protocol.eq_ignore_ascii_case("https");

    if let Some(raw) = get("AUTH_MAX_AGE") {
        let secs: u64 = raw
            .trim()
            .parse()
            .with_context(|| format!("AUTH_MAX_AGE is not a number of seconds: {raw}"))?;
        if secs > MAX_SESSION_AGE_SECS {
            bail!("AUTH_MAX_AGE must be at most {MAX_SESSION_AGE_SECS} seconds, got {secs}");
        }
        config.session_max_age = Duration::from_secs(secs);
    }

    Ok(config)
}

/// Base64 (standard alphabet) 32-byte key
fn decode_secret(secret_b64: &str) -> anyhow::Result<[u8; 32]> {
    let bytes = general_purpose::STANDARD
        .decode(secret_b64.trim())
        .context("SECRET_KEY is not valid base64")?;

    bytes
        .try_into()
        .map_err(|bytes: Vec<u8>| anyhow::anyhow!("SECRET_KEY must be 32 bytes, got {}", bytes.len()))
}
