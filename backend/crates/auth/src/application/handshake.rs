//! Pending Handshake
//!
//! Between Initiate and Callback the client holds the handshake's
//! `state` and PKCE verifier in a short-lived signed cookie scoped to
//! `/auth`. The callback is only accepted if it matches.

use axum::http::{HeaderMap, HeaderValue};
use chrono::Utc;
use platform::cookie::{CookieConfig, extract_cookie};
use platform::crypto::sha256;
use platform::signing::TokenSigner;
use serde::{Deserialize, Serialize};

use crate::application::config::AuthConfig;
use crate::domain::provider::AuthorizationRequest;
use crate::domain::value_object::provider_name::ProviderName;
use crate::error::{AuthError, AuthResult};

/// Handshake state carried by the client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingHandshake {
    pub provider: String,
    pub state: String,
    pub code_verifier: String,
    pub expires_at_ms: i64,
}

impl PendingHandshake {
    pub fn new(
        provider: &ProviderName,
        request: &AuthorizationRequest,
        ttl_ms: i64,
        now_ms: i64,
    ) -> Self {
        Self {
            provider: provider.as_str().to_string(),
            state: request.state.clone(),
            code_verifier: request.code_verifier.clone(),
            expires_at_ms: now_ms.saturating_add(ttl_ms),
        }
    }

    pub fn is_expired(&self, now_ms: i64) -> bool {
        self.expires_at_ms <= now_ms
    }
}

/// Query parameters the provider appends to the callback URL
#[derive(Debug, Clone, Default)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

impl CallbackParams {
    /// Check the callback against the pending handshake and return the
    /// authorization code to exchange.
    pub fn authorize<'a>(
        &'a self,
        provider: &ProviderName,
        pending: Option<&PendingHandshake>,
    ) -> AuthResult<&'a str> {
        if let Some(error) = &self.error {
            let detail = self.error_description.as_deref().unwrap_or("no description");
            return Err(AuthError::ProviderAuth(format!(
                "provider returned {error}: {detail}"
            )));
        }

        let pending = pending
            .ok_or_else(|| AuthError::ProviderAuth("no pending handshake".to_string()))?;

        if pending.provider != provider.as_str() {
            return Err(AuthError::ProviderAuth(format!(
                "handshake was started for {}",
                pending.provider
            )));
        }

        match self.state.as_deref() {
            Some(state) if state == pending.state => {}
            _ => return Err(AuthError::ProviderAuth("state mismatch".to_string())),
        }

        self.code
            .as_deref()
            .filter(|code| !code.is_empty())
            .ok_or_else(|| AuthError::ProviderAuth("missing authorization code".to_string()))
    }
}

/// Signed-cookie codec for [`PendingHandshake`]
#[derive(Debug, Clone)]
pub struct HandshakeStore {
    signer: TokenSigner,
    cookie: CookieConfig,
}

impl HandshakeStore {
    pub fn new(config: &AuthConfig) -> Self {
        // Own key, so a session cookie never verifies as a handshake
        let mut material = b"oauth-handshake:".to_vec();
        material.extend_from_slice(&config.session_secret);

        Self {
            signer: TokenSigner::new(sha256(&material)),
            cookie: config.handshake_cookie(),
        }
    }

    /// `Set-Cookie` header value carrying the pending handshake
    pub fn issue(&self, pending: &PendingHandshake) -> AuthResult<HeaderValue> {
        let json =
            serde_json::to_vec(pending).map_err(|e| AuthError::SessionPersist(e.to_string()))?;

        HeaderValue::from_str(&self.cookie.build_set_cookie(&self.signer.sign(&json)))
            .map_err(|e| AuthError::SessionPersist(e.to_string()))
    }

    /// Read a live pending handshake from the request, if any
    pub fn load(&self, headers: &HeaderMap) -> Option<PendingHandshake> {
        let token = extract_cookie(headers, &self.cookie.name)?;
        self.decode(&token, Utc::now().timestamp_millis())
    }

    pub(crate) fn decode(&self, token: &str, now_ms: i64) -> Option<PendingHandshake> {
        let bytes = self.signer.verify(token).ok()?;
        let pending: PendingHandshake = serde_json::from_slice(&bytes).ok()?;

        if pending.is_expired(now_ms) {
            tracing::debug!(provider = %pending.provider, "Pending handshake expired");
            return None;
        }

        Some(pending)
    }

    /// `Set-Cookie` header value that removes the handshake cookie
    pub fn clear(&self) -> AuthResult<HeaderValue> {
        HeaderValue::from_str(&self.cookie.build_delete_cookie())
            .map_err(|e| AuthError::SessionPersist(e.to_string()))
    }
}
