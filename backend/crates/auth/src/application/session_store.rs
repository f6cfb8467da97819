//! Session Store
//!
//! Client-held session in a signed cookie:
//! `base64url(json) "." base64url(HMAC-SHA256)` with
//! `{"authenticated", "userId", "iat", "exp"}` (epoch ms).
//!
//! Reading never fails. Anything missing, tampered with, expired or
//! inconsistent reads as an anonymous session.

use axum::http::{HeaderMap, HeaderValue};
use chrono::Utc;
use platform::cookie::{CookieConfig, extract_cookie};
use platform::signing::TokenSigner;
use serde::{Deserialize, Serialize};

use crate::application::config::AuthConfig;
use crate::domain::entity::session::SessionState;
use crate::domain::value_object::user_id::UserId;
use crate::error::{AuthError, AuthResult};

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SessionPayload {
    authenticated: bool,
    user_id: Option<String>,
    iat: i64,
    exp: i64,
}

/// Signed-cookie session codec
#[derive(Debug, Clone)]
pub struct SessionStore {
    signer: TokenSigner,
    cookie: CookieConfig,
    max_age_ms: i64,
}

impl SessionStore {
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            signer: TokenSigner::new(config.session_secret),
            cookie: config.session_cookie(),
            max_age_ms: config.session_max_age_ms(),
        }
    }

    /// Read the session carried by a request
    pub fn load(&self, headers: &HeaderMap) -> SessionState {
        extract_cookie(headers, &self.cookie.name)
            .map(|token| self.decode(&token, Utc::now().timestamp_millis()))
            .unwrap_or_default()
    }

    /// Decode a raw cookie value as of `now_ms`
    pub fn decode(&self, token: &str, now_ms: i64) -> SessionState {
        let payload = match self.signer.verify(token) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::debug!(error = %e, "Session cookie rejected");
                return SessionState::anonymous();
            }
        };

        let payload: SessionPayload = match serde_json::from_slice(&payload) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::debug!(error = %e, "Session payload unreadable");
                return SessionState::anonymous();
            }
        };

        if payload.exp <= now_ms {
            tracing::debug!(exp = payload.exp, "Session expired");
            return SessionState::anonymous();
        }

        if !payload.authenticated {
            return SessionState::anonymous();
        }

        match payload.user_id.as_deref().map(str::parse::<UserId>) {
            Some(Ok(user_id)) => SessionState::authenticated(user_id),
            _ => {
                tracing::debug!("Authenticated session without a usable user id");
                SessionState::anonymous()
            }
        }
    }

    /// Encode a session as a `Set-Cookie` header value
    pub fn persist(&self, state: &SessionState) -> AuthResult<HeaderValue> {
        self.encode(state, Utc::now().timestamp_millis())
    }

    pub(crate) fn encode(&self, state: &SessionState, now_ms: i64) -> AuthResult<HeaderValue> {
        let payload = SessionPayload {
            authenticated: state.is_authenticated(),
            user_id: state.user_id().map(|id| id.to_string()),
            iat: now_ms,
            exp: now_ms.saturating_add(self.max_age_ms),
        };

        let json =
            serde_json::to_vec(&payload).map_err(|e| AuthError::SessionPersist(e.to_string()))?;
        let token = self.signer.sign(&json);

        HeaderValue::from_str(&self.cookie.build_set_cookie(&token))
            .map_err(|e| AuthError::SessionPersist(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::header;

    fn store() -> SessionStore {
        SessionStore::new(&AuthConfig::with_random_secret())
    }

    /// Pull the cookie value out of a `Set-Cookie` header
    fn cookie_value(set_cookie: &HeaderValue) -> String {
        let raw = set_cookie.to_str().unwrap();
        let pair = raw.split(';').next().unwrap();
        pair.split_once('=').unwrap().1.to_string()
    }

    #[test]
    fn test_authenticated_session_survives_round_trip() {
        let store = store();
        let user_id = UserId::new();
        let set_cookie = store.encode(&SessionState::authenticated(user_id), 1_000).unwrap();

        let state = store.decode(&cookie_value(&set_cookie), 2_000);
        assert_eq!(state, SessionState::authenticated(user_id));
    }

    #[test]
    fn test_set_cookie_attributes() {
        let config = AuthConfig::with_random_secret();
        let store = SessionStore::new(&config);
        let set_cookie = store.persist(&SessionState::anonymous()).unwrap();
        let raw = set_cookie.to_str().unwrap();

        assert!(raw.starts_with("session.id="));
        assert!(raw.contains("HttpOnly"));
        assert!(raw.contains("Path=/"));
        assert!(raw.contains("Secure"));
        assert!(raw.contains("Max-Age=86400"));
    }

    #[test]
    fn test_load_reads_cookie_header() {
        let store = store();
        let user_id = UserId::new();
        let set_cookie = store.persist(&SessionState::authenticated(user_id)).unwrap();

        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            format!("theme=dark; session.id={}", cookie_value(&set_cookie))
                .parse()
                .unwrap(),
        );

        assert_eq!(store.load(&headers).user_id(), Some(user_id));
    }

    #[test]
    fn test_missing_cookie_is_anonymous() {
        assert_eq!(store().load(&HeaderMap::new()), SessionState::anonymous());
    }

    #[test]
    fn test_tampered_cookie_is_anonymous() {
        let store = store();
        let set_cookie = store.encode(&SessionState::authenticated(UserId::new()), 0).unwrap();
        let mut token = cookie_value(&set_cookie);
        token.insert(3, 'x');

        assert!(!store.decode(&token, 1).is_authenticated());
        assert!(!store.decode("garbage", 1).is_authenticated());
        assert!(!store.decode("", 1).is_authenticated());
    }

    #[test]
    fn test_cookie_from_other_key_is_anonymous() {
        let set_cookie = store().encode(&SessionState::authenticated(UserId::new()), 0).unwrap();
        assert!(!store().decode(&cookie_value(&set_cookie), 1).is_authenticated());
    }

    #[test]
    fn test_expired_cookie_is_anonymous() {
        let store = store();
        let set_cookie = store.encode(&SessionState::authenticated(UserId::new()), 0).unwrap();
        let token = cookie_value(&set_cookie);

        assert!(store.decode(&token, 86_400_000 - 1).is_authenticated());
        assert!(!store.decode(&token, 86_400_000).is_authenticated());
    }

    #[test]
    fn test_authenticated_without_user_is_anonymous() {
        let config = AuthConfig::with_random_secret();
        let store = SessionStore::new(&config);
        let signer = TokenSigner::new(config.session_secret);

        let forged = signer.sign(br#"{"authenticated":true,"userId":null,"iat":0,"exp":10}"#);
        assert_eq!(store.decode(&forged, 1), SessionState::anonymous());

        let bad_id = signer.sign(br#"{"authenticated":true,"userId":"nope","iat":0,"exp":10}"#);
        assert_eq!(store.decode(&bad_id, 1), SessionState::anonymous());
    }

    #[test]
    fn test_unencodable_cookie_is_persist_error() {
        let config = AuthConfig {
            session_cookie_name: "bad\nname".to_string(),
            ..AuthConfig::with_random_secret()
        };
        let result = SessionStore::new(&config).persist(&SessionState::anonymous());
        assert!(matches!(result, Err(AuthError::SessionPersist(_))));
    }

    #[test]
    fn test_huge_max_age_does_not_overflow() {
        let config = AuthConfig {
            session_max_age: std::time::Duration::from_secs(u64::MAX),
            ..AuthConfig::with_random_secret()
        };
        let store = SessionStore::new(&config);
        let user_id = UserId::new();

        let set_cookie = store
            .encode(&SessionState::authenticated(user_id), i64::MAX - 10)
            .unwrap();

        assert_eq!(
            store.decode(&cookie_value(&set_cookie), i64::MAX - 1),
            SessionState::authenticated(user_id)
        );
    }
}
