//! Application Configuration
//!
//! Configuration for the Auth application layer.

use std::time::Duration;

use platform::cookie::CookieConfig;

/// Re-export SameSite from platform
pub use platform::cookie::SameSite;

/// Auth application configuration
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Session cookie name
    pub session_cookie_name: String,
    /// Session secret key for HMAC signing (32 bytes)
    pub session_secret: [u8; 32],
    /// Session lifetime (AUTH_MAX_AGE)
    pub session_max_age: Duration,
    /// Pending handshake cookie name
    pub handshake_cookie_name: String,
    /// How long a started handshake may take to come back
    pub handshake_ttl: Duration,
    /// `protocol://domain`, no trailing slash
    pub base_url: String,
    /// Whether to require Secure cookie
    pub cookie_secure: bool,
    /// SameSite policy
    pub cookie_same_site: SameSite,
    /// Attempts before a racing user creation is reported
    pub reconcile_max_attempts: u32,
    /// Check that the session's user still exists before short-circuiting
    pub revalidate_on_initiate: bool,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            session_cookie_name: "session.id".to_string(),
            session_secret: [0u8; 32],
            session_max_age: Duration::from_secs(24 * 3600), // 1 day
            handshake_cookie_name: "oauth_handshake".to_string(),
            handshake_ttl: Duration::from_secs(5 * 60), // 5 minutes
            base_url: "http://localhost".to_string(),
            cookie_secure: true,
            cookie_same_site: SameSite::Lax,
            reconcile_max_attempts: 3,
            revalidate_on_initiate: false,
        }
    }
}

impl AuthConfig {
    /// Create config with a random session secret (for development)
    pub fn with_random_secret() -> Self {
        use rand::RngCore;
        let mut secret = [0u8; 32];
        rand::rng().fill_bytes(&mut secret);
        Self {
            session_secret: secret,
            ..Default::default()
        }
    }

    /// Create config for development (insecure cookie)
    pub fn development() -> Self {
        Self {
            cookie_secure: false,
            ..Self::with_random_secret()
        }
    }

    /// Build `protocol://domain` from its parts
    pub fn base_url_from(protocol: &str, domain: &str) -> String {
        format!(
            "{}://{}",
            protocol.trim_end_matches("://"),
            domain.trim_end_matches('/')
        )
    }

    /// Where the provider sends the browser back to
    pub fn callback_url(&self, provider: &str) -> String {
        format!("{}/auth/{}/callback", self.base_url, provider)
    }

    /// Landing page after login and logout
    pub fn home_url(&self) -> String {
        format!("{}/", self.base_url)
    }

    pub fn session_max_age_ms(&self) -> i64 {
        duration_ms(self.session_max_age)
    }

    pub fn handshake_ttl_ms(&self) -> i64 {
        duration_ms(self.handshake_ttl)
    }

    /// Cookie attributes for the session cookie
    pub fn session_cookie(&self) -> CookieConfig {
        CookieConfig {
            name: self.session_cookie_name.clone(),
            secure: self.cookie_secure,
            http_only: true,
            same_site: self.cookie_same_site,
            path: "/".to_string(),
            max_age_secs: Some(self.session_max_age.as_secs()),
        }
    }

    /// Cookie attributes for the pending handshake cookie
    pub fn handshake_cookie(&self) -> CookieConfig {
        // Strict would drop the cookie on the provider's redirect back
        let same_site = match self.cookie_same_site {
            SameSite::Strict => SameSite::Lax,
            other => other,
        };

        CookieConfig {
            name: self.handshake_cookie_name.clone(),
            secure: self.cookie_secure,
            http_only: true,
            same_site,
            path: "/auth".to_string(),
            max_age_secs: Some(self.handshake_ttl.as_secs()),
        }
    }
}

/// Milliseconds, clamped to `i64::MAX`
fn duration_ms(duration: Duration) -> i64 {
    i64::try_from(duration.as_millis()).unwrap_or(i64::MAX)
}
