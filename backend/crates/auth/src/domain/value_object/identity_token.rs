//! Identity Token Value Objects
//!
//! The raw token asserted by a provider is held in a zeroizing wrapper
//! and only its SHA-256 digest is ever persisted.

use platform::crypto::sha256_hex;
use platform::secret::SecretString;

/// Raw identity token returned by a provider. Redacted in `Debug`
/// and wiped from memory on drop.
#[derive(Debug, Clone)]
pub struct RawIdentityToken(SecretString);

impl RawIdentityToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(SecretString::new(token))
    }

    pub fn expose(&self) -> &str {
        self.0.expose()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Lowercase hex SHA-256 of a raw identity token
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TokenHash(String);

impl TokenHash {
    /// Create from database value (assumed already validated)
    pub fn from_db(hash: impl Into<String>) -> Self {
        Self(hash.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TokenHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One-way digest for identity tokens
pub struct TokenHasher;

impl TokenHasher {
    /// Hash the token bytes. Deterministic; safe to log the result.
    pub fn hash(raw: &RawIdentityToken) -> TokenHash {
        TokenHash(sha256_hex(raw.expose().as_bytes()))
    }
}
