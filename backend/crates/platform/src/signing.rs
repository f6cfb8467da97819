//! Signed Token Codec
//!
//! Tamper-evident `payload.signature` tokens for client-held state.
//!
//! Format: `base64url(payload) "." base64url(HMAC-SHA256(base64url(payload)))`.
//! The payload is opaque bytes; callers decide the serialization.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use thiserror::Error;

use crate::crypto::{from_base64url, to_base64url};

type HmacSha256 = Hmac<Sha256>;

/// Verification failures. Callers usually collapse all of them into
/// "no valid token".
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SigningError {
    #[error("Token is malformed")]
    Malformed,

    #[error("Token signature mismatch")]
    BadSignature,
}

/// HMAC-SHA256 signer bound to a 32-byte key
#[derive(Clone)]
pub struct TokenSigner {
    key: [u8; 32],
}

impl TokenSigner {
    pub fn new(key: [u8; 32]) -> Self {
        Self { key }
    }

    fn mac(&self) -> HmacSha256 {
        <HmacSha256 as Mac>::new_from_slice(&self.key).expect("HMAC can take key of any size")
    }

    /// Sign an opaque payload
    pub fn sign(&self, payload: &[u8]) -> String {
        let payload_b64 = to_base64url(payload);

        let mut mac = self.mac();
        mac.update(payload_b64.as_bytes());
        let signature = mac.finalize().into_bytes();

        format!("{}.{}", payload_b64, to_base64url(&signature))
    }

    /// Verify a token and return its payload
    pub fn verify(&self, token: &str) -> Result<Vec<u8>, SigningError> {
        let (payload_b64, signature_b64) =
            token.split_once('.').ok_or(SigningError::Malformed)?;

        let signature = from_base64url(signature_b64).map_err(|_| SigningError::Malformed)?;

        let mut mac = self.mac();
        mac.update(payload_b64.as_bytes());
        // constant-time comparison
        mac.verify_slice(&signature)
            .map_err(|_| SigningError::BadSignature)?;

        from_base64url(payload_b64).map_err(|_| SigningError::Malformed)
    }
}

impl std::fmt::Debug for TokenSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenSigner").field("key", &"[REDACTED]").finish()
    }
}
