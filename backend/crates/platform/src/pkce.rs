//! PKCE and OAuth `state` generation (RFC 7636)

use crate::crypto::{random_bytes, sha256, to_base64url};

/// Random code verifier: 64 URL-safe chars (48 random bytes).
#[must_use]
pub fn generate_code_verifier() -> String {
    to_base64url(&random_bytes(48))
}

/// S256 code challenge: `BASE64URL(SHA256(verifier))`
#[must_use]
pub fn generate_code_challenge(verifier: &str) -> String {
    to_base64url(&sha256(verifier.as_bytes()))
}

/// Random CSRF `state`: 22 URL-safe chars (16 random bytes).
#[must_use]
pub fn generate_state() -> String {
    to_base64url(&random_bytes(16))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_verifier_shape() {
        let verifier = generate_code_verifier();
        assert_eq!(verifier.len(), 64);
        assert!(
            verifier
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        );
    }

    #[test]
    fn test_code_challenge_rfc7636_vector() {
        // RFC 7636 Appendix B
        assert_eq!(
            generate_code_challenge("dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk"),
            "E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGJSstw-cM"
        );
    }

    #[test]
    fn test_state_unique() {
        let s1 = generate_state();
        assert_eq!(s1.len(), 22);
        assert_ne!(s1, generate_state());
    }
}
