//! Token generation and constant-time comparison.

use guard_types::CsrfToken;
use rand::RngCore;
use subtle::ConstantTimeEq;

/// Number of random bytes behind each CSRF secret (256 bits).
pub const SECRET_BYTES: usize = 32;

/// Generates a fresh CSRF secret from the thread-local CSPRNG, hex encoded.
pub fn generate_secret() -> CsrfToken {
    let mut bytes = [0u8; SECRET_BYTES];
    rand::rng().fill_bytes(&mut bytes);
    CsrfToken::new(hex::encode(bytes))
}

/// Compares two tokens without short-circuiting on the first differing byte.
pub fn tokens_match(expected: &[u8], submitted: &[u8]) -> bool {
    expected.ct_eq(submitted).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_secret_shape() {
        let secret = generate_secret();
        assert_eq!(secret.as_str().len(), SECRET_BYTES * 2);
        assert!(secret.as_str().chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_generated_secrets_differ() {
        assert_ne!(generate_secret(), generate_secret());
    }

    #[test]
    fn test_tokens_match() {
        assert!(tokens_match(b"abc123", b"abc123"));
        assert!(!tokens_match(b"abc123", b"abc124"));
        assert!(!tokens_match(b"abc123", b"abc123x"));
        assert!(!tokens_match(b"abc123", b""));
    }
}
