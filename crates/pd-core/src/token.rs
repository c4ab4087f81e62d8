//! Session token and password digest helpers
//!
//! - Tokens are 32 bytes of cryptographically random data, hex-encoded (64 chars)
//! - Unlock passwords are never stored; configuration carries their SHA-256
//!   hex digest and comparison happens digest-to-digest in constant time
//! - Clients present the token either in the connection-time auth payload or
//!   in the `x-session-token` header

use sha2::{Digest, Sha256};

/// Random bytes behind one session token
const TOKEN_ENTROPY: usize = 32;

/// Header carrying the session token on HTTP requests and realtime handshakes
pub const SESSION_HEADER: &str = "x-session-token";

/// Fresh unguessable session token, hex-encoded
pub fn generate_token() -> String {
    let entropy: [u8; TOKEN_ENTROPY] = rand::random();
    hex::encode(entropy)
}

/// Hex-encoded SHA-256 digest of a password
pub fn password_digest(password: &str) -> String {
    hex::encode(Sha256::digest(password.as_bytes()))
}

/// Check a candidate password against a stored SHA-256 hex digest
pub fn verify_password(candidate: &str, expected_digest: &str) -> bool {
    constant_time_eq(
        &password_digest(candidate),
        &expected_digest.trim().to_ascii_lowercase(),
    )
}

/// Compare two strings without short-circuiting on the first mismatch
pub fn constant_time_eq(provided: &str, expected: &str) -> bool {
    provided.len() == expected.len()
        && provided
            .bytes()
            .zip(expected.bytes())
            .fold(0u8, |diff, (x, y)| diff | (x ^ y))
            == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokens_are_hex_and_distinct() {
        let first = generate_token();
        let second = generate_token();
        assert_eq!(first.len(), 2 * TOKEN_ENTROPY);
        assert!(first.bytes().all(|b| b.is_ascii_hexdigit()));
        assert_ne!(first, second);
    }

    #[test]
    fn test_constant_time_eq() {
        assert!(constant_time_eq("deadbeef", "deadbeef"));
        assert!(!constant_time_eq("deadbeef", "deadbeee"));
        assert!(!constant_time_eq("deadbeef", "deadbee"));
        assert!(constant_time_eq("", ""));
    }

    #[test]
    fn test_password_digest_known_value() {
        assert_eq!(
            password_digest("password"),
            "5e884898da28047151d0e56f8dc6292773603d0d6aabbdd62a11ef721d1542d8"
        );
    }

    #[test]
    fn test_verify_password() {
        let digest = password_digest("hunter2");
        assert!(verify_password("hunter2", &digest));
        assert!(verify_password("hunter2", &digest.to_uppercase()));
        assert!(!verify_password("hunter3", &digest));
        assert!(!verify_password("hunter2", ""));
    }
}
