//! PKCE (Proof Key for Code Exchange) helpers
//!
//! RFC 7636: https://tools.ietf.org/html/rfc7636

use super::types::{AuthError, AuthResult};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use rand::RngCore;
use sha2::{Digest, Sha256};
use tracing::debug;

/// Smallest accepted verifier entropy, in bytes
pub const MIN_VERIFIER_LENGTH: usize = 43;

/// Largest accepted verifier entropy, in bytes
pub const MAX_VERIFIER_LENGTH: usize = 128;

/// Entropy used by the PKCE flow when none is configured
pub const DEFAULT_VERIFIER_LENGTH: usize = 50;

/// The only challenge method this crate produces
pub const CHALLENGE_METHOD: &str = "S256";

/// Generate a code verifier from `length` random bytes.
///
/// The bytes are base64url encoded without padding, so the returned string
/// is roughly 4/3 of `length` characters long.
pub fn create_code_verifier(length: Option<usize>) -> AuthResult<String> {
    let length = length.ok_or(AuthError::MissingVerifierLength)?;
    if !(MIN_VERIFIER_LENGTH..=MAX_VERIFIER_LENGTH).contains(&length) {
        return Err(AuthError::InvalidVerifierLength(length));
    }

    let mut bytes = vec![0u8; length];
    rand::thread_rng().fill_bytes(&mut bytes);
    let verifier = URL_SAFE_NO_PAD.encode(&bytes);

    debug!("PKCE verifier generated: {} chars", verifier.len());
    Ok(verifier)
}

/// SHA-256 of the verifier, base64url encoded without padding
pub fn create_code_challenge(verifier: &str) -> String {
    let digest = Sha256::digest(verifier.as_bytes());
    URL_SAFE_NO_PAD.encode(digest)
}

/// A verifier together with its derived challenge
#[derive(Clone)]
pub struct PkcePair {
    pub verifier: String,
    pub challenge: String,
}

impl PkcePair {
    /// Generate a fresh pair from `length` random bytes
    pub fn generate(length: usize) -> AuthResult<Self> {
        let verifier = create_code_verifier(Some(length))?;
        let challenge = create_code_challenge(&verifier);
        Ok(Self {
            verifier,
            challenge,
        })
    }

    /// Challenge method to send alongside the challenge
    pub fn method(&self) -> &'static str {
        CHALLENGE_METHOD
    }
}

impl std::fmt::Debug for PkcePair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PkcePair")
            .field("verifier", &"<redacted>")
            .field("challenge", &self.challenge)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_challenge_known_answer() {
        assert_eq!(
            create_code_challenge("a"),
            "ypeBEsobvcr6wjGzmiPcTaeG7_gUfE5yuYB3ha_uSLs"
        );
    }

    #[test]
    fn test_challenge_rfc7636_appendix_b() {
        assert_eq!(
            create_code_challenge("dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk"),
            "E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGJSstw-cM"
        );
    }

    #[test]
    fn test_challenge_deterministic() {
        let verifier = create_code_verifier(Some(64)).unwrap();
        assert_eq!(
            create_code_challenge(&verifier),
            create_code_challenge(&verifier)
        );
    }

    #[test]
    fn test_verifier_is_url_safe_for_all_lengths() {
        for length in MIN_VERIFIER_LENGTH..=MAX_VERIFIER_LENGTH {
            let verifier = create_code_verifier(Some(length)).unwrap();
            assert!(
                !verifier.contains(['+', '/', '=']),
                "length {length} produced {verifier}"
            );
            assert_eq!(verifier.len(), (length * 4 + 2) / 3);
        }
    }

    #[test]
    fn test_verifier_length_bounds() {
        assert!(matches!(
            create_code_verifier(Some(42)),
            Err(AuthError::InvalidVerifierLength(42))
        ));
        assert!(matches!(
            create_code_verifier(Some(129)),
            Err(AuthError::InvalidVerifierLength(129))
        ));
        assert!(matches!(
            create_code_verifier(None),
            Err(AuthError::MissingVerifierLength)
        ));
        assert!(create_code_verifier(Some(43)).is_ok());
        assert!(create_code_verifier(Some(128)).is_ok());
    }

    #[test]
    fn test_verifiers_are_random() {
        let first = create_code_verifier(Some(DEFAULT_VERIFIER_LENGTH)).unwrap();
        let second = create_code_verifier(Some(DEFAULT_VERIFIER_LENGTH)).unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn test_pair_generation() {
        let pair = PkcePair::generate(DEFAULT_VERIFIER_LENGTH).unwrap();
        assert_eq!(pair.method(), "S256");
        assert_eq!(pair.challenge, create_code_challenge(&pair.verifier));
        assert!(!format!("{pair:?}").contains(&pair.verifier));
    }
}
