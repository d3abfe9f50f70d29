//! # Credential Engine
//!
//! One-way password hashing with Argon2id.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  hash("hunter2")                                                        │
//! │     └── random 16-byte salt (OsRng) ──► $argon2id$v=19$m=..,t=..,p=..$  │
//! │                                          <salt>$<digest>                │
//! │                                                                         │
//! │  verify(stored, "hunter2")                                              │
//! │     ├── parse PHC string ── malformed/empty? ──► false                  │
//! │     └── recompute with the stored params, constant-time compare         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Hashing is deliberately CPU-heavy. Async callers should run it on a
//! blocking pool (`tokio::task::spawn_blocking`).

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash as PhcHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};
use std::fmt;

use crate::error::{CoreError, CoreResult};

// =============================================================================
// Password Hash
// =============================================================================

/// A stored password digest in PHC string format.
#[derive(Clone, PartialEq, Eq)]
pub struct PasswordHash(String);

impl PasswordHash {
    /// Wraps a PHC string read back from storage. Not validated here;
    /// [`CredentialEngine::verify`] rejects malformed values.
    pub fn from_phc(phc: impl Into<String>) -> Self {
        PasswordHash(phc.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Debug for PasswordHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PasswordHash(<redacted>)")
    }
}

// =============================================================================
// Engine
// =============================================================================

/// Hashes and verifies passwords.
#[derive(Clone, Default)]
pub struct CredentialEngine {
    argon2: Argon2<'static>,
}

impl CredentialEngine {
    /// Engine with the argon2 crate's default Argon2id parameters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Engine with explicit cost parameters.
    ///
    /// ## Arguments
    /// * `memory_kib` - memory cost in KiB
    /// * `iterations` - time cost
    /// * `parallelism` - lanes
    pub fn with_cost(memory_kib: u32, iterations: u32, parallelism: u32) -> CoreResult<Self> {
        let params = Params::new(memory_kib, iterations, parallelism, None)
            .map_err(|e| CoreError::PasswordHashing(e.to_string()))?;

        Ok(CredentialEngine {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
        })
    }

    /// Produces a freshly salted digest. Equal inputs give different outputs.
    pub fn hash(&self, plaintext: &str) -> CoreResult<PasswordHash> {
        let salt = SaltString::generate(&mut OsRng);

        self.argon2
            .hash_password(plaintext.as_bytes(), &salt)
            .map(|hash| PasswordHash(hash.to_string()))
            .map_err(|e| CoreError::PasswordHashing(e.to_string()))
    }

    /// Checks `plaintext` against `hash`.
    ///
    /// Never fails: a malformed or empty hash simply does not verify.
    pub fn verify(&self, hash: &PasswordHash, plaintext: &str) -> bool {
        let parsed = match PhcHash::new(hash.as_str()) {
            Ok(h) => h,
            Err(_) => return false,
        };

        self.argon2
            .verify_password(plaintext.as_bytes(), &parsed)
            .is_ok()
    }
}

impl fmt::Debug for CredentialEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialEngine")
            .field("params", self.argon2.params())
            .finish()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn cheap() -> CredentialEngine {
        CredentialEngine::with_cost(64, 1, 1).unwrap()
    }

    #[test]
    fn test_hash_then_verify() {
        let engine = cheap();
        let hash = engine.hash("correct horse").unwrap();

        assert!(hash.as_str().starts_with("$argon2id$"));
        assert!(engine.verify(&hash, "correct horse"));
        assert!(!engine.verify(&hash, "correct h0rse"));
    }

    #[test]
    fn test_salts_differ() {
        let engine = cheap();
        let a = engine.hash("same").unwrap();
        let b = engine.hash("same").unwrap();

        assert_ne!(a, b);
        assert!(engine.verify(&a, "same"));
        assert!(engine.verify(&b, "same"));
    }

    #[test]
    fn test_malformed_hash_does_not_verify() {
        let engine = cheap();
        assert!(!engine.verify(&PasswordHash::from_phc(""), ""));
        assert!(!engine.verify(&PasswordHash::from_phc("not-a-phc"), "x"));
    }

    #[test]
    fn test_verify_uses_stored_params() {
        let hash = cheap().hash("pw").unwrap();
        let other = CredentialEngine::with_cost(128, 2, 1).unwrap();
        assert!(other.verify(&hash, "pw"));
    }

    #[test]
    fn test_invalid_cost_is_rejected() {
        assert!(matches!(
            CredentialEngine::with_cost(1, 0, 0),
            Err(CoreError::PasswordHashing(_))
        ));
    }

    #[test]
    fn test_debug_redacts() {
        let hash = PasswordHash::from_phc("$argon2id$secret");
        assert_eq!(format!("{hash:?}"), "PasswordHash(<redacted>)");
    }
}
