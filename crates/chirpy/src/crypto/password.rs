//! Password hashing and verification using Argon2id.
//!
//! Credentials are PHC strings (`$argon2id$v=19$m=...,t=...,p=1$salt$hash`)
//! so every stored hash carries its own parameters and salt. Verification
//! reads them back from the hash, which lets the work factor change without
//! invalidating existing accounts.

use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};

use crate::error::{ChirpyError, Result};

/// Default Argon2 iteration count.
pub const DEFAULT_HASH_COST: u32 = 2;
/// Default Argon2 memory cost in KiB (19 MiB, the OWASP baseline).
pub const DEFAULT_HASH_MEMORY_KIB: u32 = 19_456;
const ARGON2_P_COST: u32 = 1;

/// Work factor for password hashing, fixed when the manager is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HashCost {
    /// Argon2 time cost (iterations).
    pub iterations: u32,
    /// Argon2 memory cost in KiB.
    pub memory_kib: u32,
}

impl Default for HashCost {
    fn default() -> Self {
        Self {
            iterations: DEFAULT_HASH_COST,
            memory_kib: DEFAULT_HASH_MEMORY_KIB,
        }
    }
}

/// Hashes and verifies account passwords.
///
/// Never stores, returns, or logs plaintext.
#[derive(Clone)]
pub struct CredentialManager {
    argon2: Argon2<'static>,
}

impl CredentialManager {
    /// Build a manager with the given work factor.
    ///
    /// # Errors
    ///
    /// Returns `ChirpyError::Config` if the Argon2 parameters are out of range.
    pub fn new(cost: HashCost) -> Result<Self> {
        let params = Params::new(cost.memory_kib, cost.iterations, ARGON2_P_COST, None)
            .map_err(|e| ChirpyError::Config(format!("Argon2 params: {e}")))?;
        Ok(Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
        })
    }

    /// Produce a salted one-way hash of `plaintext`.
    pub fn hash(&self, plaintext: &str) -> Result<String> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon2
            .hash_password(plaintext.as_bytes(), &salt)
            .map_err(|e| ChirpyError::Config(format!("Argon2 hash: {e}")))?;
        Ok(hash.to_string())
    }

    /// Check `plaintext` against a stored credential.
    ///
    /// Returns false for a mismatch and for a credential that is not a
    /// parseable PHC string.
    pub fn verify(&self, credential: &str, plaintext: &str) -> bool {
        let Ok(parsed) = PasswordHash::new(credential) else {
            log::warn!("stored credential is not a valid password hash");
            return false;
        };
        self.argon2
            .verify_password(plaintext.as_bytes(), &parsed)
            .is_ok()
    }
}

impl std::fmt::Debug for CredentialManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialManager")
            .field("params", self.argon2.params())
            .finish()
    }
}
