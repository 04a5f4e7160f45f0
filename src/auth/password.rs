//! Two-stage password hashing.
//!
//! The plaintext is first reduced to a 64-character SHA-256 hex digest, then that
//! digest is hashed with Argon2id and a random salt. The stored value is a PHC string,
//! so salt and cost parameters travel with the hash and verification needs nothing else.

use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use rand::rngs::OsRng;
use sha2::{Digest, Sha256};
use tracing::error;

use crate::config::PasswordConfig;

/// Stage one: fixed-length hex digest of the raw password.
pub fn pre_hash(plain: &str) -> String {
    format!("{:x}", Sha256::digest(plain.as_bytes()))
}

/// Cost parameters for stage two. Holds no mutable state.
#[derive(Debug, Clone)]
pub struct PasswordPolicy {
    params: Params,
}

impl PasswordPolicy {
    pub fn from_config(cfg: &PasswordConfig) -> anyhow::Result<Self> {
        let params = Params::new(cfg.memory_kib, cfg.iterations, cfg.parallelism, None)
            .map_err(|e| anyhow::anyhow!("invalid argon2 parameters: {e}"))?;
        Ok(Self { params })
    }

    /// Cheapest parameters argon2 accepts; keeps test suites fast.
    #[cfg(test)]
    pub fn fast() -> Self {
        Self::from_config(&PasswordConfig {
            memory_kib: 64,
            iterations: 1,
            parallelism: 1,
        })
        .expect("minimal argon2 params are valid")
    }

    pub fn hash_password(&self, plain: &str) -> anyhow::Result<String> {
        let salt = SaltString::generate(&mut OsRng);
        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone());
        let hash = argon2
            .hash_password(pre_hash(plain).as_bytes(), &salt)
            .map_err(|e| {
                error!(error = %e, "argon2 hash_password error");
                anyhow::anyhow!(e.to_string())
            })?
            .to_string();
        Ok(hash)
    }
}

/// Checks `plain` against a stored PHC hash using the parameters embedded in it.
///
/// `Ok(false)` means the password does not match; `Err` means the stored hash could not
/// be parsed.
pub fn verify_password(plain: &str, hash: &str) -> anyhow::Result<bool> {
    let parsed = PasswordHash::new(hash).map_err(|e| {
        error!(error = %e, "argon2 parse hash error");
        anyhow::anyhow!(e.to_string())
    })?;
    Ok(Argon2::default()
        .verify_password(pre_hash(plain).as_bytes(), &parsed)
        .is_ok())
}
