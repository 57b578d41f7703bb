// SPDX-FileCopyrightText: 2026 Harpocrates Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Master-secret digests and their Argon2id hashes.
//!
//! The client never sends the raw master secret. It sends [`client_digest`],
//! the lowercase hex SHA-512 of the secret. The server keeps an Argon2id PHC
//! hash of that digest ([`MasterSecretHash`]) and verifies every request
//! against it. The raw secret is never persisted.

use std::fmt;

use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};
use harpocrates_config::model::KdfConfig;
use harpocrates_core::HarpocratesError;
use ring::rand::{SecureRandom, SystemRandom};
use secrecy::{ExposeSecret, SecretString};
use sha2::{Digest, Sha512};

/// Shortest master secret accepted at enrollment, in characters.
pub const MIN_MASTER_SECRET_LEN: usize = 6;

/// Compute the digest the client puts in the `PasswordHash` wire field.
pub fn client_digest(secret: &SecretString) -> SecretString {
    let digest = Sha512::digest(secret.expose_secret().as_bytes());
    SecretString::from(hex::encode(digest))
}

/// Reject master secrets shorter than [`MIN_MASTER_SECRET_LEN`].
pub fn validate_master_secret(secret: &SecretString) -> Result<(), HarpocratesError> {
    let len = secret.expose_secret().chars().count();
    if len < MIN_MASTER_SECRET_LEN {
        return Err(HarpocratesError::Security(format!(
            "master secret must be at least {MIN_MASTER_SECRET_LEN} characters, got {len}"
        )));
    }
    Ok(())
}

/// An Argon2id PHC string of a client digest.
#[derive(Clone, PartialEq, Eq)]
pub struct MasterSecretHash {
    phc: String,
}

impl MasterSecretHash {
    /// Hash the operator's master secret for enrollment.
    ///
    /// Validates the secret length, digests it the way the client will, and
    /// hashes the digest with a fresh 16-byte salt.
    pub fn enroll(secret: &SecretString, kdf: &KdfConfig) -> Result<Self, HarpocratesError> {
        validate_master_secret(secret)?;
        Self::derive(&client_digest(secret), kdf)
    }

    /// Hash an already computed client digest.
    pub fn derive(digest: &SecretString, kdf: &KdfConfig) -> Result<Self, HarpocratesError> {
        let params = Params::new(kdf.memory_cost, kdf.iterations, kdf.parallelism, None)
            .map_err(|e| HarpocratesError::Security(format!("invalid Argon2id parameters: {e}")))?;
        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

        let salt = SaltString::encode_b64(&generate_salt()?)
            .map_err(|e| HarpocratesError::Security(format!("salt encoding failed: {e}")))?;
        let hash = argon2
            .hash_password(digest.expose_secret().as_bytes(), &salt)
            .map_err(|e| HarpocratesError::Security(format!("Argon2id hashing failed: {e}")))?;

        Ok(Self {
            phc: hash.to_string(),
        })
    }

    /// Parse a stored PHC string.
    pub fn from_phc(phc: &str) -> Result<Self, HarpocratesError> {
        let phc = phc.trim();
        PasswordHash::new(phc)
            .map_err(|e| HarpocratesError::Security(format!("stored master hash is invalid: {e}")))?;
        Ok(Self {
            phc: phc.to_string(),
        })
    }

    pub fn as_phc(&self) -> &str {
        &self.phc
    }

    /// Check a client digest against this hash.
    ///
    /// Argon2 parameters are read from the PHC string itself.
    pub fn verify(&self, digest: &str) -> bool {
        match PasswordHash::new(&self.phc) {
            Ok(parsed) => Argon2::default()
                .verify_password(digest.as_bytes(), &parsed)
                .is_ok(),
            Err(_) => false,
        }
    }
}

impl fmt::Debug for MasterSecretHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MasterSecretHash")
            .field("phc", &"[REDACTED]")
            .finish()
    }
}

fn generate_salt() -> Result<[u8; 16], HarpocratesError> {
    let rng = SystemRandom::new();
    let mut salt = [0u8; 16];
    rng.fill(&mut salt)
        .map_err(|_| HarpocratesError::Security("failed to generate random salt".to_string()))?;
    Ok(salt)
}
