// SPDX-FileCopyrightText: 2026 Harpocrates Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Storage collaborator traits.
//!
//! The escrow server, the client enrollment flow, and the vault only ever
//! ask for whole values: an envelope, a hash, or a full vault snapshot.
//! Durability is "last write wins".

use async_trait::async_trait;

use crate::error::HarpocratesError;
use crate::types::VaultMap;

/// Server-side persistence: the single escrowed private key and the
/// master-secret hash set at enrollment.
#[async_trait]
pub trait EscrowStorage: Send + Sync {
    /// Returns the escrowed private-key envelope, or `None` if no key is on record.
    async fn read_private_key_envelope(&self) -> Result<Option<String>, HarpocratesError>;

    /// Persists the private-key envelope. Callers check for an existing key first.
    async fn write_private_key_envelope(&self, envelope: &str) -> Result<(), HarpocratesError>;

    /// Returns the PHC-encoded master-secret hash, or `None` before enrollment.
    async fn read_master_secret_hash(&self) -> Result<Option<String>, HarpocratesError>;

    /// Persists the master-secret hash. Only the hash is ever stored.
    async fn write_master_secret_hash(&self, hash: &str) -> Result<(), HarpocratesError>;
}

/// Client-side persistence of its own public key.
#[async_trait]
pub trait KeyStorage: Send + Sync {
    async fn read_public_key_envelope(&self) -> Result<Option<String>, HarpocratesError>;

    async fn write_public_key_envelope(&self, envelope: &str) -> Result<(), HarpocratesError>;
}

/// Full-snapshot persistence of vault entries.
#[async_trait]
pub trait VaultStorage: Send + Sync {
    /// Loads the vault. A missing database yields an empty map.
    async fn read_vault(&self) -> Result<VaultMap, HarpocratesError>;

    /// Replaces the persisted vault with `vault`.
    async fn write_vault(&self, vault: &VaultMap) -> Result<(), HarpocratesError>;
}
