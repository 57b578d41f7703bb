// SPDX-FileCopyrightText: 2026 Harpocrates Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory storage for tests.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use harpocrates_core::{EscrowStorage, HarpocratesError, KeyStorage, VaultMap, VaultStorage};
use tokio::sync::Mutex;

/// Implements every storage trait with plain fields.
///
/// Counts vault writes and can be told to fail every write, so tests can
/// check persistence and error propagation.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    private_key: Mutex<Option<String>>,
    public_key: Mutex<Option<String>>,
    master_hash: Mutex<Option<String>>,
    vault: Mutex<VaultMap>,
    vault_writes: AtomicUsize,
    fail_writes: AtomicBool,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Storage already holding a master-secret hash.
    pub fn with_master_hash(phc: impl Into<String>) -> Self {
        Self {
            master_hash: Mutex::new(Some(phc.into())),
            ..Self::default()
        }
    }

    /// Number of completed `write_vault` calls.
    pub fn vault_writes(&self) -> usize {
        self.vault_writes.load(Ordering::SeqCst)
    }

    /// Make every subsequent write fail.
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn check_writable(&self) -> Result<(), HarpocratesError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(HarpocratesError::storage(std::io::Error::other(
                "simulated write failure",
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl EscrowStorage for MemoryStorage {
    async fn read_private_key_envelope(&self) -> Result<Option<String>, HarpocratesError> {
        Ok(self.private_key.lock().await.clone())
    }

    async fn write_private_key_envelope(&self, envelope: &str) -> Result<(), HarpocratesError> {
        self.check_writable()?;
        *self.private_key.lock().await = Some(envelope.to_string());
        Ok(())
    }

    async fn read_master_secret_hash(&self) -> Result<Option<String>, HarpocratesError> {
        Ok(self.master_hash.lock().await.clone())
    }

    async fn write_master_secret_hash(&self, hash: &str) -> Result<(), HarpocratesError> {
        self.check_writable()?;
        let mut slot = self.master_hash.lock().await;
        if slot.is_some() {
            return Err(HarpocratesError::Security(
                "a master-secret hash already exists".to_string(),
            ));
        }
        *slot = Some(hash.to_string());
        Ok(())
    }
}

#[async_trait]
impl KeyStorage for MemoryStorage {
    async fn read_public_key_envelope(&self) -> Result<Option<String>, HarpocratesError> {
        Ok(self.public_key.lock().await.clone())
    }

    async fn write_public_key_envelope(&self, envelope: &str) -> Result<(), HarpocratesError> {
        self.check_writable()?;
        *self.public_key.lock().await = Some(envelope.to_string());
        Ok(())
    }
}

#[async_trait]
impl VaultStorage for MemoryStorage {
    async fn read_vault(&self) -> Result<VaultMap, HarpocratesError> {
        Ok(self.vault.lock().await.clone())
    }

    async fn write_vault(&self, vault: &VaultMap) -> Result<(), HarpocratesError> {
        self.check_writable()?;
        *self.vault.lock().await = vault.clone();
        self.vault_writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn master_hash_cannot_be_replaced() {
        let storage = MemoryStorage::with_master_hash("$argon2id$a");
        assert!(storage.write_master_secret_hash("$argon2id$b").await.is_err());
        assert_eq!(
            storage.read_master_secret_hash().await.unwrap().as_deref(),
            Some("$argon2id$a")
        );
    }

    #[tokio::test]
    async fn simulated_failures_leave_state_untouched() {
        let storage = MemoryStorage::new();
        storage.fail_writes(true);
        assert!(storage.write_vault(&VaultMap::new()).await.is_err());
        assert!(storage.write_private_key_envelope("k").await.is_err());
        assert_eq!(storage.vault_writes(), 0);
        assert_eq!(storage.read_private_key_envelope().await.unwrap(), None);
    }
}
