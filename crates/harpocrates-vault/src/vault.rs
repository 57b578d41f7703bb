// SPDX-FileCopyrightText: 2026 Harpocrates Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Vault lifecycle: open, store, retrieve, list, delete and export secrets.
//!
//! The full entry map is held in memory and written back through the
//! storage collaborator after every mutation. A failed write leaves the
//! in-memory map as it was before the call.

use std::sync::Arc;

use harpocrates_core::{
    CryptoError, HarpocratesError, VaultEntry, VaultError, VaultListing, VaultMap, VaultRecord,
    VaultStorage,
};
use harpocrates_crypto::{KeyPair, PublicKey};
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, info};

/// An unlocked vault, holding the private key in memory.
pub struct Vault {
    keys: KeyPair,
    public: PublicKey,
    storage: Arc<dyn VaultStorage>,
    entries: VaultMap,
}

impl std::fmt::Debug for Vault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Vault")
            .field("keys", &"[REDACTED]")
            .field("entries", &self.entries.len())
            .finish()
    }
}

impl Vault {
    /// Load the persisted entries and pair them with `keys`.
    pub async fn open(
        keys: KeyPair,
        storage: Arc<dyn VaultStorage>,
    ) -> Result<Self, HarpocratesError> {
        let entries = storage.read_vault().await?;
        debug!(entries = entries.len(), "vault loaded");
        Ok(Self {
            public: keys.public_key(),
            keys,
            storage,
            entries,
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Encrypt `secret` and add it under `name`.
    pub async fn store(
        &mut self,
        name: &str,
        url: &str,
        secret: &SecretString,
    ) -> Result<(), HarpocratesError> {
        if self.entries.contains_key(name) {
            return Err(VaultError::DuplicateName(name.to_string()).into());
        }

        let encrypted_secret = self
            .public
            .encrypt(secret.expose_secret().as_bytes())
            .map_err(|source| entry_error(name, source))?;

        self.entries.insert(
            name.to_string(),
            VaultEntry {
                url: url.to_string(),
                encrypted_secret,
            },
        );
        if let Err(e) = self.storage.write_vault(&self.entries).await {
            self.entries.remove(name);
            return Err(e);
        }

        info!(name, "vault entry stored");
        Ok(())
    }

    /// Decrypt the entry called `name`.
    pub fn get(&self, name: &str) -> Result<VaultRecord, HarpocratesError> {
        let entry = self
            .entries
            .get(name)
            .ok_or_else(|| VaultError::NotFound(name.to_string()))?;
        Ok(self.decrypt(name, entry)?)
    }

    /// Remove the entry called `name`.
    pub async fn delete(&mut self, name: &str) -> Result<(), HarpocratesError> {
        let removed = self
            .entries
            .remove(name)
            .ok_or_else(|| VaultError::NotFound(name.to_string()))?;

        if let Err(e) = self.storage.write_vault(&self.entries).await {
            self.entries.insert(name.to_string(), removed);
            return Err(e);
        }

        info!(name, "vault entry deleted");
        Ok(())
    }

    /// Names and URLs of every entry, in no particular order.
    pub fn list(&self) -> Vec<VaultListing> {
        self.entries
            .iter()
            .map(|(name, entry)| VaultListing {
                name: name.clone(),
                url: entry.url.clone(),
            })
            .collect()
    }

    /// Decrypt every entry, sorted by name. Fails on the first entry that
    /// does not decrypt.
    pub fn decrypt_all(&self) -> Result<Vec<VaultRecord>, VaultError> {
        let mut names: Vec<&String> = self.entries.keys().collect();
        names.sort();
        names
            .into_iter()
            .map(|name| self.decrypt(name, &self.entries[name]))
            .collect()
    }

    /// Write every entry to `sink` as CSV. See [`crate::export`].
    pub fn export_all<W: std::io::Write>(&self, sink: W) -> Result<usize, HarpocratesError> {
        let records = self.decrypt_all()?;
        crate::export::write_csv(sink, &records)?;
        info!(entries = records.len(), "vault exported");
        Ok(records.len())
    }

    fn decrypt(&self, name: &str, entry: &VaultEntry) -> Result<VaultRecord, VaultError> {
        let plaintext = self
            .keys
            .decrypt(&entry.encrypted_secret)
            .map_err(|source| entry_error(name, source))?;
        let secret = std::str::from_utf8(&plaintext).map_err(|_| {
            entry_error(
                name,
                CryptoError::Crypto("decrypted secret is not valid UTF-8".to_string()),
            )
        })?;
        Ok(VaultRecord {
            name: name.to_string(),
            url: entry.url.clone(),
            secret: SecretString::from(secret.to_string()),
        })
    }
}

fn entry_error(name: &str, source: CryptoError) -> VaultError {
    VaultError::Crypto {
        name: name.to_string(),
        source,
    }
}
