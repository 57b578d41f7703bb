// SPDX-FileCopyrightText: 2026 Harpocrates Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Data model shared by the vault and its storage collaborator.

use std::collections::HashMap;

use secrecy::SecretString;
use serde::{Deserialize, Serialize};

/// One vault entry at rest, keyed by name in [`VaultMap`].
///
/// Field names match the persisted MessagePack layout.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultEntry {
    #[serde(rename = "Url", default)]
    pub url: String,

    /// RSA-OAEP ciphertext under the vault's public key.
    #[serde(rename = "EncryptedPassword", with = "serde_bytes")]
    pub encrypted_secret: Vec<u8>,
}

impl std::fmt::Debug for VaultEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VaultEntry")
            .field("url", &self.url)
            .field("encrypted_secret", &format_args!("<{} bytes>", self.encrypted_secret.len()))
            .finish()
    }
}

/// The full vault snapshot, persisted as a whole after every mutation.
pub type VaultMap = HashMap<String, VaultEntry>;

/// A decrypted entry returned by `get` and written by export.
#[derive(Debug, Clone)]
pub struct VaultRecord {
    pub name: String,
    pub url: String,
    pub secret: SecretString,
}

/// A listing row; never carries secret material.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VaultListing {
    pub name: String,
    pub url: String,
}
