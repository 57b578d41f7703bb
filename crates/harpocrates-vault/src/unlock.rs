// SPDX-FileCopyrightText: 2026 Harpocrates Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Unlock: fetch the escrowed private key and open the vault with it.

use std::sync::Arc;

use harpocrates_core::{HarpocratesError, KeyStorage, VaultError, VaultStorage};
use harpocrates_crypto::{EncodedKey, KeyPair, PublicKey};
use harpocrates_escrow::EscrowClient;
use secrecy::SecretString;
use tracing::{info, warn};

use crate::vault::Vault;

/// Fetch the private key from the escrow server and open the vault.
///
/// When a public key was saved at enrollment, the fetched private key must
/// be its other half.
pub async fn unlock(
    client: &EscrowClient,
    digest: &SecretString,
    keys: &dyn KeyStorage,
    storage: Arc<dyn VaultStorage>,
) -> Result<Vault, HarpocratesError> {
    let envelope = client.fetch_private_key(digest).await?;
    let pair = KeyPair::decode_private(&envelope)?;
    verify_local_public_key(&pair, keys).await?;

    let vault = Vault::open(pair, storage).await?;
    info!(entries = vault.len(), "vault unlocked");
    Ok(vault)
}

/// Check `pair` against the locally stored public key, if there is one.
pub async fn verify_local_public_key(
    pair: &KeyPair,
    keys: &dyn KeyStorage,
) -> Result<(), HarpocratesError> {
    let Some(local) = keys.read_public_key_envelope().await? else {
        warn!("no local public key on record; skipping key match check");
        return Ok(());
    };

    let local = PublicKey::decode(&EncodedKey::new(local))?;
    if !pair.matches(&local) {
        return Err(VaultError::KeyMismatch.into());
    }
    Ok(())
}
