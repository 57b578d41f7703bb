// SPDX-FileCopyrightText: 2026 Harpocrates Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Filesystem implementation of the storage collaborator traits.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use harpocrates_config::model::StorageConfig;
use harpocrates_core::{EscrowStorage, HarpocratesError, KeyStorage, VaultMap, VaultStorage};

/// Stores each value in its own file.
///
/// Envelopes and the vault are replaced atomically (write to a sibling temp
/// file, then rename). The master-secret hash is written once and never
/// overwritten.
#[derive(Debug, Clone)]
pub struct FileStorage {
    vault_path: PathBuf,
    private_key_path: PathBuf,
    public_key_path: PathBuf,
    master_hash_path: PathBuf,
}

impl FileStorage {
    /// Create a FileStorage rooted at the configured data directory.
    ///
    /// Nothing is touched on disk until the first write.
    pub fn new(config: &StorageConfig) -> Self {
        Self {
            vault_path: config.vault_path(),
            private_key_path: config.private_key_path(),
            public_key_path: config.public_key_path(),
            master_hash_path: config.master_hash_path(),
        }
    }

    pub fn vault_path(&self) -> &Path {
        &self.vault_path
    }

    pub fn private_key_path(&self) -> &Path {
        &self.private_key_path
    }

    pub fn public_key_path(&self) -> &Path {
        &self.public_key_path
    }

    pub fn master_hash_path(&self) -> &Path {
        &self.master_hash_path
    }
}

/// Read a file, mapping "not found" to `None`.
async fn read_optional(path: &Path) -> Result<Option<Vec<u8>>, HarpocratesError> {
    match tokio::fs::read(path).await {
        Ok(bytes) => Ok(Some(bytes)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(HarpocratesError::storage(e)),
    }
}

async fn read_optional_string(path: &Path) -> Result<Option<String>, HarpocratesError> {
    read_optional(path)
        .await?
        .map(|bytes| String::from_utf8(bytes).map_err(HarpocratesError::storage))
        .transpose()
}

async fn ensure_parent(path: &Path) -> Result<(), HarpocratesError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(HarpocratesError::storage)?;
    }
    Ok(())
}

/// Open `path` for writing as an owner-only file.
///
/// New files are created with mode 0600. A file left behind by an earlier
/// run keeps its inode, so its mode is reset before anything is written.
async fn open_private(path: &Path, create_new: bool) -> std::io::Result<tokio::fs::File> {
    let mut options = tokio::fs::OpenOptions::new();
    options.write(true);
    if create_new {
        options.create_new(true);
    } else {
        options.create(true).truncate(true);
    }
    #[cfg(unix)]
    options.mode(0o600);

    let file = options.open(path).await?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        file.set_permissions(std::fs::Permissions::from_mode(0o600))
            .await?;
    }
    Ok(file)
}

/// Replace `path` with `contents` via a temp file and rename.
async fn write_atomic(path: &Path, contents: &[u8]) -> Result<(), HarpocratesError> {
    ensure_parent(path).await?;

    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    let mut file = open_private(&tmp, false)
        .await
        .map_err(HarpocratesError::storage)?;
    file.write_all(contents)
        .await
        .map_err(HarpocratesError::storage)?;
    file.sync_all().await.map_err(HarpocratesError::storage)?;
    drop(file);

    tokio::fs::rename(&tmp, path)
        .await
        .map_err(HarpocratesError::storage)?;
    debug!(path = %path.display(), bytes = contents.len(), "wrote file");
    Ok(())
}

#[async_trait]
impl EscrowStorage for FileStorage {
    async fn read_private_key_envelope(&self) -> Result<Option<String>, HarpocratesError> {
        read_optional_string(&self.private_key_path).await
    }

    async fn write_private_key_envelope(&self, envelope: &str) -> Result<(), HarpocratesError> {
        write_atomic(&self.private_key_path, envelope.as_bytes()).await
    }

    async fn read_master_secret_hash(&self) -> Result<Option<String>, HarpocratesError> {
        Ok(read_optional_string(&self.master_hash_path)
            .await?
            .map(|phc| phc.trim().to_string()))
    }

    async fn write_master_secret_hash(&self, hash: &str) -> Result<(), HarpocratesError> {
        ensure_parent(&self.master_hash_path).await?;

        let mut file = open_private(&self.master_hash_path, true)
            .await
            .map_err(|e| {
                if e.kind() == ErrorKind::AlreadyExists {
                    HarpocratesError::Security(format!(
                        "a master-secret hash already exists at {}",
                        self.master_hash_path.display()
                    ))
                } else {
                    HarpocratesError::storage(e)
                }
            })?;
        file.write_all(format!("{hash}\n").as_bytes())
            .await
            .map_err(HarpocratesError::storage)?;
        file.sync_all().await.map_err(HarpocratesError::storage)
    }
}

#[async_trait]
impl KeyStorage for FileStorage {
    async fn read_public_key_envelope(&self) -> Result<Option<String>, HarpocratesError> {
        read_optional_string(&self.public_key_path).await
    }

    async fn write_public_key_envelope(&self, envelope: &str) -> Result<(), HarpocratesError> {
        write_atomic(&self.public_key_path, envelope.as_bytes()).await
    }
}

#[async_trait]
impl VaultStorage for FileStorage {
    async fn read_vault(&self) -> Result<VaultMap, HarpocratesError> {
        match read_optional(&self.vault_path).await? {
            Some(bytes) if !bytes.is_empty() => {
                rmp_serde::from_slice(&bytes).map_err(HarpocratesError::storage)
            }
            _ => Ok(VaultMap::new()),
        }
    }

    async fn write_vault(&self, vault: &VaultMap) -> Result<(), HarpocratesError> {
        let bytes = rmp_serde::to_vec_named(vault).map_err(HarpocratesError::storage)?;
        write_atomic(&self.vault_path, &bytes).await
    }
}
