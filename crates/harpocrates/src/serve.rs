// SPDX-FileCopyrightText: 2026 Harpocrates Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `harpocrates serve` and `harpocrates server-init`.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use harpocrates_config::HarpocratesConfig;
use harpocrates_core::{EscrowStorage, HarpocratesError};
use harpocrates_crypto::MasterSecretHash;
use harpocrates_escrow::{EscrowServer, EscrowService};
use harpocrates_security::{build_server_config, IntrusionGuard, TlsIdentity};
use harpocrates_storage::FileStorage;
use tracing::info;

use crate::shutdown;

/// Run the escrow server until SIGINT or SIGTERM.
pub async fn run_serve(config: HarpocratesConfig) -> Result<(), HarpocratesError> {
    let server = &config.server;
    let identity = TlsIdentity::from_pem_files(
        Path::new(&server.cert_path),
        Path::new(&server.key_path),
    )?;
    let tls = build_server_config(identity)?;

    let storage = Arc::new(FileStorage::new(&config.storage));
    let service = EscrowService::from_storage(storage, IntrusionGuard::new()).await?;

    let listener = EscrowServer::bind(&server.bind_address, server.port).await?;
    let cancel = shutdown::install_signal_handler();

    EscrowServer::new(service, tls)
        .with_idle_timeout(Duration::from_secs(server.idle_timeout_secs))
        .serve(listener, cancel)
        .await?;

    info!("escrow server stopped");
    Ok(())
}

/// Hash the operator's master secret and record it. Refuses to replace an
/// existing hash.
pub async fn run_server_init(config: HarpocratesConfig) -> Result<(), HarpocratesError> {
    let storage = FileStorage::new(&config.storage);
    if storage.read_master_secret_hash().await?.is_some() {
        return Err(HarpocratesError::Security(format!(
            "a master-secret hash already exists at {}",
            storage.master_hash_path().display()
        )));
    }

    let secret = harpocrates_vault::read_master_secret_with_confirm()?;
    let kdf = config.kdf.clone();
    let hash = tokio::task::spawn_blocking(move || MasterSecretHash::enroll(&secret, &kdf))
        .await
        .map_err(|e| HarpocratesError::Internal(format!("hashing task failed: {e}")))??;

    storage.write_master_secret_hash(hash.as_phc()).await?;
    info!(path = %storage.master_hash_path().display(), "master-secret hash recorded");
    eprintln!(
        "Master-secret hash written to {}",
        storage.master_hash_path().display()
    );
    Ok(())
}
