// SPDX-FileCopyrightText: 2026 Harpocrates Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end escrow tests.
//!
//! `EscrowHarness` runs a real TLS escrow server on an ephemeral loopback
//! port, backed by [`MemoryStorage`], and hands out clients connected to it.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use harpocrates_config::model::KdfConfig;
use harpocrates_core::HarpocratesError;
use harpocrates_crypto::{client_digest, MasterSecretHash};
use harpocrates_escrow::{EscrowClient, EscrowServer, EscrowService};
use harpocrates_security::{build_client_config, build_server_config, IntrusionGuard};
use secrecy::SecretString;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::memory_storage::MemoryStorage;
use crate::tls::self_signed_identity;

/// Master secret the harness enrolls unless told otherwise.
pub const DEFAULT_MASTER_SECRET: &str = "correct horse battery staple";

/// Argon2id parameters low enough for fast tests.
pub fn test_kdf() -> KdfConfig {
    KdfConfig {
        memory_cost: 8192,
        iterations: 1,
        parallelism: 1,
    }
}

/// Builder for [`EscrowHarness`].
pub struct EscrowHarnessBuilder {
    master_secret: String,
    escrowed_key: Option<String>,
    idle_timeout: Duration,
}

impl EscrowHarnessBuilder {
    fn new() -> Self {
        Self {
            master_secret: DEFAULT_MASTER_SECRET.to_string(),
            escrowed_key: None,
            idle_timeout: Duration::from_secs(5),
        }
    }

    /// Enroll a different master secret.
    pub fn with_master_secret(mut self, secret: &str) -> Self {
        self.master_secret = secret.to_string();
        self
    }

    /// Start with a private-key envelope already escrowed.
    pub fn with_escrowed_key(mut self, envelope: &str) -> Self {
        self.escrowed_key = Some(envelope.to_string());
        self
    }

    /// Per-connection deadline on the server.
    pub fn with_idle_timeout(mut self, idle_timeout: Duration) -> Self {
        self.idle_timeout = idle_timeout;
        self
    }

    /// Bind the server and start accepting connections.
    pub async fn build(self) -> Result<EscrowHarness, HarpocratesError> {
        use harpocrates_core::EscrowStorage;

        let master_secret = SecretString::from(self.master_secret);
        let hash = MasterSecretHash::enroll(&master_secret, &test_kdf())?;

        let storage = Arc::new(MemoryStorage::with_master_hash(hash.as_phc()));
        if let Some(envelope) = &self.escrowed_key {
            storage.write_private_key_envelope(envelope).await?;
        }

        let guard = IntrusionGuard::new();
        let service = EscrowService::from_storage(storage.clone(), guard.clone()).await?;
        let tls = build_server_config(self_signed_identity("localhost")?)?;

        let listener = EscrowServer::bind("127.0.0.1", 0).await?;
        let addr = listener
            .local_addr()
            .map_err(|e| HarpocratesError::transport("listener has no local address", e))?;

        let shutdown = CancellationToken::new();
        let server = EscrowServer::new(service, tls).with_idle_timeout(self.idle_timeout);
        let task = tokio::spawn(server.serve(listener, shutdown.clone()));

        Ok(EscrowHarness {
            addr,
            storage,
            guard,
            master_secret,
            shutdown,
            task: Some(task),
        })
    }
}

/// A running escrow server for tests. Shuts down on drop.
pub struct EscrowHarness {
    pub addr: SocketAddr,
    pub storage: Arc<MemoryStorage>,
    pub guard: IntrusionGuard,
    master_secret: SecretString,
    shutdown: CancellationToken,
    task: Option<JoinHandle<Result<(), HarpocratesError>>>,
}

impl EscrowHarness {
    pub fn builder() -> EscrowHarnessBuilder {
        EscrowHarnessBuilder::new()
    }

    /// A client presenting its own self-signed certificate.
    pub fn client(&self) -> Result<EscrowClient, HarpocratesError> {
        let tls = build_client_config(self_signed_identity("harpocrates-client")?)?;
        Ok(EscrowClient::new(self.addr.ip().to_string(), self.addr.port(), tls))
    }

    /// The digest a client sends for the enrolled master secret.
    pub fn digest(&self) -> SecretString {
        client_digest(&self.master_secret)
    }

    /// The digest of some other secret.
    pub fn digest_of(secret: &str) -> SecretString {
        client_digest(&SecretString::from(secret.to_string()))
    }

    /// Stop accepting and wait for the accept loop to exit.
    pub async fn shutdown(mut self) -> Result<(), HarpocratesError> {
        self.shutdown.cancel();
        match self.task.take() {
            Some(task) => task
                .await
                .map_err(|e| HarpocratesError::Internal(format!("server task failed: {e}")))?,
            None => Ok(()),
        }
    }
}

impl Drop for EscrowHarness {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}
