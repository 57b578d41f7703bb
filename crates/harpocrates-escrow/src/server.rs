// SPDX-FileCopyrightText: 2026 Harpocrates Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Escrow server.
//!
//! [`EscrowService`] decides the reply to one request. [`EscrowServer`]
//! accepts TLS connections and runs each one as its own task:
//!
//! ```text
//! ACCEPTED -> DECODED -> BANNED
//!                     -> WRONG_CREDENTIALS
//!                     -> AUTHORIZED -> GET   -> key returned
//!                                   -> STORE -> ALREADY_EXISTS | KEY_SAVED
//! ```
//!
//! Exactly one reply is written per connection, then the connection closes.
//! A malformed request closes the connection with no reply.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use harpocrates_core::{EscrowStorage, HarpocratesError};
use harpocrates_crypto::{EncodedKey, MasterSecretHash};
use harpocrates_security::IntrusionGuard;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Mutex;
use tokio_rustls::rustls::ServerConfig;
use tokio_rustls::TlsAcceptor;
use tokio_util::codec::Framed;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::codec::ExchangeCodec;
use crate::message::{ExchangeMessage, MessageKind};

/// Deadline for one accepted connection, handshake through reply.
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(15);

/// Request handling, independent of the transport.
///
/// Cloning is cheap; clones share the guard, the storage and the key slot.
#[derive(Clone)]
pub struct EscrowService {
    storage: Arc<dyn EscrowStorage>,
    guard: IntrusionGuard,
    master_hash: MasterSecretHash,
    /// Serializes the "already exists" check with the write on STORE.
    key_slot: Arc<Mutex<()>>,
}

impl EscrowService {
    pub fn new(
        storage: Arc<dyn EscrowStorage>,
        guard: IntrusionGuard,
        master_hash: MasterSecretHash,
    ) -> Self {
        Self {
            storage,
            guard,
            master_hash,
            key_slot: Arc::new(Mutex::new(())),
        }
    }

    /// Build a service from the hash recorded at enrollment.
    pub async fn from_storage(
        storage: Arc<dyn EscrowStorage>,
        guard: IntrusionGuard,
    ) -> Result<Self, HarpocratesError> {
        let phc = storage.read_master_secret_hash().await?.ok_or_else(|| {
            HarpocratesError::Config(
                "no master-secret hash on record; run `harpocrates server-init` first".to_string(),
            )
        })?;
        Ok(Self::new(storage, guard, MasterSecretHash::from_phc(&phc)?))
    }

    pub fn guard(&self) -> &IntrusionGuard {
        &self.guard
    }

    /// Decide the reply to `request` from the peer identified by `identity`.
    ///
    /// An `Err` means the connection must be closed without a reply: the
    /// request was malformed, or storage failed.
    pub async fn handle(
        &self,
        identity: &str,
        request: ExchangeMessage,
    ) -> Result<ExchangeMessage, HarpocratesError> {
        request.validate_request()?;

        // Ban check, verification and the recorded outcome form one step per peer.
        let attempt = self.guard.begin_attempt(identity).await;
        if self.guard.is_banned(identity) {
            warn!(peer = identity, kind = %request.kind, "refusing banned peer");
            return Ok(ExchangeMessage::reply(MessageKind::Banned));
        }

        if !self.verify(&request.password_hash).await? {
            let record = self.guard.record_failure(identity);
            warn!(
                peer = identity,
                fail_count = record.fail_count,
                banned_until = %record.banned_until,
                "wrong credentials"
            );
            return Ok(ExchangeMessage::reply(MessageKind::WrongCredentials));
        }
        self.guard.record_success(identity);
        drop(attempt);

        match request.kind {
            MessageKind::GetPrivateKey => self.get_private_key(identity).await,
            MessageKind::StorePrivateKey => {
                let key = request.private_key.ok_or_else(|| {
                    HarpocratesError::Protocol("STORE_PRIVATE_KEY without a key".to_string())
                })?;
                self.store_private_key(identity, key).await
            }
            other => Err(HarpocratesError::Protocol(format!(
                "`{other}` is not a request kind"
            ))),
        }
    }

    /// Argon2 verification is CPU-bound, so it runs off the async workers.
    async fn verify(&self, digest: &str) -> Result<bool, HarpocratesError> {
        let hash = self.master_hash.clone();
        let digest = digest.to_string();
        tokio::task::spawn_blocking(move || hash.verify(&digest))
            .await
            .map_err(|e| HarpocratesError::Internal(format!("verification task failed: {e}")))
    }

    async fn get_private_key(&self, identity: &str) -> Result<ExchangeMessage, HarpocratesError> {
        let envelope = self.storage.read_private_key_envelope().await?;
        match &envelope {
            Some(_) => info!(peer = identity, "returned escrowed private key"),
            None => info!(peer = identity, "GET with no private key escrowed"),
        }
        Ok(ExchangeMessage::key_returned(envelope.map(EncodedKey::new)))
    }

    async fn store_private_key(
        &self,
        identity: &str,
        key: EncodedKey,
    ) -> Result<ExchangeMessage, HarpocratesError> {
        let _slot = self.key_slot.lock().await;

        if self.storage.read_private_key_envelope().await?.is_some() {
            info!(peer = identity, "refused STORE: a private key is already escrowed");
            return Ok(ExchangeMessage::reply(MessageKind::AlreadyExists));
        }

        self.storage.write_private_key_envelope(key.as_str()).await?;
        info!(peer = identity, "escrowed private key");
        Ok(ExchangeMessage::reply(MessageKind::KeySaved))
    }
}

/// TLS listener in front of an [`EscrowService`].
pub struct EscrowServer {
    service: EscrowService,
    acceptor: TlsAcceptor,
    idle_timeout: Duration,
}

impl EscrowServer {
    pub fn new(service: EscrowService, tls: Arc<ServerConfig>) -> Self {
        Self {
            service,
            acceptor: TlsAcceptor::from(tls),
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
        }
    }

    pub fn with_idle_timeout(mut self, idle_timeout: Duration) -> Self {
        self.idle_timeout = idle_timeout;
        self
    }

    /// Bind a listener on `host:port`.
    pub async fn bind(host: &str, port: u16) -> Result<TcpListener, HarpocratesError> {
        let addr = format!("{host}:{port}");
        TcpListener::bind(&addr)
            .await
            .map_err(|e| HarpocratesError::transport(format!("failed to bind escrow server to {addr}"), e))
    }

    /// Accept connections until `shutdown` is cancelled.
    ///
    /// In-flight connections are not cancelled; each ends on its own deadline.
    pub async fn serve(
        self,
        listener: TcpListener,
        shutdown: CancellationToken,
    ) -> Result<(), HarpocratesError> {
        if let Ok(addr) = listener.local_addr() {
            info!("escrow server listening on {addr}");
        }

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    info!("escrow server shutting down");
                    return Ok(());
                }
                accepted = listener.accept() => match accepted {
                    Ok((stream, peer)) => {
                        let service = self.service.clone();
                        let acceptor = self.acceptor.clone();
                        let idle_timeout = self.idle_timeout;
                        tokio::spawn(async move {
                            handle_connection(service, acceptor, stream, peer, idle_timeout).await;
                        });
                    }
                    Err(e) => warn!("failed to accept connection: {e}"),
                },
            }
        }
    }
}

/// Peer identity for the guard: the IP address, without the ephemeral port.
pub fn peer_identity(peer: &SocketAddr) -> String {
    peer.ip().to_string()
}

async fn handle_connection(
    service: EscrowService,
    acceptor: TlsAcceptor,
    stream: TcpStream,
    peer: SocketAddr,
    idle_timeout: Duration,
) {
    debug!(%peer, "accepted connection");
    let identity = peer_identity(&peer);

    let exchange = async {
        let tls = acceptor
            .accept(stream)
            .await
            .map_err(|e| HarpocratesError::transport("TLS handshake failed", e))?;
        let mut framed = Framed::new(tls, ExchangeCodec::new());

        let request = framed.next().await.ok_or_else(|| {
            HarpocratesError::Protocol("connection closed before a request arrived".to_string())
        })??;
        debug!(%peer, kind = %request.kind, "decoded request");

        let reply = service.handle(&identity, request).await?;
        let kind = reply.kind;
        framed.send(reply).await?;
        framed.close().await?;
        Ok::<MessageKind, HarpocratesError>(kind)
    };

    match tokio::time::timeout(idle_timeout, exchange).await {
        Ok(Ok(kind)) => debug!(%peer, %kind, "replied"),
        Ok(Err(e)) => warn!(%peer, "closing connection without reply: {e}"),
        Err(_) => warn!(%peer, "connection exceeded the {idle_timeout:?} deadline"),
    }
}
