// SPDX-FileCopyrightText: 2026 Harpocrates Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Escrow client: one request, one reply, no retries.

use std::sync::Arc;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use harpocrates_core::{EscrowError, HarpocratesError, KeyStorage};
use harpocrates_crypto::{CryptoEngine, EncodedKey, KeyPair};
use harpocrates_security::server_name;
use secrecy::{ExposeSecret, SecretString};
use tokio::net::TcpStream;
use tokio_rustls::rustls::ClientConfig;
use tokio_rustls::TlsConnector;
use tokio_util::codec::Framed;
use tracing::{debug, info};

use crate::codec::ExchangeCodec;
use crate::message::{ExchangeMessage, MessageKind};
use crate::server::DEFAULT_IDLE_TIMEOUT;

/// Talks to one escrow server.
#[derive(Clone)]
pub struct EscrowClient {
    host: String,
    port: u16,
    connector: TlsConnector,
    timeout: Duration,
}

impl std::fmt::Debug for EscrowClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EscrowClient")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl EscrowClient {
    pub fn new(host: impl Into<String>, port: u16, tls: Arc<ClientConfig>) -> Self {
        Self {
            host: host.into(),
            port,
            connector: TlsConnector::from(tls),
            timeout: DEFAULT_IDLE_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Send `request` and return the server's reply uninterpreted.
    pub async fn exchange(
        &self,
        request: ExchangeMessage,
    ) -> Result<ExchangeMessage, HarpocratesError> {
        tokio::time::timeout(self.timeout, self.round_trip(request))
            .await
            .map_err(|_| HarpocratesError::Timeout {
                duration: self.timeout,
            })?
    }

    async fn round_trip(
        &self,
        request: ExchangeMessage,
    ) -> Result<ExchangeMessage, HarpocratesError> {
        let addr = format!("{}:{}", self.host, self.port);
        let tcp = TcpStream::connect(&addr)
            .await
            .map_err(|e| HarpocratesError::transport(format!("failed to connect to {addr}"), e))?;
        let tls = self
            .connector
            .connect(server_name(&self.host)?, tcp)
            .await
            .map_err(|e| HarpocratesError::transport(format!("TLS handshake with {addr} failed"), e))?;

        let mut framed = Framed::new(tls, ExchangeCodec::new());
        debug!(%addr, kind = %request.kind, "sending request");
        framed.send(request).await?;

        let reply = framed.next().await.ok_or_else(|| {
            HarpocratesError::Protocol(format!("{addr} closed the connection without replying"))
        })??;
        debug!(%addr, kind = %reply.kind, "received reply");
        Ok(reply)
    }

    /// Escrow `private_key`. Succeeds only on `KEY_SAVED`.
    pub async fn store_private_key(
        &self,
        digest: &SecretString,
        private_key: EncodedKey,
    ) -> Result<(), HarpocratesError> {
        let request = ExchangeMessage::store_request(digest.expose_secret(), private_key);
        let reply = self.exchange(request).await?;
        match reply.kind {
            MessageKind::KeySaved => Ok(()),
            other => Err(reply_error(other).into()),
        }
    }

    /// Fetch the escrowed private-key envelope.
    pub async fn fetch_private_key(
        &self,
        digest: &SecretString,
    ) -> Result<EncodedKey, HarpocratesError> {
        let reply = self
            .exchange(ExchangeMessage::get_request(digest.expose_secret()))
            .await?;
        match (reply.kind, reply.private_key) {
            (MessageKind::GetPrivateKey, Some(key)) => Ok(key),
            (MessageKind::GetPrivateKey, None) => Err(EscrowError::NoKeyEscrowed.into()),
            (other, _) => Err(reply_error(other).into()),
        }
    }

    /// Generate a key pair, escrow its private half, and keep the public half
    /// locally. Nothing is persisted unless the server saved the key.
    pub async fn enroll(
        &self,
        engine: &CryptoEngine,
        digest: &SecretString,
        keys: &dyn KeyStorage,
    ) -> Result<KeyPair, HarpocratesError> {
        let engine = *engine;
        let pair = tokio::task::spawn_blocking(move || engine.generate_key_pair())
            .await
            .map_err(|e| HarpocratesError::Internal(format!("key generation task failed: {e}")))??;
        self.store_private_key(digest, pair.encode_private()?).await?;
        keys.write_public_key_envelope(pair.encode_public()?.as_str())
            .await?;
        info!(bits = pair.bits(), "enrolled: private key escrowed, public key saved");
        Ok(pair)
    }
}

fn reply_error(kind: MessageKind) -> EscrowError {
    match kind {
        MessageKind::WrongCredentials => EscrowError::WrongCredentials,
        MessageKind::Banned => EscrowError::Banned,
        MessageKind::AlreadyExists => EscrowError::AlreadyExists,
        other => EscrowError::UnexpectedReply(other.to_string()),
    }
}
