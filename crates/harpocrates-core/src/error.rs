// SPDX-FileCopyrightText: 2026 Harpocrates Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Harpocrates escrow service.
//!
//! [`HarpocratesError`] is the error returned across crate boundaries. The
//! domain enums ([`CryptoError`], [`VaultError`], [`EscrowError`]) stay
//! distinct so callers can match on the exact failure.

use thiserror::Error;

/// The primary error type used across all Harpocrates crates.
#[derive(Debug, Error)]
pub enum HarpocratesError {
    /// Configuration errors (invalid TOML, missing required values).
    #[error("configuration error: {0}")]
    Config(String),

    /// Storage collaborator errors (file I/O, serialization of persisted state).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Key generation, envelope decoding, or OAEP failures.
    #[error(transparent)]
    Crypto(#[from] CryptoError),

    /// Vault business-rule and decryption failures.
    #[error(transparent)]
    Vault(#[from] VaultError),

    /// Escrow outcomes reported by the server that the caller must act on.
    #[error(transparent)]
    Escrow(#[from] EscrowError),

    /// Malformed or out-of-contract protocol messages.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// Transport failures (connect, TLS handshake, socket I/O).
    #[error("transport error: {message}")]
    Transport {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// TLS material or credential hashing problems.
    #[error("security error: {0}")]
    Security(String),

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl HarpocratesError {
    /// Wrap any error as a storage failure.
    pub fn storage(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Storage {
            source: Box::new(err),
        }
    }

    /// Wrap an I/O error raised while talking to the peer.
    pub fn transport(message: impl Into<String>, err: std::io::Error) -> Self {
        Self::Transport {
            message: message.into(),
            source: Some(Box::new(err)),
        }
    }
}

/// Socket I/O surfacing through a codec is a transport failure.
impl From<std::io::Error> for HarpocratesError {
    fn from(err: std::io::Error) -> Self {
        let message = err.to_string();
        Self::transport(message, err)
    }
}

/// Failures of the asymmetric crypto engine.
#[derive(Debug, Error)]
pub enum CryptoError {
    /// The requested modulus is too small or the generator failed.
    #[error("key generation failed: {0}")]
    KeyGeneration(String),

    /// The key envelope could not be decoded.
    #[error("key decode failed: {0}")]
    Decode(#[from] DecodeError),

    /// OAEP encryption or decryption failed (bad padding, hash mismatch, wrong key).
    #[error("cryptographic operation failed: {0}")]
    Crypto(String),

    /// Plaintext does not fit in a single OAEP block for this key.
    #[error("payload of {len} bytes exceeds the {max}-byte OAEP limit")]
    PayloadTooLarge { len: usize, max: usize },
}

/// Envelope-level decode failures, kept apart from cryptographic failures.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    /// The bytes are not a well-formed PEM envelope.
    #[error("malformed key envelope: {0}")]
    MalformedEnvelope(String),

    /// The envelope carries a type tag that does not match the expected key half.
    #[error("unexpected envelope label `{0}`")]
    UnexpectedLabel(String),

    /// The envelope is passphrase-protected; no passphrase is ever supplied.
    #[error("key envelope is passphrase-protected")]
    EncryptedEnvelope,

    /// The envelope decoded, but its payload is not a valid RSA key.
    #[error("invalid key material: {0}")]
    InvalidKey(String),
}

/// Failures of the encrypted vault.
#[derive(Debug, Error)]
pub enum VaultError {
    /// An entry with this name already exists.
    #[error("an entry named `{0}` already exists")]
    DuplicateName(String),

    /// No entry with this name exists.
    #[error("no entry named `{0}`")]
    NotFound(String),

    /// The entry could not be encrypted or decrypted.
    #[error("entry `{name}`: {source}")]
    Crypto {
        name: String,
        #[source]
        source: CryptoError,
    },

    /// The escrowed private key does not match the locally stored public key.
    #[error("retrieved private key does not match the local public key")]
    KeyMismatch,

    /// Writing the export sink failed.
    #[error("export failed: {0}")]
    Export(String),
}

/// Non-success replies from the escrow server.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EscrowError {
    /// The server rejected the master-secret digest.
    #[error("server rejected the master secret")]
    WrongCredentials,

    /// The client's address is locked out.
    #[error("this address is temporarily banned by the server")]
    Banned,

    /// The server already holds a private key and will not overwrite it.
    #[error("the server already holds a private key")]
    AlreadyExists,

    /// The server has no private key on record.
    #[error("no private key is escrowed on the server")]
    NoKeyEscrowed,

    /// The server replied with a kind that makes no sense for the request.
    #[error("unexpected reply `{0}`")]
    UnexpectedReply(String),
}
