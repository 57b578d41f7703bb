// SPDX-FileCopyrightText: 2026 Harpocrates Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The escrow protocol's single wire unit.
//!
//! On the wire an [`ExchangeMessage`] is a MessagePack map with three string
//! fields, `PasswordHash`, `PrivateKey` and `Type`. All three are always
//! written; an empty string means the field is absent.

use std::fmt;

use harpocrates_core::HarpocratesError;
use harpocrates_crypto::EncodedKey;
use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Request and response kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    /// Request the escrowed key. Also the tag of the reply that carries it.
    GetPrivateKey,
    /// Escrow a private key.
    StorePrivateKey,
    WrongCredentials,
    Banned,
    /// A key is already escrowed; the store was refused.
    AlreadyExists,
    /// The key was escrowed.
    KeySaved,
}

impl MessageKind {
    /// The tag written on the wire.
    pub fn as_wire(self) -> &'static str {
        match self {
            Self::GetPrivateKey => "GET_PRIVATE_KEY",
            Self::StorePrivateKey => "STORE_PRIVATE_KEY",
            Self::WrongCredentials => "WRONG_CREDENTIALS",
            Self::Banned => "BANNED",
            Self::AlreadyExists => "PRIVATE_KEY_ALREADY_EXISTS",
            Self::KeySaved => "MESSAGE_TYPE_PRIVATE_KEY_SAVED",
        }
    }

    /// Parse a wire tag. The short forms `ALREADY_EXISTS` and `KEY_SAVED`
    /// are accepted too.
    pub fn from_wire(tag: &str) -> Option<Self> {
        match tag {
            "GET_PRIVATE_KEY" => Some(Self::GetPrivateKey),
            "STORE_PRIVATE_KEY" => Some(Self::StorePrivateKey),
            "WRONG_CREDENTIALS" => Some(Self::WrongCredentials),
            "BANNED" => Some(Self::Banned),
            "PRIVATE_KEY_ALREADY_EXISTS" | "ALREADY_EXISTS" => Some(Self::AlreadyExists),
            "MESSAGE_TYPE_PRIVATE_KEY_SAVED" | "KEY_SAVED" => Some(Self::KeySaved),
            _ => None,
        }
    }

    /// Whether clients may send this kind.
    pub fn is_request(self) -> bool {
        matches!(self, Self::GetPrivateKey | Self::StorePrivateKey)
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_wire())
    }
}

/// One request or one reply.
#[derive(Clone, PartialEq, Eq)]
pub struct ExchangeMessage {
    /// Client digest of the master secret. Empty on replies.
    pub password_hash: String,
    /// Private-key envelope (STORE requests and successful GET replies).
    pub private_key: Option<EncodedKey>,
    pub kind: MessageKind,
}

impl ExchangeMessage {
    pub fn get_request(password_hash: impl Into<String>) -> Self {
        Self {
            password_hash: password_hash.into(),
            private_key: None,
            kind: MessageKind::GetPrivateKey,
        }
    }

    pub fn store_request(password_hash: impl Into<String>, private_key: EncodedKey) -> Self {
        Self {
            password_hash: password_hash.into(),
            private_key: Some(private_key),
            kind: MessageKind::StorePrivateKey,
        }
    }

    /// A reply with no payload.
    pub fn reply(kind: MessageKind) -> Self {
        Self {
            password_hash: String::new(),
            private_key: None,
            kind,
        }
    }

    /// The reply to an authorized GET. `None` means no key is escrowed.
    pub fn key_returned(private_key: Option<EncodedKey>) -> Self {
        Self {
            password_hash: String::new(),
            private_key,
            kind: MessageKind::GetPrivateKey,
        }
    }

    /// Check the request invariants: a request kind, a non-empty hash, and a
    /// payload on STORE.
    pub fn validate_request(&self) -> Result<(), HarpocratesError> {
        if !self.kind.is_request() {
            return Err(HarpocratesError::Protocol(format!(
                "`{}` is not a request kind",
                self.kind
            )));
        }
        if self.password_hash.is_empty() {
            return Err(HarpocratesError::Protocol(
                "request carries no password hash".to_string(),
            ));
        }
        if self.kind == MessageKind::StorePrivateKey && self.private_key.is_none() {
            return Err(HarpocratesError::Protocol(
                "STORE_PRIVATE_KEY request carries no private key".to_string(),
            ));
        }
        Ok(())
    }

    pub(crate) fn to_wire(&self) -> WireMessage {
        WireMessage {
            password_hash: self.password_hash.clone(),
            private_key: self
                .private_key
                .as_ref()
                .map(|key| key.as_str().to_string())
                .unwrap_or_default(),
            kind: self.kind.as_wire().to_string(),
        }
    }
}

impl fmt::Debug for ExchangeMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hash = if self.password_hash.is_empty() {
            ""
        } else {
            "[REDACTED]"
        };
        f.debug_struct("ExchangeMessage")
            .field("password_hash", &hash)
            .field("private_key", &self.private_key.as_ref().map(|_| "[REDACTED]"))
            .field("kind", &self.kind)
            .finish()
    }
}

/// The serialized layout.
#[derive(Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
pub(crate) struct WireMessage {
    #[serde(rename = "PasswordHash", default)]
    pub password_hash: String,
    #[serde(rename = "PrivateKey", default)]
    pub private_key: String,
    #[serde(rename = "Type", default)]
    pub kind: String,
}

impl TryFrom<WireMessage> for ExchangeMessage {
    type Error = HarpocratesError;

    fn try_from(wire: WireMessage) -> Result<Self, Self::Error> {
        let kind = MessageKind::from_wire(&wire.kind).ok_or_else(|| {
            HarpocratesError::Protocol(format!("unknown message type `{}`", wire.kind))
        })?;
        let private_key =
            (!wire.private_key.is_empty()).then(|| EncodedKey::new(wire.private_key.as_str()));
        Ok(Self {
            password_hash: wire.password_hash.clone(),
            private_key,
            kind,
        })
    }
}
