// SPDX-FileCopyrightText: 2026 Harpocrates Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! PEM key envelopes.
//!
//! An [`EncodedKey`] is the textual form of one half of a key pair. The PEM
//! label is the envelope's type tag; the base64 body is the DER payload.
//! Envelope problems surface as [`DecodeError`] so callers can tell a broken
//! envelope apart from a key that simply does not decrypt.

use std::fmt;

use harpocrates_core::DecodeError;
use rsa::pkcs8::der::pem;
use zeroize::Zeroizing;

/// PKCS#1 private key label. Private envelopes are always written with it.
pub const PKCS1_PRIVATE_LABEL: &str = "RSA PRIVATE KEY";

/// PKCS#8 private key label, accepted on decode.
pub const PKCS8_PRIVATE_LABEL: &str = "PRIVATE KEY";

/// SubjectPublicKeyInfo label. Public envelopes are always written with it.
pub const SPKI_PUBLIC_LABEL: &str = "PUBLIC KEY";

/// PKCS#1 public key label, accepted on decode (with either a PKCS#1 or SPKI body).
pub const PKCS1_PUBLIC_LABEL: &str = "RSA PUBLIC KEY";

const ENCRYPTED_PKCS8_LABEL: &str = "ENCRYPTED PRIVATE KEY";
const ENCRYPTED_PROC_TYPE: &str = "Proc-Type: 4,ENCRYPTED";

/// Which half of a key pair an envelope carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyHalf {
    Private,
    Public,
}

impl KeyHalf {
    fn from_label(label: &str) -> Option<Self> {
        match label {
            PKCS1_PRIVATE_LABEL | PKCS8_PRIVATE_LABEL | ENCRYPTED_PKCS8_LABEL => {
                Some(Self::Private)
            }
            SPKI_PUBLIC_LABEL | PKCS1_PUBLIC_LABEL => Some(Self::Public),
            _ => None,
        }
    }
}

/// A PEM envelope holding one key half.
///
/// The text is zeroed on drop; private envelopes are redacted from `Debug`.
#[derive(Clone)]
pub struct EncodedKey {
    text: Zeroizing<String>,
}

/// DER payload of an envelope together with its label.
pub(crate) struct DerBody {
    pub label: String,
    pub der: Zeroizing<Vec<u8>>,
}

impl EncodedKey {
    /// Wrap envelope text without inspecting it.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: Zeroizing::new(text.into()),
        }
    }

    pub fn as_str(&self) -> &str {
        self.text.as_str()
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.text.as_bytes()
    }

    /// The label of the first `-----BEGIN ...-----` line, if there is one.
    pub fn label(&self) -> Option<&str> {
        let start = self.text.find("-----BEGIN ")? + "-----BEGIN ".len();
        let rest = &self.text[start..];
        let end = rest.find("-----")?;
        Some(&rest[..end])
    }

    /// The key half named by the label, if the label is recognised.
    pub fn half(&self) -> Option<KeyHalf> {
        self.label().and_then(KeyHalf::from_label)
    }

    /// Whether the envelope is passphrase-protected (legacy PEM encryption
    /// header or an encrypted PKCS#8 label).
    pub fn is_encrypted(&self) -> bool {
        self.text.contains(ENCRYPTED_PROC_TYPE) || self.label() == Some(ENCRYPTED_PKCS8_LABEL)
    }

    /// Strip the PEM armour.
    ///
    /// Passphrase-protected envelopes are rejected with
    /// [`DecodeError::EncryptedEnvelope`]; no passphrase is ever prompted for.
    pub(crate) fn der_body(&self) -> Result<DerBody, DecodeError> {
        if self.is_encrypted() {
            return Err(DecodeError::EncryptedEnvelope);
        }

        let (label, der) = pem::decode_vec(self.text.trim().as_bytes())
            .map_err(|e| DecodeError::MalformedEnvelope(e.to_string()))?;

        Ok(DerBody {
            label: label.to_string(),
            der: Zeroizing::new(der),
        })
    }
}

impl PartialEq for EncodedKey {
    fn eq(&self, other: &Self) -> bool {
        self.text.as_str() == other.text.as_str()
    }
}

impl Eq for EncodedKey {}

impl From<String> for EncodedKey {
    fn from(text: String) -> Self {
        Self::new(text)
    }
}

impl fmt::Debug for EncodedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("EncodedKey");
        s.field("label", &self.label());
        match self.half() {
            Some(KeyHalf::Public) => s.field("text", &self.text.as_str()),
            _ => s.field("text", &"[REDACTED]"),
        };
        s.finish()
    }
}
