// SPDX-FileCopyrightText: 2026 Harpocrates Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! RSA key generation and OAEP encryption.
//!
//! Every encryption uses OAEP with SHA-512 for both the label hash and MGF1.
//! Payloads must fit in a single OAEP block: `key_bytes - 2 * 64 - 2`.

use std::fmt;

use harpocrates_core::{CryptoError, DecodeError};
use rand::rngs::OsRng;
use rsa::pkcs1::{DecodeRsaPrivateKey, DecodeRsaPublicKey, EncodeRsaPrivateKey};
use rsa::pkcs8::{DecodePrivateKey, DecodePublicKey, EncodePublicKey, LineEnding};
use rsa::traits::PublicKeyParts;
use rsa::{Oaep, RsaPrivateKey, RsaPublicKey};
use sha2::Sha512;
use tracing::debug;
use zeroize::Zeroizing;

use crate::envelope::{
    EncodedKey, PKCS1_PRIVATE_LABEL, PKCS1_PUBLIC_LABEL, PKCS8_PRIVATE_LABEL, SPKI_PUBLIC_LABEL,
};

/// Output size of SHA-512 in bytes.
const OAEP_HASH_LEN: usize = 64;

/// Stateless RSA engine configured with a modulus size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CryptoEngine {
    bits: usize,
}

impl CryptoEngine {
    /// Smallest modulus the engine will generate.
    pub const MIN_BITS: usize = 2048;

    pub fn new(bits: usize) -> Self {
        Self { bits }
    }

    pub fn bits(&self) -> usize {
        self.bits
    }

    /// Generate a fresh key pair at the configured size.
    pub fn generate_key_pair(&self) -> Result<KeyPair, CryptoError> {
        if self.bits < Self::MIN_BITS {
            return Err(CryptoError::KeyGeneration(format!(
                "{} bits is below the {}-bit minimum",
                self.bits,
                Self::MIN_BITS
            )));
        }

        debug!(bits = self.bits, "generating RSA key pair");
        let private = RsaPrivateKey::new(&mut OsRng, self.bits)
            .map_err(|e| CryptoError::KeyGeneration(e.to_string()))?;
        Ok(KeyPair { private })
    }

    /// Largest plaintext, in bytes, that fits a single OAEP block at `bits`.
    pub fn max_payload(bits: usize) -> usize {
        (bits / 8).saturating_sub(2 * OAEP_HASH_LEN + 2)
    }
}

/// An RSA key pair. The public half is derived from the private key.
#[derive(Clone, PartialEq, Eq)]
pub struct KeyPair {
    private: RsaPrivateKey,
}

impl KeyPair {
    /// Modulus size in bits.
    pub fn bits(&self) -> usize {
        self.private.size() * 8
    }

    pub fn public_key(&self) -> PublicKey {
        PublicKey(self.private.to_public_key())
    }

    /// Whether `public` is the public half of this pair.
    pub fn matches(&self, public: &PublicKey) -> bool {
        self.private.n() == public.0.n() && self.private.e() == public.0.e()
    }

    /// Encode the private half as a PKCS#1 `RSA PRIVATE KEY` envelope.
    pub fn encode_private(&self) -> Result<EncodedKey, CryptoError> {
        let pem = self
            .private
            .to_pkcs1_pem(LineEnding::LF)
            .map_err(|e| CryptoError::Crypto(format!("PKCS#1 encoding failed: {e}")))?;
        Ok(EncodedKey::new(pem.as_str()))
    }

    /// Encode the public half as an SPKI `PUBLIC KEY` envelope.
    pub fn encode_public(&self) -> Result<EncodedKey, CryptoError> {
        self.public_key().encode()
    }

    /// Decode a private envelope (PKCS#1 or unencrypted PKCS#8).
    pub fn decode_private(envelope: &EncodedKey) -> Result<Self, CryptoError> {
        let body = envelope.der_body()?;
        let private = match body.label.as_str() {
            PKCS1_PRIVATE_LABEL => RsaPrivateKey::from_pkcs1_der(&body.der)
                .map_err(|e| DecodeError::InvalidKey(e.to_string()))?,
            PKCS8_PRIVATE_LABEL => RsaPrivateKey::from_pkcs8_der(&body.der)
                .map_err(|e| DecodeError::InvalidKey(e.to_string()))?,
            other => return Err(DecodeError::UnexpectedLabel(other.to_string()).into()),
        };
        private
            .validate()
            .map_err(|e| DecodeError::InvalidKey(e.to_string()))?;
        Ok(Self { private })
    }

    /// Decrypt a single OAEP block.
    pub fn decrypt(&self, ciphertext: &[u8]) -> Result<Zeroizing<Vec<u8>>, CryptoError> {
        self.private
            .decrypt(Oaep::new::<Sha512>(), ciphertext)
            .map(Zeroizing::new)
            .map_err(|e| CryptoError::Crypto(format!("OAEP decryption failed: {e}")))
    }
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPair")
            .field("bits", &self.bits())
            .field("private", &"[REDACTED]")
            .finish()
    }
}

/// The public half of a key pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicKey(RsaPublicKey);

impl PublicKey {
    pub fn bits(&self) -> usize {
        self.0.size() * 8
    }

    /// Largest plaintext this key can encrypt.
    pub fn max_payload(&self) -> usize {
        CryptoEngine::max_payload(self.bits())
    }

    pub fn encode(&self) -> Result<EncodedKey, CryptoError> {
        let pem = self
            .0
            .to_public_key_pem(LineEnding::LF)
            .map_err(|e| CryptoError::Crypto(format!("SPKI encoding failed: {e}")))?;
        Ok(EncodedKey::new(pem))
    }

    /// Decode a public envelope.
    ///
    /// `RSA PUBLIC KEY` envelopes are accepted with either an SPKI body or a
    /// PKCS#1 body, since both have been written under that label.
    pub fn decode(envelope: &EncodedKey) -> Result<Self, CryptoError> {
        let body = envelope.der_body()?;
        let public = match body.label.as_str() {
            SPKI_PUBLIC_LABEL => RsaPublicKey::from_public_key_der(&body.der)
                .map_err(|e| DecodeError::InvalidKey(e.to_string()))?,
            PKCS1_PUBLIC_LABEL => RsaPublicKey::from_public_key_der(&body.der)
                .or_else(|_| RsaPublicKey::from_pkcs1_der(&body.der))
                .map_err(|e| DecodeError::InvalidKey(e.to_string()))?,
            other => return Err(DecodeError::UnexpectedLabel(other.to_string()).into()),
        };
        Ok(Self(public))
    }

    /// Encrypt `plaintext` with OAEP/SHA-512.
    ///
    /// Oversized input is rejected with [`CryptoError::PayloadTooLarge`].
    pub fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>, CryptoError> {
        let max = self.max_payload();
        if plaintext.len() > max {
            return Err(CryptoError::PayloadTooLarge {
                len: plaintext.len(),
                max,
            });
        }

        self.0
            .encrypt(&mut OsRng, Oaep::new::<Sha512>(), plaintext)
            .map_err(|e| CryptoError::Crypto(format!("OAEP encryption failed: {e}")))
    }
}
