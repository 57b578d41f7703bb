// SPDX-FileCopyrightText: 2026 Harpocrates Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Asymmetric crypto for the Harpocrates escrow service.
//!
//! - [`engine`]: RSA key generation and OAEP (SHA-512) encryption.
//! - [`envelope`]: PEM key envelopes used for storage and transport.
//! - [`secret`]: master-secret digests and their Argon2id PHC hashes.

pub mod engine;
pub mod envelope;
pub mod secret;

pub use engine::{CryptoEngine, KeyPair, PublicKey};
pub use envelope::{EncodedKey, KeyHalf};
pub use secret::{client_digest, MasterSecretHash, MIN_MASTER_SECRET_LEN};
