// SPDX-FileCopyrightText: 2026 Harpocrates Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Encrypted vault for the Harpocrates escrow service.
//!
//! Each secret is encrypted on its own under the client's RSA public key.
//! The matching private key lives only on the escrow server and is fetched
//! into memory when the vault is unlocked.

pub mod export;
pub mod prompt;
pub mod unlock;
pub mod vault;

pub use prompt::{read_master_secret, read_master_secret_with_confirm, MASTER_SECRET_ENV_VAR};
pub use unlock::{unlock, verify_local_public_key};
pub use vault::Vault;
