// SPDX-FileCopyrightText: 2026 Harpocrates Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Harpocrates secret-escrow service.
//!
//! This crate provides the error types, the vault data model, and the
//! storage collaborator traits used throughout the workspace.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::{CryptoError, DecodeError, EscrowError, HarpocratesError, VaultError};
pub use traits::{EscrowStorage, KeyStorage, VaultStorage};
pub use types::{VaultEntry, VaultListing, VaultMap, VaultRecord};
