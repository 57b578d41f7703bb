// SPDX-FileCopyrightText: 2026 Harpocrates Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Harpocrates integration tests.
//!
//! # Components
//!
//! - [`MemoryStorage`] - in-memory implementation of every storage trait
//! - [`self_signed_identity`] - throwaway TLS identity for loopback tests
//! - [`EscrowHarness`] - a real TLS escrow server on an ephemeral port

pub mod harness;
pub mod memory_storage;
pub mod tls;

pub use harness::{EscrowHarness, EscrowHarnessBuilder};
pub use memory_storage::MemoryStorage;
pub use tls::self_signed_identity;
