// SPDX-FileCopyrightText: 2026 Harpocrates Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Collaborator trait definitions.
//!
//! All traits use `#[async_trait]` so they stay usable behind `Arc<dyn _>`.

pub mod storage;

pub use storage::{EscrowStorage, KeyStorage, VaultStorage};
