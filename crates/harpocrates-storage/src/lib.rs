// SPDX-FileCopyrightText: 2026 Harpocrates Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! File-backed persistence for the Harpocrates escrow service.
//!
//! [`FileStorage`] implements every storage collaborator trait on top of a
//! handful of files under one data directory.

pub mod file;

pub use file::FileStorage;
