// SPDX-FileCopyrightText: 2026 Harpocrates Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Connection-level security for the Harpocrates escrow service.
//!
//! Provides the per-peer brute-force [`IntrusionGuard`] and the rustls
//! configurations used by both ends of the escrow transport.

pub mod guard;
pub mod tls;

pub use guard::{AttemptPermit, BanRecord, IntrusionGuard};
pub use tls::{build_client_config, build_server_config, server_name, TlsIdentity};
