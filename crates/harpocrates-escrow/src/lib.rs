// SPDX-FileCopyrightText: 2026 Harpocrates Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Private-key escrow protocol for the Harpocrates service.
//!
//! One request and one reply per TLS connection. The server releases or
//! accepts the single escrowed private key only after the client proves
//! knowledge of the master secret, and locks out peers that keep guessing.

pub mod client;
pub mod codec;
pub mod message;
pub mod server;

pub use client::EscrowClient;
pub use codec::{ExchangeCodec, MAX_FRAME_LEN};
pub use message::{ExchangeMessage, MessageKind};
pub use server::{EscrowServer, EscrowService};
