// SPDX-FileCopyrightText: 2026 Harpocrates Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Throwaway TLS identities.

use harpocrates_core::HarpocratesError;
use harpocrates_security::TlsIdentity;

/// A fresh self-signed certificate for `name` and its key.
pub fn self_signed_identity(name: &str) -> Result<TlsIdentity, HarpocratesError> {
    let certified = rcgen::generate_simple_self_signed(vec![name.to_string()])
        .map_err(|e| HarpocratesError::Security(format!("certificate generation failed: {e}")))?;
    TlsIdentity::from_pem(
        certified.cert.pem().as_bytes(),
        certified.signing_key.serialize_pem().as_bytes(),
    )
}
