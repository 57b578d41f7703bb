// SPDX-FileCopyrightText: 2026 Harpocrates Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! CSV export of decrypted vault records.
//!
//! Output is a `Name,URL,Password` header followed by one row per record.
//! The caller decrypts everything first, so nothing is written unless every
//! entry decrypted.

use std::io::Write;

use harpocrates_core::{VaultError, VaultRecord};
use secrecy::ExposeSecret;

pub const CSV_HEADER: [&str; 3] = ["Name", "URL", "Password"];

pub fn write_csv<W: Write>(sink: W, records: &[VaultRecord]) -> Result<(), VaultError> {
    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(sink);

    writer.write_record(CSV_HEADER).map_err(export_error)?;
    for record in records {
        writer
            .write_record([
                record.name.as_str(),
                record.url.as_str(),
                record.secret.expose_secret(),
            ])
            .map_err(export_error)?;
    }
    writer
        .flush()
        .map_err(|e| VaultError::Export(e.to_string()))
}

fn export_error(err: csv::Error) -> VaultError {
    VaultError::Export(err.to_string())
}
