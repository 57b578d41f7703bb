// SPDX-FileCopyrightText: 2026 Harpocrates Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Master-secret acquisition via TTY prompt or HARPOCRATES_MASTER_SECRET environment variable.

use harpocrates_core::HarpocratesError;
use secrecy::SecretString;

/// The environment variable name for providing the master secret.
pub const MASTER_SECRET_ENV_VAR: &str = "HARPOCRATES_MASTER_SECRET";

/// Get the master secret from the environment or an interactive TTY prompt.
///
/// Priority:
/// 1. `HARPOCRATES_MASTER_SECRET` environment variable (for headless use)
/// 2. Interactive TTY prompt via `rpassword`
pub fn read_master_secret() -> Result<SecretString, HarpocratesError> {
    if let Some(secret) = from_env() {
        return Ok(secret);
    }

    if std::io::IsTerminal::is_terminal(&std::io::stdin()) {
        let secret = prompt("Master secret: ")?;
        if secret.is_empty() {
            return Err(HarpocratesError::Security(
                "empty master secret not allowed".to_string(),
            ));
        }
        return Ok(SecretString::from(secret));
    }

    Err(not_provided())
}

/// Like [`read_master_secret`], but asks twice on a TTY (for enrollment).
pub fn read_master_secret_with_confirm() -> Result<SecretString, HarpocratesError> {
    if let Some(secret) = from_env() {
        return Ok(secret);
    }

    if std::io::IsTerminal::is_terminal(&std::io::stdin()) {
        let first = prompt("New master secret: ")?;
        let second = prompt("Confirm master secret: ")?;
        if first != second {
            return Err(HarpocratesError::Security(
                "master secrets do not match".to_string(),
            ));
        }
        if first.is_empty() {
            return Err(HarpocratesError::Security(
                "empty master secret not allowed".to_string(),
            ));
        }
        return Ok(SecretString::from(first));
    }

    Err(not_provided())
}

fn from_env() -> Option<SecretString> {
    match std::env::var(MASTER_SECRET_ENV_VAR) {
        Ok(secret) if !secret.is_empty() => Some(SecretString::from(secret)),
        _ => None,
    }
}

fn prompt(label: &str) -> Result<String, HarpocratesError> {
    eprint!("{label}");
    rpassword::read_password()
        .map_err(|e| HarpocratesError::Security(format!("failed to read master secret: {e}")))
}

fn not_provided() -> HarpocratesError {
    HarpocratesError::Security(format!(
        "No master secret provided. Set {MASTER_SECRET_ENV_VAR} or run interactively."
    ))
}
