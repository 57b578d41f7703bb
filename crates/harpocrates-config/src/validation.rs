// SPDX-FileCopyrightText: 2026 Harpocrates Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde attributes,
//! such as valid bind addresses, supported RSA sizes, and KDF minimums.

use crate::diagnostic::ConfigError;
use crate::model::HarpocratesConfig;

/// RSA modulus sizes offered at enrollment.
pub const SUPPORTED_KEY_BITS: &[usize] = &[2048, 4096, 8192];

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &HarpocratesConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    let addr = config.server.bind_address.trim();
    if addr.is_empty() {
        errors.push(ConfigError::Validation {
            message: "server.bind_address must not be empty".to_string(),
        });
    } else if !is_host_like(addr) {
        errors.push(ConfigError::Validation {
            message: format!("server.bind_address `{addr}` is not a valid IP address or hostname"),
        });
    }

    if config.server.port == 0 {
        errors.push(ConfigError::Validation {
            message: "server.port must be between 1 and 65535".to_string(),
        });
    }

    if config.server.idle_timeout_secs == 0 {
        errors.push(ConfigError::Validation {
            message: "server.idle_timeout_secs must be greater than 0".to_string(),
        });
    }

    let host = config.client.host.trim();
    if host.is_empty() {
        errors.push(ConfigError::Validation {
            message: "client.host must not be empty".to_string(),
        });
    } else if !is_host_like(host) {
        errors.push(ConfigError::Validation {
            message: format!("client.host `{host}` is not a valid IP address or hostname"),
        });
    }

    if config.client.port == 0 {
        errors.push(ConfigError::Validation {
            message: "client.port must be between 1 and 65535".to_string(),
        });
    }

    if !SUPPORTED_KEY_BITS.contains(&config.client.key_bits) {
        errors.push(ConfigError::Validation {
            message: format!(
                "client.key_bits must be one of 2048, 4096, 8192, got {}",
                config.client.key_bits
            ),
        });
    }

    if config.storage.data_dir.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "storage.data_dir must not be empty".to_string(),
        });
    }

    if config.kdf.memory_cost < 32768 {
        errors.push(ConfigError::Validation {
            message: format!(
                "kdf.memory_cost must be at least 32768 (32 MiB), got {}",
                config.kdf.memory_cost
            ),
        });
    }

    if config.kdf.iterations < 2 {
        errors.push(ConfigError::Validation {
            message: format!("kdf.iterations must be at least 2, got {}", config.kdf.iterations),
        });
    }

    if config.kdf.parallelism < 1 {
        errors.push(ConfigError::Validation {
            message: format!(
                "kdf.parallelism must be at least 1, got {}",
                config.kdf.parallelism
            ),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Accept valid IPv4, IPv6, or hostname patterns.
fn is_host_like(addr: &str) -> bool {
    addr.parse::<std::net::IpAddr>().is_ok()
        || addr
            .chars()
            .all(|c| c.is_alphanumeric() || c == '.' || c == '-' || c == ':')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(validate_config(&HarpocratesConfig::default()).is_ok());
    }

    #[test]
    fn collects_every_error() {
        let mut config = HarpocratesConfig::default();
        config.server.bind_address = " ".into();
        config.server.idle_timeout_secs = 0;
        config.client.key_bits = 1024;
        config.kdf.iterations = 1;

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 4, "got: {errors:?}");
    }

    #[test]
    fn rejects_unsupported_key_bits() {
        let mut config = HarpocratesConfig::default();
        config.client.key_bits = 3072;

        let errors = validate_config(&config).unwrap_err();
        assert!(errors[0].to_string().contains("client.key_bits"));
    }

    #[test]
    fn rejects_garbage_host() {
        let mut config = HarpocratesConfig::default();
        config.client.host = "not a host!".into();

        let errors = validate_config(&config).unwrap_err();
        assert!(errors[0].to_string().contains("client.host"));
    }

    #[test]
    fn rejects_weak_kdf_memory() {
        let mut config = HarpocratesConfig::default();
        config.kdf.memory_cost = 1024;

        let errors = validate_config(&config).unwrap_err();
        assert!(errors[0].to_string().contains("kdf.memory_cost"));
    }
}
