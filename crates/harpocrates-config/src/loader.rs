// SPDX-FileCopyrightText: 2026 Harpocrates Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./harpocrates.toml` > `~/.config/harpocrates/harpocrates.toml`
//! > `/etc/harpocrates/harpocrates.toml` with environment variable overrides via
//! `HARPOCRATES_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::HarpocratesConfig;

/// System-wide configuration file.
pub const SYSTEM_CONFIG_PATH: &str = "/etc/harpocrates/harpocrates.toml";

/// Configuration file looked up in the working directory.
pub const LOCAL_CONFIG_FILE: &str = "harpocrates.toml";

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/harpocrates/harpocrates.toml` (system-wide)
/// 3. `~/.config/harpocrates/harpocrates.toml` (user XDG config)
/// 4. `./harpocrates.toml` (local directory)
/// 5. `HARPOCRATES_*` environment variables
pub fn load_config() -> Result<HarpocratesConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env).
///
/// Used for testing and explicit configuration.
pub fn load_config_from_str(toml_content: &str) -> Result<HarpocratesConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(HarpocratesConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<HarpocratesConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(HarpocratesConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used internally for config loading.
///
/// Returns the Figment before extraction so callers can inspect metadata.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(HarpocratesConfig::default()))
        .merge(Toml::file(SYSTEM_CONFIG_PATH))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("harpocrates").join(LOCAL_CONFIG_FILE))
                .unwrap_or_default(),
        ))
        .merge(Toml::file(LOCAL_CONFIG_FILE))
        .merge(env_provider())
}

/// Create the environment variable provider using explicit `map()` for section-to-dot mapping.
///
/// Uses `Env::map()` NOT `Env::split("_")` because key names contain
/// underscores: `HARPOCRATES_SERVER_BIND_ADDRESS` must map to
/// `server.bind_address`, not `server.bind.address`.
///
/// `HARPOCRATES_MASTER_SECRET` is not configuration and is filtered out.
fn env_provider() -> Env {
    Env::prefixed("HARPOCRATES_")
        .filter(|key| !key.as_str().eq_ignore_ascii_case("master_secret"))
        .map(|key| map_env_key(&key.as_str().to_ascii_lowercase()).into())
}

/// Map a lowercased, prefix-stripped env var name to a dotted config path.
pub(crate) fn map_env_key(key: &str) -> String {
    const SECTIONS: &[&str] = &["server", "client", "storage", "kdf", "logging"];

    for section in SECTIONS {
        if let Some(rest) = key.strip_prefix(section).and_then(|r| r.strip_prefix('_')) {
            return format!("{section}.{rest}");
        }
    }
    key.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_keys_map_to_sections() {
        assert_eq!(map_env_key("server_bind_address"), "server.bind_address");
        assert_eq!(map_env_key("client_key_bits"), "client.key_bits");
        assert_eq!(map_env_key("storage_data_dir"), "storage.data_dir");
        assert_eq!(map_env_key("kdf_memory_cost"), "kdf.memory_cost");
        assert_eq!(map_env_key("logging_level"), "logging.level");
    }

    #[test]
    fn unknown_env_keys_pass_through() {
        assert_eq!(map_env_key("serverless"), "serverless");
        assert_eq!(map_env_key("bogus"), "bogus");
    }
}
