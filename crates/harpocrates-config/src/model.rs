// SPDX-FileCopyrightText: 2026 Harpocrates Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Harpocrates escrow service.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Top-level Harpocrates configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct HarpocratesConfig {
    /// Escrow server listener settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Escrow client settings.
    #[serde(default)]
    pub client: ClientConfig,

    /// Local file locations.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Argon2id parameters for the master-secret hash.
    #[serde(default)]
    pub kdf: KdfConfig,

    /// Log output settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Escrow server configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Address to bind the listener to.
    #[serde(default = "default_server_bind_address")]
    pub bind_address: String,

    /// TCP port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,

    /// PEM certificate chain presented to clients.
    #[serde(default = "default_server_cert_path")]
    pub cert_path: String,

    /// PEM private key matching `cert_path`.
    #[serde(default = "default_server_key_path")]
    pub key_path: String,

    /// Deadline for a single accepted connection, in seconds.
    #[serde(default = "default_idle_timeout_secs")]
    pub idle_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_server_bind_address(),
            port: default_port(),
            cert_path: default_server_cert_path(),
            key_path: default_server_key_path(),
            idle_timeout_secs: default_idle_timeout_secs(),
        }
    }
}

fn default_server_bind_address() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    7878
}

fn default_idle_timeout_secs() -> u64 {
    15
}

fn default_server_cert_path() -> String {
    cert_dir().join("server.pem").to_string_lossy().into_owned()
}

fn default_server_key_path() -> String {
    cert_dir().join("server.key").to_string_lossy().into_owned()
}

/// Escrow client configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ClientConfig {
    /// Escrow server host name or address.
    #[serde(default = "default_client_host")]
    pub host: String,

    /// Escrow server port.
    #[serde(default = "default_port")]
    pub port: u16,

    /// PEM certificate the client presents during the handshake.
    #[serde(default = "default_client_cert_path")]
    pub cert_path: String,

    /// PEM private key matching `cert_path`.
    #[serde(default = "default_client_key_path")]
    pub key_path: String,

    /// RSA modulus size used at enrollment (2048, 4096 or 8192).
    #[serde(default = "default_key_bits")]
    pub key_bits: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: default_client_host(),
            port: default_port(),
            cert_path: default_client_cert_path(),
            key_path: default_client_key_path(),
            key_bits: default_key_bits(),
        }
    }
}

fn default_client_host() -> String {
    "127.0.0.1".to_string()
}

fn default_client_cert_path() -> String {
    cert_dir().join("client.pem").to_string_lossy().into_owned()
}

fn default_client_key_path() -> String {
    cert_dir().join("client.key").to_string_lossy().into_owned()
}

fn default_key_bits() -> usize {
    4096
}

fn cert_dir() -> PathBuf {
    dirs::config_dir()
        .map(|p| p.join("harpocrates").join("certs"))
        .unwrap_or_else(|| PathBuf::from("certs"))
}

/// Local file locations for escrow and vault state.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Directory holding every file below.
    #[serde(default = "default_data_dir")]
    pub data_dir: String,

    /// Vault database file name.
    #[serde(default = "default_vault_file")]
    pub vault_file: String,

    /// Escrowed private-key envelope file name (server side).
    #[serde(default = "default_private_key_file")]
    pub private_key_file: String,

    /// Local public-key envelope file name (client side).
    #[serde(default = "default_public_key_file")]
    pub public_key_file: String,

    /// Master-secret hash file name (server side).
    #[serde(default = "default_master_hash_file")]
    pub master_hash_file: String,
}

impl StorageConfig {
    pub fn vault_path(&self) -> PathBuf {
        PathBuf::from(&self.data_dir).join(&self.vault_file)
    }

    pub fn private_key_path(&self) -> PathBuf {
        PathBuf::from(&self.data_dir).join(&self.private_key_file)
    }

    pub fn public_key_path(&self) -> PathBuf {
        PathBuf::from(&self.data_dir).join(&self.public_key_file)
    }

    pub fn master_hash_path(&self) -> PathBuf {
        PathBuf::from(&self.data_dir).join(&self.master_hash_file)
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            vault_file: default_vault_file(),
            private_key_file: default_private_key_file(),
            public_key_file: default_public_key_file(),
            master_hash_file: default_master_hash_file(),
        }
    }
}

fn default_data_dir() -> String {
    dirs::data_dir()
        .map(|p| p.join("harpocrates"))
        .unwrap_or_else(|| PathBuf::from("."))
        .to_string_lossy()
        .into_owned()
}

fn default_vault_file() -> String {
    "harpocrates.db".to_string()
}

fn default_private_key_file() -> String {
    "harpocrates".to_string()
}

fn default_public_key_file() -> String {
    "harpocrates.pub".to_string()
}

fn default_master_hash_file() -> String {
    "master_secret.phc".to_string()
}

/// Argon2id parameters for hashing the master secret at enrollment.
///
/// Verification reads the parameters back from the stored PHC string, so
/// changing these only affects hashes created afterwards.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct KdfConfig {
    /// Argon2id memory cost in KiB (default: 65536 = 64 MiB).
    #[serde(default = "default_kdf_memory_cost")]
    pub memory_cost: u32,

    /// Argon2id iteration count (default: 3).
    #[serde(default = "default_kdf_iterations")]
    pub iterations: u32,

    /// Argon2id parallelism lanes (default: 4).
    #[serde(default = "default_kdf_parallelism")]
    pub parallelism: u32,
}

impl Default for KdfConfig {
    fn default() -> Self {
        Self {
            memory_cost: default_kdf_memory_cost(),
            iterations: default_kdf_iterations(),
            parallelism: default_kdf_parallelism(),
        }
    }
}

fn default_kdf_memory_cost() -> u32 {
    65536 // 64 MiB per OWASP recommendation
}

fn default_kdf_iterations() -> u32 {
    3
}

fn default_kdf_parallelism() -> u32 {
    4
}

/// Log output configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}
