// SPDX-FileCopyrightText: 2026 Harpocrates Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the Harpocrates configuration system.

use harpocrates_config::diagnostic::ConfigError;
use harpocrates_config::model::HarpocratesConfig;
use harpocrates_config::{load_and_validate_path, load_and_validate_str, load_config_from_str};

/// Valid TOML with all known fields deserializes successfully.
#[test]
fn valid_toml_deserializes_into_config() {
    let toml = r#"
[server]
bind_address = "127.0.0.1"
port = 9000
cert_path = "/srv/certs/server.pem"
key_path = "/srv/certs/server.key"
idle_timeout_secs = 30

[client]
host = "escrow.internal"
port = 9000
key_bits = 2048

[storage]
data_dir = "/var/lib/harpocrates"
vault_file = "vault.db"

[kdf]
memory_cost = 32768
iterations = 2
parallelism = 1

[logging]
level = "debug"
"#;

    let config = load_config_from_str(toml).expect("valid TOML should deserialize");
    assert_eq!(config.server.bind_address, "127.0.0.1");
    assert_eq!(config.server.port, 9000);
    assert_eq!(config.server.idle_timeout_secs, 30);
    assert_eq!(config.client.host, "escrow.internal");
    assert_eq!(config.client.key_bits, 2048);
    assert_eq!(config.storage.data_dir, "/var/lib/harpocrates");
    assert_eq!(
        config.storage.vault_path(),
        std::path::Path::new("/var/lib/harpocrates/vault.db")
    );
    assert_eq!(
        config.storage.private_key_path(),
        std::path::Path::new("/var/lib/harpocrates/harpocrates")
    );
    assert_eq!(config.kdf.memory_cost, 32768);
    assert_eq!(config.logging.level, "debug");
}

/// Missing optional sections use defaults without error.
#[test]
fn empty_toml_uses_defaults() {
    let config = load_config_from_str("").expect("empty TOML should use defaults");

    assert_eq!(config.server.bind_address, "0.0.0.0");
    assert_eq!(config.server.port, 7878);
    assert_eq!(config.server.idle_timeout_secs, 15);
    assert_eq!(config.client.host, "127.0.0.1");
    assert_eq!(config.client.key_bits, 4096);
    assert_eq!(config.storage.vault_file, "harpocrates.db");
    assert_eq!(config.storage.public_key_file, "harpocrates.pub");
    assert_eq!(config.kdf.iterations, 3);
    assert_eq!(config.logging.level, "info");
}

/// Unknown field in [server] produces an UnknownField error.
#[test]
fn unknown_field_in_server_produces_error() {
    let toml = r#"
[server]
prot = 1234
"#;

    let err = load_config_from_str(toml).expect_err("should reject unknown field");
    let err_str = format!("{err}");
    assert!(
        err_str.contains("unknown field") || err_str.contains("prot"),
        "error should mention unknown field or the bad key, got: {err_str}"
    );
}

/// Unexpected top-level section is rejected by deny_unknown_fields.
#[test]
fn deny_unknown_fields_at_top_level() {
    let toml = r#"
[telemetry]
enabled = true
"#;

    assert!(load_config_from_str(toml).is_err());
}

/// Env-style dotted overrides land in the right section.
#[test]
fn dotted_override_sets_nested_value() {
    use figment::{providers::Serialized, Figment};

    let config: HarpocratesConfig = Figment::new()
        .merge(Serialized::defaults(HarpocratesConfig::default()))
        .merge(("server.bind_address", "10.0.0.5"))
        .extract()
        .expect("should set bind_address via dot notation");

    assert_eq!(config.server.bind_address, "10.0.0.5");
}

/// HARPOCRATES_* variables override file values when loading from a path.
#[test]
fn env_vars_override_file_values() {
    figment::Jail::expect_with(|jail| {
        jail.create_file(
            "custom.toml",
            r#"
[client]
host = "from-file"
"#,
        )?;
        jail.set_env("HARPOCRATES_CLIENT_HOST", "from-env");
        jail.set_env("HARPOCRATES_SERVER_IDLE_TIMEOUT_SECS", "42");
        jail.set_env("HARPOCRATES_MASTER_SECRET", "not-config");

        let path = jail.directory().join("custom.toml");
        let config = load_and_validate_path(&path).expect("config should load");
        assert_eq!(config.client.host, "from-env");
        assert_eq!(config.server.idle_timeout_secs, 42);
        Ok(())
    });
}

/// Unknown key produces an UnknownKey diagnostic with a suggestion.
#[test]
fn diagnostic_suggests_correction() {
    let toml = r#"
[client]
key_bts = 4096
"#;

    let errors = load_and_validate_str(toml).expect_err("should produce errors");
    let has_suggestion = errors.iter().any(|e| {
        matches!(e, ConfigError::UnknownKey { key, suggestion, valid_keys, .. } if {
            key == "key_bts"
                && suggestion.as_deref() == Some("key_bits")
                && valid_keys.contains("host")
        })
    });
    assert!(has_suggestion, "expected UnknownKey for key_bts, got: {errors:?}");
}

/// Validation errors surface through load_and_validate_str.
#[test]
fn validation_errors_are_reported() {
    let toml = r#"
[client]
key_bits = 1024

[kdf]
parallelism = 0
"#;

    let errors = load_and_validate_str(toml).expect_err("should fail validation");
    assert_eq!(errors.len(), 2, "got: {errors:?}");
    assert!(errors.iter().all(|e| matches!(e, ConfigError::Validation { .. })));
}

/// Wrong value types produce InvalidType diagnostics.
#[test]
fn wrong_type_is_reported() {
    let toml = r#"
[server]
port = "seventy"
"#;

    let errors = load_and_validate_str(toml).expect_err("should reject wrong type");
    assert!(
        errors.iter().any(|e| matches!(e, ConfigError::InvalidType { key, .. } if key == "server.port")),
        "got: {errors:?}"
    );
}
