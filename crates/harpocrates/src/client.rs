// SPDX-FileCopyrightText: 2026 Harpocrates Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Client-side commands: enrollment, vault operations and key generation.

use std::io::{BufRead, IsTerminal, Write};
use std::path::Path;
use std::sync::Arc;

use harpocrates_config::HarpocratesConfig;
use harpocrates_core::HarpocratesError;
use harpocrates_crypto::{client_digest, CryptoEngine};
use harpocrates_escrow::EscrowClient;
use harpocrates_security::{build_client_config, TlsIdentity};
use harpocrates_storage::FileStorage;
use harpocrates_vault::Vault;
use secrecy::{ExposeSecret, SecretString};
use tracing::info;

fn connect(config: &HarpocratesConfig) -> Result<EscrowClient, HarpocratesError> {
    let client = &config.client;
    let identity =
        TlsIdentity::from_pem_files(Path::new(&client.cert_path), Path::new(&client.key_path))?;
    Ok(EscrowClient::new(
        client.host.clone(),
        client.port,
        build_client_config(identity)?,
    ))
}

fn master_digest() -> Result<SecretString, HarpocratesError> {
    Ok(client_digest(&harpocrates_vault::read_master_secret()?))
}

async fn open_vault(config: &HarpocratesConfig) -> Result<Vault, HarpocratesError> {
    let client = connect(config)?;
    let digest = master_digest()?;
    let storage = Arc::new(FileStorage::new(&config.storage));
    harpocrates_vault::unlock(&client, &digest, storage.as_ref(), storage.clone()).await
}

pub async fn run_enroll(config: HarpocratesConfig) -> Result<(), HarpocratesError> {
    let client = connect(&config)?;
    let digest = master_digest()?;
    let storage = FileStorage::new(&config.storage);
    let engine = CryptoEngine::new(config.client.key_bits);

    eprintln!("Generating a {}-bit key pair...", engine.bits());
    client.enroll(&engine, &digest, &storage).await?;
    eprintln!(
        "Private key escrowed; public key written to {}",
        storage.public_key_path().display()
    );
    Ok(())
}

pub async fn run_store(
    config: HarpocratesConfig,
    name: &str,
    url: &str,
) -> Result<(), HarpocratesError> {
    let mut vault = open_vault(&config).await?;
    let secret = read_entry_secret(name)?;
    vault.store(name, url, &secret).await
}

pub async fn run_get(config: HarpocratesConfig, name: &str) -> Result<(), HarpocratesError> {
    let vault = open_vault(&config).await?;
    let record = vault.get(name)?;
    println!("{}", record.secret.expose_secret());
    Ok(())
}

pub async fn run_delete(config: HarpocratesConfig, name: &str) -> Result<(), HarpocratesError> {
    let mut vault = open_vault(&config).await?;
    vault.delete(name).await
}

pub async fn run_list(config: HarpocratesConfig) -> Result<(), HarpocratesError> {
    let vault = open_vault(&config).await?;
    let mut listing = vault.list();
    listing.sort_by(|a, b| a.name.cmp(&b.name));
    for entry in listing {
        println!("{}\t{}", entry.name, entry.url);
    }
    Ok(())
}

pub async fn run_export(
    config: HarpocratesConfig,
    output: Option<&Path>,
) -> Result<(), HarpocratesError> {
    let vault = open_vault(&config).await?;
    let count = match output {
        Some(path) => {
            let file = create_private_file(path)?;
            vault.export_all(std::io::BufWriter::new(file))?
        }
        None => vault.export_all(std::io::stdout().lock())?,
    };
    info!(entries = count, "export complete");
    Ok(())
}

/// Print a fresh key pair, private half first.
pub async fn run_keygen(bits: usize) -> Result<(), HarpocratesError> {
    let engine = CryptoEngine::new(bits);
    let pair = tokio::task::spawn_blocking(move || engine.generate_key_pair())
        .await
        .map_err(|e| HarpocratesError::Internal(format!("key generation task failed: {e}")))??;

    let mut out = std::io::stdout().lock();
    write!(out, "{}", pair.encode_private()?.as_str())?;
    write!(out, "{}", pair.encode_public()?.as_str())?;
    out.flush()?;
    Ok(())
}

/// Read an entry secret without echo on a TTY, or one line from piped stdin.
fn read_entry_secret(name: &str) -> Result<SecretString, HarpocratesError> {
    let secret = if std::io::stdin().is_terminal() {
        eprint!("Secret for {name}: ");
        rpassword::read_password()
            .map_err(|e| HarpocratesError::Security(format!("failed to read secret: {e}")))?
    } else {
        let mut line = String::new();
        std::io::stdin().lock().read_line(&mut line)?;
        line.trim_end_matches(['\r', '\n']).to_string()
    };

    if secret.is_empty() {
        return Err(HarpocratesError::Security("empty secret not allowed".to_string()));
    }
    Ok(SecretString::from(secret))
}

fn create_private_file(path: &Path) -> Result<std::fs::File, HarpocratesError> {
    let mut options = std::fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    options.open(path).map_err(HarpocratesError::storage)
}
