// SPDX-FileCopyrightText: 2026 Harpocrates Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Harpocrates - single-tenant secret escrow.
//!
//! This is the binary entry point: the escrow server, client enrollment,
//! and the encrypted vault commands.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod client;
mod serve;
mod shutdown;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use colored::Colorize;
use harpocrates_config::HarpocratesConfig;
use harpocrates_core::HarpocratesError;

/// Harpocrates - single-tenant secret escrow.
#[derive(Parser, Debug)]
#[command(name = "harpocrates", version, about, long_about = None)]
struct Cli {
    /// Read configuration from this file instead of the XDG hierarchy.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the escrow server.
    Serve,
    /// Record the master-secret hash on the server host.
    ServerInit,
    /// Generate a key pair and escrow its private half.
    Enroll,
    /// Add a secret to the vault. The secret is read from the TTY or stdin.
    Store {
        name: String,
        url: String,
    },
    /// Print a secret from the vault.
    Get {
        name: String,
    },
    /// Remove a secret from the vault.
    Delete {
        name: String,
    },
    /// List vault entries (names and URLs only).
    List,
    /// Export every vault entry as CSV.
    Export {
        /// Write to this file instead of stdout.
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
    /// Print a freshly generated key pair.
    Keygen {
        /// Modulus size; defaults to `client.key_bits`.
        #[arg(long)]
        bits: Option<usize>,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let loaded = match &cli.config {
        Some(path) => harpocrates_config::load_and_validate_path(path),
        None => harpocrates_config::load_and_validate(),
    };
    let config = match loaded {
        Ok(config) => config,
        Err(errors) => {
            harpocrates_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    init_tracing(&config.logging.level);

    if let Err(e) = run(cli.command, config).await {
        eprintln!("{} {e}", "error:".red());
        std::process::exit(1);
    }
}

async fn run(command: Commands, config: HarpocratesConfig) -> Result<(), HarpocratesError> {
    match command {
        Commands::Serve => serve::run_serve(config).await,
        Commands::ServerInit => serve::run_server_init(config).await,
        Commands::Enroll => client::run_enroll(config).await,
        Commands::Store { name, url } => client::run_store(config, &name, &url).await,
        Commands::Get { name } => client::run_get(config, &name).await,
        Commands::Delete { name } => client::run_delete(config, &name).await,
        Commands::List => client::run_list(config).await,
        Commands::Export { output } => client::run_export(config, output.as_deref()).await,
        Commands::Keygen { bits } => {
            client::run_keygen(bits.unwrap_or(config.client.key_bits)).await
        }
    }
}

/// Initializes the tracing subscriber with the given log level.
///
/// Logs go to stderr so command output on stdout stays clean.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("harpocrates={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_names(false)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[cfg(not(target_env = "msvc"))]
    fn jemalloc_is_active() {
        // Only jemalloc supports advancing the epoch.
        use tikv_jemalloc_ctl::{epoch, stats};
        epoch::advance().unwrap();
        let allocated = stats::allocated::read().unwrap();
        assert!(allocated > 0, "jemalloc should report non-zero allocation");
    }

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_store_with_global_config() {
        let cli = Cli::try_parse_from([
            "harpocrates",
            "store",
            "mail",
            "https://mail.example",
            "--config",
            "/tmp/h.toml",
        ])
        .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/h.toml")));
        assert!(matches!(
            cli.command,
            Commands::Store { ref name, ref url } if name == "mail" && url == "https://mail.example"
        ));
    }

    #[test]
    fn parses_server_init_in_kebab_case() {
        let cli = Cli::try_parse_from(["harpocrates", "server-init"]).unwrap();
        assert!(matches!(cli.command, Commands::ServerInit));
    }

    #[test]
    fn export_output_is_optional() {
        let cli = Cli::try_parse_from(["harpocrates", "export"]).unwrap();
        assert!(matches!(cli.command, Commands::Export { output: None }));

        let cli = Cli::try_parse_from(["harpocrates", "export", "-o", "out.csv"]).unwrap();
        assert!(matches!(cli.command, Commands::Export { output: Some(_) }));
    }

    #[test]
    fn binary_loads_config_defaults() {
        let config = harpocrates_config::load_and_validate_str("").unwrap();
        assert_eq!(config.client.key_bits, 4096);
    }
}
