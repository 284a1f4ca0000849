//! Tessera CLI — Command-line interface for light and ledger-anchored DIDs.
//!
//! Subcommands: init, mnemonic, keys, light, resolve, demo.

mod commands;
mod config;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use config::{LoggingConfig, TesseraConfig};

/// Tessera — decentralized identifiers and verifiable credentials.
#[derive(Parser, Debug)]
#[command(name = "tessera", version, about, long_about = None)]
struct Cli {
    /// Path to the configuration file (TOML).
    #[arg(short, long, global = true, default_value = "tessera.toml")]
    config: PathBuf,

    /// Override the log level (trace, debug, info, warn, error).
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Write a default configuration file.
    Init(commands::init::InitArgs),
    /// Generate a new mnemonic seed phrase.
    Mnemonic(commands::mnemonic::MnemonicArgs),
    /// Derive the key set of a seed phrase and show its full DID document.
    Keys(commands::keys::KeysArgs),
    /// Build a light DID from a seed phrase.
    Light(commands::light::LightArgs),
    /// Resolve a light DID offline and inspect its published credentials.
    Resolve(commands::resolve::ResolveArgs),
    /// Walk through registration, attestation and verification on an
    /// in-memory ledger.
    Demo(commands::demo::DemoArgs),
}

fn init_tracing(logging: &LoggingConfig, level_override: Option<&str>) {
    let level = level_override.unwrap_or(&logging.level);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    // Logs go to stderr; stdout carries command output.
    if logging.is_json() {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(true)
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = TesseraConfig::load(&cli.config)?;
    init_tracing(&config.logging, cli.log_level.as_deref());

    match &cli.command {
        Commands::Init(args) => commands::init::run(args, &cli.config),
        Commands::Mnemonic(args) => commands::mnemonic::run(args),
        Commands::Keys(args) => commands::keys::run(args),
        Commands::Light(args) => commands::light::run(args),
        Commands::Resolve(args) => commands::resolve::run(args, &config).await,
        Commands::Demo(args) => commands::demo::run(args, &config).await,
    }
}
