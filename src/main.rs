mod console;
mod table;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use console::Console;
use critter_core::config::parse_addr;
use critter_core::{CritterConfig, DaycareService, MemoryStore, StoreConfig, http_api};
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "critter", version, about = "Pet daycare scheduling backend")]
struct Cli {
    /// TOML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// SQLite database path, or `:memory:`
    #[arg(long, global = true)]
    db: Option<String>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP API
    Serve {
        /// Listen address, e.g. 127.0.0.1:3000
        #[arg(long)]
        addr: Option<String>,
    },
    /// Interactive console on stdin/stdout (default)
    Shell,
}

fn init_tracing(config: &CritterConfig, verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = std::env::var("CRITTER_LOG")
        .ok()
        .and_then(|raw| EnvFilter::try_new(raw).ok())
        .or_else(|| EnvFilter::try_from_default_env().ok())
        .or_else(|| {
            config
                .log_filter
                .as_deref()
                .and_then(|raw| EnvFilter::try_new(raw).ok())
        })
        .unwrap_or_else(|| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn load_config(cli: &Cli) -> Result<CritterConfig> {
    let mut config = match &cli.config {
        Some(path) => CritterConfig::load(path)?,
        None => CritterConfig::default(),
    };
    config.apply_env()?;
    if let Some(db) = &cli.db {
        config.store = StoreConfig::from_db_arg(db);
    }
    if let Some(Command::Serve { addr: Some(addr) }) = &cli.command {
        config.http_addr = parse_addr(addr)?;
    }
    Ok(config)
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;
    init_tracing(&config, cli.verbose);

    match cli.command.unwrap_or(Command::Shell) {
        Command::Serve { .. } => {
            let service = DaycareService::new(config.open_store()?);
            let runtime = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()
                .context("failed to start async runtime")?;
            runtime
                .block_on(http_api::serve(config.http_addr, service))
                .with_context(|| format!("HTTP server on {} failed", config.http_addr))?;
        }
        Command::Shell => {
            let mut console = match config.store {
                StoreConfig::Memory => Console::in_memory(Arc::new(MemoryStore::new())),
                StoreConfig::Sqlite { .. } => Console::new(DaycareService::new(config.open_store()?)),
            };
            info!(store = ?config.store, "starting console");
            let stdin = io::stdin();
            console.run(stdin.lock(), &mut io::stdout().lock())?;
        }
    }
    Ok(())
}
