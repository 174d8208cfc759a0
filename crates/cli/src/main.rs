// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! dbsem - cluster semaphores from the shell

mod command;
mod commands;
mod output;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use commands::{admin, locked};
use dbsem_core::Config;
use dbsem_storage::{open_file_store, FileLeaseStore, TracedLeaseStore};
use std::path::PathBuf;
use std::process::ExitCode;

pub(crate) type Store = TracedLeaseStore<FileLeaseStore>;

#[derive(Parser)]
#[command(
    name = "dbsem",
    version,
    about = "dbsem - Lease-based semaphores shared through one lease table"
)]
struct Cli {
    /// Lease table file shared by every coordinating process
    #[arg(long, global = true, env = "DBSEM_STORE")]
    store: Option<PathBuf>,

    /// TOML configuration file
    #[arg(long, global = true, env = "DBSEM_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the live leases of a resource key
    Status(admin::StatusArgs),
    /// Delete expired lease rows
    Gc,
    /// Force-expire every lease and write intent
    ReleaseAll,
    /// Run a command while holding a counting-semaphore slot
    Run(locked::RunArgs),
    /// Run a command while holding the exclusive lock
    Exclusive(locked::ExclusiveArgs),
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    setup_logging();
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    let store = open_store(cli.store)?;

    match cli.command {
        Commands::Status(args) => admin::status(&store, args).await,
        Commands::Gc => admin::gc(&store, &config).await,
        Commands::ReleaseAll => admin::release_all(&store).await,
        Commands::Run(args) => locked::run(store, &config, args).await,
        Commands::Exclusive(args) => locked::exclusive(store, &config, args).await,
    }
}

fn setup_logging() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn open_store(path: Option<PathBuf>) -> Result<Store> {
    let path = match path {
        Some(path) => path,
        None => default_store_path()?,
    };
    let store = open_file_store(path.clone())
        .with_context(|| format!("cannot open lease store {}", path.display()))?;
    Ok(TracedLeaseStore::new(store))
}

/// `<state dir>/dbsem/leases.json`, or the local data dir where there is no state dir
fn default_store_path() -> Result<PathBuf> {
    let base = dirs::state_dir()
        .or_else(dirs::data_local_dir)
        .ok_or_else(|| anyhow::anyhow!("no state directory found, pass --store"))?;
    Ok(base.join("dbsem").join("leases.json"))
}
