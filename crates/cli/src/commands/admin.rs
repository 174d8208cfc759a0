// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `dbsem status|gc|release-all` - lease table administration

use crate::output::{self, OutputFormat, StatusView};
use crate::Store;
use anyhow::Result;
use clap::Args;
use dbsem_core::{Config, LeaseStore};
use dbsem_engine::MaintenanceTask;
use std::process::ExitCode;

#[derive(Args)]
pub struct StatusArgs {
    /// Resource key
    pub key: String,

    #[arg(long, value_enum, default_value = "text")]
    pub format: OutputFormat,
}

pub async fn status(store: &Store, args: StatusArgs) -> Result<ExitCode> {
    let status = store.snapshot(&args.key).await?;
    output::print(&StatusView(status), args.format)?;
    Ok(ExitCode::SUCCESS)
}

pub async fn gc(store: &Store, config: &Config) -> Result<ExitCode> {
    let stats = MaintenanceTask::new(store.clone(), config.maintenance.clone())
        .run_once()
        .await?;
    println!(
        "Removed {} expired rows ({} remaining)",
        stats.removed, stats.rows_after
    );
    Ok(ExitCode::SUCCESS)
}

/// Every holder loses its lease; their later releases fail
pub async fn release_all(store: &Store) -> Result<ExitCode> {
    store.release_all().await?;
    println!("Released every lease");
    Ok(ExitCode::SUCCESS)
}
