// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `dbsem run|exclusive <key> -- <command>` - run a command under a lock

use crate::command::{CommandError, CommandTask};
use crate::Store;
use anyhow::Result;
use clap::Args;
use dbsem_core::{Config, ExclusiveOrSharedSemaphore, HolderId};
use dbsem_engine::{
    GatedRunner, GatedRunnerConfig, GatedTask, RetryPolicy, RunError, RunOutcome,
    SemaphoreGatedRunner,
};
use std::process::ExitCode;
use std::time::Duration;

/// Exit status when the lock is held elsewhere (EX_TEMPFAIL)
pub const EXIT_UNAVAILABLE: u8 = 75;

#[derive(Args)]
pub struct RunArgs {
    /// Resource key
    pub key: String,

    /// Slots for the key; defaults to the configured limit
    #[arg(long)]
    pub max: Option<u32>,

    #[command(flatten)]
    pub lease: LeaseArgs,

    /// Command and its arguments
    #[arg(trailing_var_arg = true, required = true)]
    pub command: Vec<String>,
}

#[derive(Args)]
pub struct ExclusiveArgs {
    /// Resource key
    pub key: String,

    /// Give up if readers still hold the key after this long
    #[arg(long, value_parser = humantime::parse_duration)]
    pub wait: Option<Duration>,

    #[command(flatten)]
    pub lease: LeaseArgs,

    /// Command and its arguments
    #[arg(trailing_var_arg = true, required = true)]
    pub command: Vec<String>,
}

#[derive(Args)]
pub struct LeaseArgs {
    /// Lease timeout; renewed while the command runs
    #[arg(long, default_value = "60s", value_parser = humantime::parse_duration)]
    pub timeout: Duration,

    /// Holder context recorded on the lease
    #[arg(long)]
    pub holder: Option<String>,
}

impl LeaseArgs {
    fn holder(&self, config: &Config) -> HolderId {
        match &self.holder {
            Some(holder) => HolderId::new(holder.clone()),
            None => config.holder_id(),
        }
    }
}

pub async fn run(store: Store, config: &Config, args: RunArgs) -> Result<ExitCode> {
    let max = args
        .max
        .unwrap_or_else(|| config.semaphores.max_concurrency(&args.key));
    let task = CommandTask::new(args.command)?;
    let runner = SemaphoreGatedRunner::new(
        store,
        GatedRunnerConfig::new(args.key.clone(), max, args.lease.timeout),
        task,
    )
    .with_holder(args.lease.holder(config))
    .with_runner_config(&config.runner);

    match runner.attempt_to_run().await {
        Ok(RunOutcome::Ran { .. }) => Ok(ExitCode::SUCCESS),
        Ok(_) => {
            eprintln!("dbsem: every slot of '{}' is held", args.key);
            Ok(ExitCode::from(EXIT_UNAVAILABLE))
        }
        Err(e) => exit_for(e),
    }
}

pub async fn exclusive(store: Store, config: &Config, args: ExclusiveArgs) -> Result<ExitCode> {
    let task = CommandTask::new(args.command)?;
    let semaphore = ExclusiveOrSharedSemaphore::new(store).with_holder(args.lease.holder(config));
    let mut runner = GatedRunner::with_config(semaphore, &config.runner);
    if let Some(wait) = args.wait {
        runner = runner.with_policy(RetryPolicy::from_config(&config.runner).with_deadline(wait));
    }

    match runner
        .run_with_exclusive_lock(&args.key, args.lease.timeout, || task.run())
        .await
    {
        Ok(()) => Ok(ExitCode::SUCCESS),
        Err(e) => exit_for(e),
    }
}

/// Map a failed run onto the process exit status
///
/// The child's own status passes through; a busy lock exits with
/// [`EXIT_UNAVAILABLE`]; anything else is an error.
fn exit_for(err: RunError<CommandError>) -> Result<ExitCode> {
    match err {
        RunError::Work(CommandError::Exit { code, .. }) => Ok(ExitCode::from(code)),
        e @ RunError::TimedOut { .. } => {
            eprintln!("dbsem: {}", e);
            Ok(ExitCode::from(EXIT_UNAVAILABLE))
        }
        e if e.is_lock_unavailable() => {
            eprintln!("dbsem: {}", e);
            Ok(ExitCode::from(EXIT_UNAVAILABLE))
        }
        e => Err(e.into()),
    }
}
