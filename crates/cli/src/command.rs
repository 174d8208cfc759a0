// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Child process run as gated work

use async_trait::async_trait;
use dbsem_engine::GatedTask;
use std::process::ExitStatus;
use thiserror::Error;
use tokio::process::Command;
use tracing::debug;

#[derive(Debug, Error)]
pub enum CommandError {
    #[error("no command given")]
    Empty,
    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{program} exited with status {code}")]
    Exit { program: String, code: u8 },
}

/// A program and its arguments, inheriting stdio
#[derive(Clone, Debug)]
pub struct CommandTask {
    program: String,
    args: Vec<String>,
}

impl CommandTask {
    pub fn new(argv: Vec<String>) -> Result<Self, CommandError> {
        let mut argv = argv.into_iter();
        let program = argv.next().ok_or(CommandError::Empty)?;
        Ok(Self {
            program,
            args: argv.collect(),
        })
    }
}

#[async_trait]
impl GatedTask for CommandTask {
    type Error = CommandError;

    async fn run(&self) -> Result<(), CommandError> {
        debug!(program = %self.program, "starting command");
        let status = Command::new(&self.program)
            .args(&self.args)
            .status()
            .await
            .map_err(|source| CommandError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        if status.success() {
            return Ok(());
        }
        Err(CommandError::Exit {
            program: self.program.clone(),
            code: exit_code(status),
        })
    }
}

/// Exit code of a failed child; death by signal reports 1
fn exit_code(status: ExitStatus) -> u8 {
    status
        .code()
        .and_then(|code| u8::try_from(code).ok())
        .filter(|code| *code != 0)
        .unwrap_or(1)
}

#[cfg(test)]
#[path = "command_tests.rs"]
mod tests;
