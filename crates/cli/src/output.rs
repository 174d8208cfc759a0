// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Output formatting for CLI commands

use clap::ValueEnum;
use dbsem_core::ResourceStatus;
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

/// Print output in the specified format
pub fn print<T: Serialize + fmt::Display>(value: &T, format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Text => println!("{}", value),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(value)?),
    }
    Ok(())
}

/// Live leases of one key, one row per lease, then any write intent
#[derive(Serialize)]
#[serde(transparent)]
pub struct StatusView(pub ResourceStatus);

impl fmt::Display for StatusView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status = &self.0;
        if status.is_free() {
            return write!(f, "{}: free", status.key);
        }

        if status.leases.is_empty() {
            write!(f, "{}: write-requested", status.key)?;
        } else {
            write!(f, "{}: {} live", status.key, status.leases.len())?;
        }
        for lease in &status.leases {
            write!(
                f,
                "\n  {:<10} slot {:<3} expires {}  {}",
                lease.pool.to_string(),
                lease.slot,
                lease.expires_at.to_rfc3339(),
                lease.context
            )?;
        }
        if let Some(intent) = &status.write_intent {
            write!(
                f,
                "\n  {:<10} {:<8} expires {}  {}",
                "intent",
                "",
                intent.expires_at.to_rfc3339(),
                intent.context
            )?;
        }
        Ok(())
    }
}
