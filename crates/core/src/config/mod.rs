// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! TOML configuration
//!
//! Lease timeouts are chosen per call, so the file only carries the
//! per-resource concurrency limits, runner polling and maintenance cadence.
//! The write-intent TTL is deliberately absent: it is a fixed constant.

mod limits;
mod runner;

pub use limits::SemaphoreLimits;
pub use runner::{MaintenanceConfig, RunnerConfig};

use crate::lease::{HolderId, MAX_CONTEXT_CHARS};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Holder context recorded on every lease; defaults to `host:pid`
    pub holder: Option<String>,
    pub semaphores: SemaphoreLimits,
    pub runner: RunnerConfig,
    pub maintenance: MaintenanceConfig,
}

impl Config {
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(holder) = &self.holder {
            if holder.trim().is_empty() {
                return Err(ConfigError::Invalid("holder cannot be blank".to_string()));
            }
            if holder.chars().count() > MAX_CONTEXT_CHARS {
                return Err(ConfigError::Invalid(format!(
                    "holder cannot be longer than {} characters",
                    MAX_CONTEXT_CHARS
                )));
            }
        }
        self.semaphores.validate()?;
        self.runner.validate()?;
        self.maintenance.validate()
    }

    pub fn holder_id(&self) -> HolderId {
        match &self.holder {
            Some(holder) => HolderId::new(holder.clone()),
            None => HolderId::for_process(),
        }
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
