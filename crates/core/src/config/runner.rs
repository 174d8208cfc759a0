// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::ConfigError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How gated runners poll and keep leases alive
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    /// First delay between exclusive-lock polls
    #[serde(with = "humantime_serde")]
    pub poll_initial: Duration,
    /// Longest delay between polls; clamped below half the intent TTL
    #[serde(with = "humantime_serde")]
    pub poll_max: Duration,
    pub poll_multiplier: f64,
    /// Give up waiting for the exclusive lock after this long
    #[serde(with = "humantime_serde", default)]
    pub deadline: Option<Duration>,
    /// Extend a held lease every `timeout / keepalive_fraction`
    pub keepalive_fraction: u32,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            poll_initial: Duration::from_millis(100),
            poll_max: Duration::from_secs(2),
            poll_multiplier: 2.0,
            deadline: None,
            keepalive_fraction: 3,
        }
    }
}

impl RunnerConfig {
    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if self.poll_initial.is_zero() {
            return Err(ConfigError::Invalid(
                "runner.poll_initial must be greater than zero".to_string(),
            ));
        }
        if self.poll_max < self.poll_initial {
            return Err(ConfigError::Invalid(
                "runner.poll_max cannot be shorter than runner.poll_initial".to_string(),
            ));
        }
        if self.poll_multiplier.is_nan() || self.poll_multiplier < 1.0 {
            return Err(ConfigError::Invalid(
                "runner.poll_multiplier must be at least 1.0".to_string(),
            ));
        }
        if self.keepalive_fraction < 2 {
            return Err(ConfigError::Invalid(
                "runner.keepalive_fraction must be at least 2".to_string(),
            ));
        }
        Ok(())
    }
}

/// Cadence of expired-row garbage collection
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MaintenanceConfig {
    #[serde(with = "humantime_serde")]
    pub interval: Duration,
}

impl Default for MaintenanceConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(300),
        }
    }
}

impl MaintenanceConfig {
    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if self.interval.is_zero() {
            return Err(ConfigError::Invalid(
                "maintenance.interval must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}
