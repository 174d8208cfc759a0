// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::ConfigError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Maximum concurrency per counting-semaphore resource key
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SemaphoreLimits {
    /// Limit for keys without an explicit entry
    pub default_max_concurrency: u32,
    pub limits: BTreeMap<String, u32>,
}

impl SemaphoreLimits {
    /// The same limit for every key
    pub fn uniform(max_concurrency: u32) -> Self {
        Self {
            default_max_concurrency: max_concurrency,
            limits: BTreeMap::new(),
        }
    }

    pub fn with_limit(mut self, key: impl Into<String>, max_concurrency: u32) -> Self {
        self.limits.insert(key.into(), max_concurrency);
        self
    }

    pub fn max_concurrency(&self, key: &str) -> u32 {
        self.limits
            .get(key)
            .copied()
            .unwrap_or(self.default_max_concurrency)
    }

    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if self.default_max_concurrency == 0 {
            return Err(ConfigError::Invalid(
                "default_max_concurrency must be at least 1".to_string(),
            ));
        }
        if let Some((key, _)) = self.limits.iter().find(|(_, n)| **n == 0) {
            return Err(ConfigError::Invalid(format!(
                "max concurrency for '{}' must be at least 1",
                key
            )));
        }
        Ok(())
    }
}

impl Default for SemaphoreLimits {
    fn default() -> Self {
        Self::uniform(1)
    }
}
