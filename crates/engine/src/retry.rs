// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Backoff for polling the exclusive lock's second phase

use dbsem_core::{RunnerConfig, WRITE_INTENT_TTL};
use std::time::Duration;

/// Exponential backoff with an optional overall deadline
#[derive(Clone, Debug, PartialEq)]
pub struct RetryPolicy {
    pub initial: Duration,
    pub max: Duration,
    pub multiplier: f64,
    pub deadline: Option<Duration>,
}

impl RetryPolicy {
    /// Longest pause between polls that still keeps a write intent alive
    pub fn max_poll_delay() -> Duration {
        WRITE_INTENT_TTL / 2
    }

    pub fn from_config(config: &RunnerConfig) -> Self {
        Self {
            initial: config.poll_initial,
            max: config.poll_max,
            multiplier: config.poll_multiplier,
            deadline: config.deadline,
        }
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn delays(&self) -> Backoff {
        Backoff {
            next: self.initial.min(self.cap()),
            cap: self.cap(),
            multiplier: self.multiplier.max(1.0),
        }
    }

    fn cap(&self) -> Duration {
        self.max.min(Self::max_poll_delay())
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&RunnerConfig::default())
    }
}

/// Successive poll delays of a [`RetryPolicy`]
#[derive(Clone, Debug)]
pub struct Backoff {
    next: Duration,
    cap: Duration,
    multiplier: f64,
}

impl Iterator for Backoff {
    type Item = Duration;

    fn next(&mut self) -> Option<Duration> {
        let current = self.next;
        let scaled = self.next.as_nanos() as f64 * self.multiplier;
        self.next = Duration::from_nanos(scaled as u64).min(self.cap);
        Some(current)
    }
}

#[cfg(test)]
#[path = "retry_tests.rs"]
mod tests;
