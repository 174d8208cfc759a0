// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Lock-guarded execution on top of the dbsem semaphores
//!
//! [`GatedRunner`] polls for a lock, keeps its lease alive while the work
//! runs and releases it afterwards. [`SemaphoreGatedRunner`] does the same
//! for periodic tasks that should skip a round rather than wait.

mod error;
mod gated;
mod guard;
mod keepalive;
mod maintenance;
mod retry;
mod runner;
mod trigger;

pub use error::RunError;
pub use gated::{
    lane_key, AlwaysOpen, Gate, GatedRunnerConfig, GatedTask, RunOutcome, SemaphoreGatedRunner,
};
pub use maintenance::{CoordinationStats, MaintenanceTask};
pub use retry::{Backoff, RetryPolicy};
pub use runner::GatedRunner;
pub use trigger::Trigger;
