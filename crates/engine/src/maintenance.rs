// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Periodic sweep of expired lease rows

use crate::trigger::Trigger;
use dbsem_core::{LeaseStore, MaintenanceConfig, StoreError};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info};

/// Row counts around one sweep
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CoordinationStats {
    pub rows_before: usize,
    pub rows_after: usize,
    pub removed: usize,
}

/// Background garbage collection for a lease store
pub struct MaintenanceTask<S> {
    store: S,
    config: MaintenanceConfig,
}

impl<S: LeaseStore> MaintenanceTask<S> {
    pub fn new(store: S, config: MaintenanceConfig) -> Self {
        Self { store, config }
    }

    pub fn config(&self) -> &MaintenanceConfig {
        &self.config
    }

    /// Delete every expired row once
    pub async fn run_once(&self) -> Result<CoordinationStats, StoreError> {
        let rows_before = self.store.row_count().await?;
        let removed = self.store.collect_garbage().await?;
        let rows_after = self.store.row_count().await?;
        let stats = CoordinationStats {
            rows_before,
            rows_after,
            removed,
        };
        info!(
            rows_before = stats.rows_before,
            rows_after = stats.rows_after,
            removed = stats.removed,
            "lease garbage collected"
        );
        Ok(stats)
    }

    /// Sweep every `config.interval` until shutdown
    pub fn spawn(self, shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
        let task = Arc::new(self);
        Trigger::every(task.config.interval).spawn(shutdown, move || {
            let task = Arc::clone(&task);
            async move {
                if let Err(e) = task.run_once().await {
                    error!(error = %e, "lease garbage collection failed");
                }
            }
        })
    }
}

#[cfg(test)]
#[path = "maintenance_tests.rs"]
mod tests;
