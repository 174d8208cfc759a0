// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Process-local lease table

use super::{Access, LeaseTable, TableBackend, TableStore};
use crate::clock::{Clock, SystemClock};
use crate::error::StoreError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::{Arc, Mutex};

/// A [`LeaseTable`] behind a mutex, shared by clones
#[derive(Clone, Debug)]
pub struct MemoryBackend<C: Clock = SystemClock> {
    table: Arc<Mutex<LeaseTable>>,
    clock: C,
}

impl<C: Clock> MemoryBackend<C> {
    pub fn new(clock: C) -> Self {
        Self {
            table: Arc::new(Mutex::new(LeaseTable::new())),
            clock,
        }
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }
}

#[async_trait]
impl<C: Clock> TableBackend for MemoryBackend<C> {
    async fn with_table<R, F>(&self, _access: Access, op: F) -> Result<R, StoreError>
    where
        F: FnOnce(&mut LeaseTable, DateTime<Utc>) -> R + Send + 'static,
        R: Send + 'static,
    {
        let mut table = self.table.lock().unwrap_or_else(|e| e.into_inner());
        Ok(op(&mut table, self.clock.now()))
    }
}

/// Lease store for a single process, or for tests driven by a `FakeClock`
pub type MemoryLeaseStore<C = SystemClock> = TableStore<MemoryBackend<C>>;

impl<C: Clock> TableStore<MemoryBackend<C>> {
    pub fn in_memory(clock: C) -> Self {
        TableStore::new(MemoryBackend::new(clock))
    }
}

impl Default for TableStore<MemoryBackend<SystemClock>> {
    fn default() -> Self {
        Self::in_memory(SystemClock)
    }
}

#[cfg(test)]
#[path = "memory_tests.rs"]
mod tests;
