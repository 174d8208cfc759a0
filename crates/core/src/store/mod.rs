// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Lease store boundary
//!
//! A [`LeaseStore`] is the only shared mutable state between processes. Every
//! operation is atomic with respect to concurrent callers and evaluates
//! expiry against the store's own clock.

#[cfg(any(test, feature = "test-support"))]
mod faulty;
mod memory;
mod table;

#[cfg(any(test, feature = "test-support"))]
pub use faulty::{FaultyStore, RIVAL_CONTEXT};
pub use memory::{MemoryBackend, MemoryLeaseStore};
pub use table::{
    IntentRow, IntentSummary, LeaseRow, LeaseSummary, LeaseTable, NewLease, Removal,
    ResourceStatus,
};

use crate::error::StoreError;
use crate::lease::Pool;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::time::Duration;

/// Atomic row operations over shared lease rows
#[async_trait]
pub trait LeaseStore: Clone + Send + Sync + 'static {
    /// Claim `(pool, key, slot)` if it is absent or expired
    async fn try_insert(&self, lease: NewLease) -> Result<bool, StoreError>;

    /// Delete the lease if `token` owns it
    async fn try_remove(
        &self,
        pool: Pool,
        key: &str,
        slot: u32,
        token: &str,
    ) -> Result<Removal, StoreError>;

    /// Push a live lease's expiry forward by its original timeout
    async fn try_extend(
        &self,
        pool: Pool,
        key: &str,
        slot: u32,
        token: &str,
    ) -> Result<bool, StoreError>;

    async fn count_live(
        &self,
        pool: Pool,
        key: &str,
        excluding_slot: Option<u32>,
    ) -> Result<usize, StoreError>;

    /// Context of the live lease in `pool` that expires first
    async fn first_live_context(&self, pool: Pool, key: &str)
        -> Result<Option<String>, StoreError>;

    /// Create the write intent of `key` unless a live one exists
    async fn try_insert_intent(
        &self,
        key: &str,
        token: &str,
        ttl: Duration,
        context: &str,
    ) -> Result<bool, StoreError>;

    /// Reset the intent's expiry if `token` still owns it
    async fn try_refresh_intent(
        &self,
        key: &str,
        token: &str,
        ttl: Duration,
    ) -> Result<bool, StoreError>;

    async fn remove_intent(&self, key: &str, token: &str) -> Result<bool, StoreError>;

    async fn live_intent_context(&self, key: &str) -> Result<Option<String>, StoreError>;

    async fn intent_is_live(&self, key: &str) -> Result<bool, StoreError> {
        Ok(self.live_intent_context(key).await?.is_some())
    }

    /// Expire every lease and intent and forget their tokens
    async fn release_all(&self) -> Result<(), StoreError>;

    /// Physically delete dead rows; returns how many were removed
    async fn collect_garbage(&self) -> Result<usize, StoreError>;

    /// Physical rows, dead or alive
    async fn row_count(&self) -> Result<usize, StoreError>;

    async fn resource_keys(&self) -> Result<Vec<String>, StoreError>;

    async fn snapshot(&self, key: &str) -> Result<ResourceStatus, StoreError>;
}

/// Whether a table operation may modify rows
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Access {
    Read,
    Write,
}

/// Somewhere a [`LeaseTable`] lives, with exclusive access per operation
#[async_trait]
pub trait TableBackend: Clone + Send + Sync + 'static {
    /// Run `op` against the table while holding it exclusively
    ///
    /// `op` receives the backend's notion of the current time. Backends may
    /// skip persisting the table after an [`Access::Read`] operation.
    async fn with_table<R, F>(&self, access: Access, op: F) -> Result<R, StoreError>
    where
        F: FnOnce(&mut LeaseTable, DateTime<Utc>) -> R + Send + 'static,
        R: Send + 'static;
}

/// [`LeaseStore`] over any [`TableBackend`]
#[derive(Clone, Debug)]
pub struct TableStore<B> {
    backend: B,
}

impl<B: TableBackend> TableStore<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }
}

#[async_trait]
impl<B: TableBackend> LeaseStore for TableStore<B> {
    async fn try_insert(&self, lease: NewLease) -> Result<bool, StoreError> {
        self.backend
            .with_table(Access::Write, move |t, now| t.try_insert(lease, now))
            .await
    }

    async fn try_remove(
        &self,
        pool: Pool,
        key: &str,
        slot: u32,
        token: &str,
    ) -> Result<Removal, StoreError> {
        let (key, token) = (key.to_string(), token.to_string());
        self.backend
            .with_table(Access::Write, move |t, now| {
                t.try_remove(pool, &key, slot, &token, now)
            })
            .await
    }

    async fn try_extend(
        &self,
        pool: Pool,
        key: &str,
        slot: u32,
        token: &str,
    ) -> Result<bool, StoreError> {
        let (key, token) = (key.to_string(), token.to_string());
        self.backend
            .with_table(Access::Write, move |t, now| {
                t.try_extend(pool, &key, slot, &token, now)
            })
            .await
    }

    async fn count_live(
        &self,
        pool: Pool,
        key: &str,
        excluding_slot: Option<u32>,
    ) -> Result<usize, StoreError> {
        let key = key.to_string();
        self.backend
            .with_table(Access::Read, move |t, now| {
                t.count_live(pool, &key, excluding_slot, now)
            })
            .await
    }

    async fn first_live_context(
        &self,
        pool: Pool,
        key: &str,
    ) -> Result<Option<String>, StoreError> {
        let key = key.to_string();
        self.backend
            .with_table(Access::Read, move |t, now| {
                t.first_live_context(pool, &key, now)
            })
            .await
    }

    async fn try_insert_intent(
        &self,
        key: &str,
        token: &str,
        ttl: Duration,
        context: &str,
    ) -> Result<bool, StoreError> {
        let (key, token, context) = (key.to_string(), token.to_string(), context.to_string());
        self.backend
            .with_table(Access::Write, move |t, now| {
                t.try_insert_intent(&key, &token, ttl, &context, now)
            })
            .await
    }

    async fn try_refresh_intent(
        &self,
        key: &str,
        token: &str,
        ttl: Duration,
    ) -> Result<bool, StoreError> {
        let (key, token) = (key.to_string(), token.to_string());
        self.backend
            .with_table(Access::Write, move |t, now| {
                t.try_refresh_intent(&key, &token, ttl, now)
            })
            .await
    }

    async fn remove_intent(&self, key: &str, token: &str) -> Result<bool, StoreError> {
        let (key, token) = (key.to_string(), token.to_string());
        self.backend
            .with_table(Access::Write, move |t, _| t.remove_intent(&key, &token))
            .await
    }

    async fn live_intent_context(&self, key: &str) -> Result<Option<String>, StoreError> {
        let key = key.to_string();
        self.backend
            .with_table(Access::Read, move |t, now| t.live_intent_context(&key, now))
            .await
    }

    async fn release_all(&self) -> Result<(), StoreError> {
        self.backend
            .with_table(Access::Write, |t, now| t.release_all(now))
            .await
    }

    async fn collect_garbage(&self) -> Result<usize, StoreError> {
        self.backend
            .with_table(Access::Write, |t, now| t.collect_garbage(now))
            .await
    }

    async fn row_count(&self) -> Result<usize, StoreError> {
        self.backend
            .with_table(Access::Read, |t, _| t.row_count())
            .await
    }

    async fn resource_keys(&self) -> Result<Vec<String>, StoreError> {
        self.backend
            .with_table(Access::Read, |t, _| t.resource_keys())
            .await
    }

    async fn snapshot(&self, key: &str) -> Result<ResourceStatus, StoreError> {
        let key = key.to_string();
        self.backend
            .with_table(Access::Read, move |t, now| t.snapshot(&key, now))
            .await
    }
}
