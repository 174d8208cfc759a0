// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Store wrapper that injects failures and interleavings for tests

use super::{LeaseStore, NewLease, Removal, ResourceStatus};
use crate::error::StoreError;
use crate::lease::{Pool, EXCLUSIVE_SLOT};
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Context written by rows the wrapper inserts on its own
pub const RIVAL_CONTEXT: &str = "rival";

#[derive(Debug, Default)]
struct Faults {
    remove_intent_failures: AtomicUsize,
    try_remove_failures: AtomicUsize,
    intent_after_shared_insert: AtomicBool,
    lease_after_intent_insert: AtomicBool,
}

/// Delegates to `S`, failing or racing selected operations on request
#[derive(Clone, Debug)]
pub struct FaultyStore<S> {
    inner: S,
    faults: Arc<Faults>,
}

fn take(counter: &AtomicUsize) -> bool {
    counter
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
        .is_ok()
}

fn injected(op: &str) -> StoreError {
    StoreError::Backend(format!("injected {op} failure"))
}

impl<S: LeaseStore> FaultyStore<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            faults: Arc::new(Faults::default()),
        }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// Fail the next `n` calls to `remove_intent`
    pub fn fail_remove_intent(&self, n: usize) {
        self.faults.remove_intent_failures.store(n, Ordering::SeqCst);
    }

    /// Fail the next `n` calls to `try_remove`
    pub fn fail_try_remove(&self, n: usize) {
        self.faults.try_remove_failures.store(n, Ordering::SeqCst);
    }

    /// After the next successful shared insert, announce a rival writer
    pub fn race_intent_after_shared_insert(&self) {
        self.faults
            .intent_after_shared_insert
            .store(true, Ordering::SeqCst);
    }

    /// After the next successful intent insert, promote a rival writer
    pub fn race_lease_after_intent_insert(&self) {
        self.faults
            .lease_after_intent_insert
            .store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl<S: LeaseStore> LeaseStore for FaultyStore<S> {
    async fn try_insert(&self, lease: NewLease) -> Result<bool, StoreError> {
        let (pool, key) = (lease.pool, lease.key.clone());
        let claimed = self.inner.try_insert(lease).await?;
        if claimed
            && pool == Pool::Shared
            && self
                .faults
                .intent_after_shared_insert
                .swap(false, Ordering::SeqCst)
        {
            self.inner
                .try_insert_intent(&key, "rival-intent", Duration::from_secs(60), RIVAL_CONTEXT)
                .await?;
        }
        Ok(claimed)
    }

    async fn try_remove(
        &self,
        pool: Pool,
        key: &str,
        slot: u32,
        token: &str,
    ) -> Result<Removal, StoreError> {
        if take(&self.faults.try_remove_failures) {
            return Err(injected("try_remove"));
        }
        self.inner.try_remove(pool, key, slot, token).await
    }

    async fn try_extend(
        &self,
        pool: Pool,
        key: &str,
        slot: u32,
        token: &str,
    ) -> Result<bool, StoreError> {
        self.inner.try_extend(pool, key, slot, token).await
    }

    async fn count_live(
        &self,
        pool: Pool,
        key: &str,
        excluding_slot: Option<u32>,
    ) -> Result<usize, StoreError> {
        self.inner.count_live(pool, key, excluding_slot).await
    }

    async fn first_live_context(
        &self,
        pool: Pool,
        key: &str,
    ) -> Result<Option<String>, StoreError> {
        self.inner.first_live_context(pool, key).await
    }

    async fn try_insert_intent(
        &self,
        key: &str,
        token: &str,
        ttl: Duration,
        context: &str,
    ) -> Result<bool, StoreError> {
        let inserted = self.inner.try_insert_intent(key, token, ttl, context).await?;
        if inserted
            && self
                .faults
                .lease_after_intent_insert
                .swap(false, Ordering::SeqCst)
        {
            self.inner
                .try_insert(NewLease {
                    pool: Pool::Exclusive,
                    key: key.to_string(),
                    slot: EXCLUSIVE_SLOT,
                    token: "rival-lease".to_string(),
                    ttl: Duration::from_secs(60),
                    context: RIVAL_CONTEXT.to_string(),
                })
                .await?;
        }
        Ok(inserted)
    }

    async fn try_refresh_intent(
        &self,
        key: &str,
        token: &str,
        ttl: Duration,
    ) -> Result<bool, StoreError> {
        self.inner.try_refresh_intent(key, token, ttl).await
    }

    async fn remove_intent(&self, key: &str, token: &str) -> Result<bool, StoreError> {
        if take(&self.faults.remove_intent_failures) {
            return Err(injected("remove_intent"));
        }
        self.inner.remove_intent(key, token).await
    }

    async fn live_intent_context(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.inner.live_intent_context(key).await
    }

    async fn release_all(&self) -> Result<(), StoreError> {
        self.inner.release_all().await
    }

    async fn collect_garbage(&self) -> Result<usize, StoreError> {
        self.inner.collect_garbage().await
    }

    async fn row_count(&self) -> Result<usize, StoreError> {
        self.inner.row_count().await
    }

    async fn resource_keys(&self) -> Result<Vec<String>, StoreError> {
        self.inner.resource_keys().await
    }

    async fn snapshot(&self, key: &str) -> Result<ResourceStatus, StoreError> {
        self.inner.snapshot(key).await
    }
}
