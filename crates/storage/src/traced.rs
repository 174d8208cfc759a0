// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Traced lease store wrapper for consistent observability

use async_trait::async_trait;
use dbsem_core::store::{LeaseStore, NewLease, Removal, ResourceStatus};
use dbsem_core::{Pool, StoreError};
use std::fmt::Debug;
use std::future::Future;
use std::time::{Duration, Instant};
use tracing::{Instrument, Span};

/// Wrapper that adds a span and timing to every store operation
#[derive(Clone, Debug)]
pub struct TracedLeaseStore<S> {
    inner: S,
}

impl<S> TracedLeaseStore<S> {
    pub fn new(inner: S) -> Self {
        Self { inner }
    }

    pub fn into_inner(self) -> S {
        self.inner
    }
}

async fn traced<T, F>(span: Span, op: F) -> Result<T, StoreError>
where
    T: Debug,
    F: Future<Output = Result<T, StoreError>>,
{
    let start = Instant::now();
    let result = op.instrument(span.clone()).await;
    let elapsed_ms = start.elapsed().as_millis() as u64;

    span.in_scope(|| match &result {
        Ok(outcome) => tracing::debug!(elapsed_ms, ?outcome, "done"),
        Err(e) => tracing::error!(elapsed_ms, error = %e, "store operation failed"),
    });
    result
}

#[async_trait]
impl<S: LeaseStore> LeaseStore for TracedLeaseStore<S> {
    async fn try_insert(&self, lease: NewLease) -> Result<bool, StoreError> {
        let span = tracing::debug_span!(
            "lease_store.try_insert",
            key = %lease.key,
            pool = %lease.pool,
            slot = lease.slot,
            ttl_ms = lease.ttl.as_millis() as u64,
        );
        traced(span, self.inner.try_insert(lease)).await
    }

    async fn try_remove(
        &self,
        pool: Pool,
        key: &str,
        slot: u32,
        token: &str,
    ) -> Result<Removal, StoreError> {
        let span = tracing::debug_span!("lease_store.try_remove", key, %pool, slot);
        traced(span, self.inner.try_remove(pool, key, slot, token)).await
    }

    async fn try_extend(
        &self,
        pool: Pool,
        key: &str,
        slot: u32,
        token: &str,
    ) -> Result<bool, StoreError> {
        let span = tracing::debug_span!("lease_store.try_extend", key, %pool, slot);
        traced(span, self.inner.try_extend(pool, key, slot, token)).await
    }

    async fn count_live(
        &self,
        pool: Pool,
        key: &str,
        excluding_slot: Option<u32>,
    ) -> Result<usize, StoreError> {
        let span = tracing::debug_span!("lease_store.count_live", key, %pool, ?excluding_slot);
        traced(span, self.inner.count_live(pool, key, excluding_slot)).await
    }

    async fn first_live_context(
        &self,
        pool: Pool,
        key: &str,
    ) -> Result<Option<String>, StoreError> {
        let span = tracing::debug_span!("lease_store.first_live_context", key, %pool);
        traced(span, self.inner.first_live_context(pool, key)).await
    }

    async fn try_insert_intent(
        &self,
        key: &str,
        token: &str,
        ttl: Duration,
        context: &str,
    ) -> Result<bool, StoreError> {
        let span = tracing::debug_span!(
            "lease_store.try_insert_intent",
            key,
            ttl_ms = ttl.as_millis() as u64
        );
        traced(span, self.inner.try_insert_intent(key, token, ttl, context)).await
    }

    async fn try_refresh_intent(
        &self,
        key: &str,
        token: &str,
        ttl: Duration,
    ) -> Result<bool, StoreError> {
        let span = tracing::debug_span!("lease_store.try_refresh_intent", key);
        traced(span, self.inner.try_refresh_intent(key, token, ttl)).await
    }

    async fn remove_intent(&self, key: &str, token: &str) -> Result<bool, StoreError> {
        let span = tracing::debug_span!("lease_store.remove_intent", key);
        traced(span, self.inner.remove_intent(key, token)).await
    }

    async fn live_intent_context(&self, key: &str) -> Result<Option<String>, StoreError> {
        let span = tracing::debug_span!("lease_store.live_intent_context", key);
        traced(span, self.inner.live_intent_context(key)).await
    }

    async fn release_all(&self) -> Result<(), StoreError> {
        let span = tracing::info_span!("lease_store.release_all");
        let result = traced(span, self.inner.release_all()).await;
        if result.is_ok() {
            tracing::warn!("every lease force-released");
        }
        result
    }

    async fn collect_garbage(&self) -> Result<usize, StoreError> {
        let span = tracing::info_span!("lease_store.collect_garbage");
        traced(span, self.inner.collect_garbage()).await
    }

    async fn row_count(&self) -> Result<usize, StoreError> {
        let span = tracing::debug_span!("lease_store.row_count");
        traced(span, self.inner.row_count()).await
    }

    async fn resource_keys(&self) -> Result<Vec<String>, StoreError> {
        let span = tracing::debug_span!("lease_store.resource_keys");
        traced(span, self.inner.resource_keys()).await
    }

    async fn snapshot(&self, key: &str) -> Result<ResourceStatus, StoreError> {
        let span = tracing::debug_span!("lease_store.snapshot", key);
        traced(span, self.inner.snapshot(key)).await
    }
}

#[cfg(test)]
#[path = "traced_tests.rs"]
mod tests;
