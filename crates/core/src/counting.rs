// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Counting semaphore: up to N lease-timed holders per resource key
//!
//! Acquisition never waits. Slots `0..N` are tried in order with an atomic
//! insert-if-absent-or-expired; the first slot that accepts the row belongs
//! to the caller. Callers that get `None` retry on their own schedule.

use crate::config::SemaphoreLimits;
use crate::error::LockError;
use crate::secret::{SecretGen, RandomSecrets};
use crate::lease::{
    validate_context, validate_key, validate_timeout, HolderId, LeaseToken, LockKind, Pool,
};
use crate::store::{LeaseStore, NewLease, Removal};
use std::time::Duration;
use tracing::{debug, warn};

#[derive(Clone, Debug)]
pub struct CountingSemaphore<S, G = RandomSecrets> {
    store: S,
    secrets: G,
    limits: SemaphoreLimits,
    holder: HolderId,
}

impl<S: LeaseStore> CountingSemaphore<S> {
    pub fn new(store: S, limits: SemaphoreLimits) -> Self {
        Self {
            store,
            secrets: RandomSecrets,
            limits,
            holder: HolderId::for_process(),
        }
    }
}

impl<S: LeaseStore, G: SecretGen> CountingSemaphore<S, G> {
    /// Swap the secret generator (tests use `SequentialSecrets`)
    pub fn with_secrets<G2: SecretGen>(self, secrets: G2) -> CountingSemaphore<S, G2> {
        CountingSemaphore {
            store: self.store,
            secrets,
            limits: self.limits,
            holder: self.holder,
        }
    }

    /// Context recorded on leases acquired without an explicit one
    pub fn with_holder(mut self, holder: HolderId) -> Self {
        self.holder = holder;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn holder(&self) -> &HolderId {
        &self.holder
    }

    pub fn max_concurrency(&self, key: &str) -> u32 {
        self.limits.max_concurrency(key)
    }

    pub async fn acquire(
        &self,
        key: &str,
        timeout: Duration,
    ) -> Result<Option<LeaseToken>, LockError> {
        let context = self.holder.as_str().to_string();
        self.acquire_with_context(key, timeout, &context).await
    }

    /// Claim the first free slot, or `None` when all N are live
    pub async fn acquire_with_context(
        &self,
        key: &str,
        timeout: Duration,
        context: &str,
    ) -> Result<Option<LeaseToken>, LockError> {
        validate_key(key)?;
        validate_timeout(timeout)?;
        validate_context(context)?;

        let secret = self.secrets.lease_secret();
        let max = self.max_concurrency(key);
        for slot in 0..max {
            let claimed = self
                .store
                .try_insert(NewLease {
                    pool: Pool::Counting,
                    key: key.to_string(),
                    slot,
                    token: secret.clone(),
                    ttl: timeout,
                    context: context.to_string(),
                })
                .await?;
            if claimed {
                debug!(key, slot, max, "counting lease acquired");
                return Ok(Some(LeaseToken::new(slot, secret)));
            }
        }

        debug!(key, max, "all counting slots busy");
        Ok(None)
    }

    /// Release a lease; a token that lost its lease is not an error
    pub async fn release(&self, key: &str, token: &LeaseToken) -> Result<(), LockError> {
        validate_key(key)?;
        match self
            .store
            .try_remove(Pool::Counting, key, token.slot(), token.secret())
            .await?
        {
            Removal::Live => debug!(key, slot = token.slot(), "counting lease released"),
            Removal::Expired | Removal::Missing => warn!(
                key,
                slot = token.slot(),
                "counting lease expired before release, timeout too short"
            ),
        }
        Ok(())
    }

    /// Push the lease's expiry forward by its original timeout
    pub async fn extend_lease(&self, key: &str, token: &LeaseToken) -> Result<(), LockError> {
        validate_key(key)?;
        let extended = self
            .store
            .try_extend(Pool::Counting, key, token.slot(), token.secret())
            .await?;
        if !extended {
            return Err(LockError::NotFound {
                key: key.to_string(),
                kind: LockKind::Counting,
            });
        }
        debug!(key, slot = token.slot(), "counting lease extended");
        Ok(())
    }

    /// Context of the holder whose lease expires first
    pub async fn holder_context(&self, key: &str) -> Result<Option<String>, LockError> {
        Ok(self.store.first_live_context(Pool::Counting, key).await?)
    }

    pub async fn live_count(&self, key: &str) -> Result<usize, LockError> {
        Ok(self.store.count_live(Pool::Counting, key, None).await?)
    }
}

#[cfg(test)]
#[path = "counting_tests.rs"]
mod tests;
