// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Exclusive-or-shared (reader/writer) semaphore
//!
//! Per resource key the legal transitions are
//! `Free -> Shared(n) -> Free` and
//! `Free -> WriteRequested -> WriteHeld -> Free`.
//!
//! Writers acquire in two phases. [`request_exclusive_lock_token`] writes a
//! short-lived intent row that turns away new readers; the holder then polls
//! [`acquire_exclusive_lock`], which re-asserts the intent and promotes it to
//! the exclusive lease once no live shared lease remains. Readers already
//! holding a lease are never evicted.
//!
//! [`request_exclusive_lock_token`]: ExclusiveOrSharedSemaphore::request_exclusive_lock_token
//! [`acquire_exclusive_lock`]: ExclusiveOrSharedSemaphore::acquire_exclusive_lock

use crate::error::LockError;
use crate::secret::{SecretGen, RandomSecrets};
use crate::lease::{
    validate_context, validate_key, validate_timeout, HolderId, LeaseToken, LockKind, Pool,
    RequestToken, EXCLUSIVE_SLOT, WRITE_INTENT_TTL,
};
use crate::store::{LeaseStore, NewLease, Removal};
use std::fmt;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Observed state of one resource key
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResourceState {
    Free,
    /// Live shared leases and no writer
    Shared(usize),
    /// A write intent is live; existing readers may still be draining
    WriteRequested,
    WriteHeld,
}

impl fmt::Display for ResourceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceState::Free => f.write_str("free"),
            ResourceState::Shared(n) => write!(f, "shared({})", n),
            ResourceState::WriteRequested => f.write_str("write-requested"),
            ResourceState::WriteHeld => f.write_str("write-held"),
        }
    }
}

#[derive(Clone, Debug)]
pub struct ExclusiveOrSharedSemaphore<S, G = RandomSecrets> {
    store: S,
    secrets: G,
    holder: HolderId,
}

impl<S: LeaseStore> ExclusiveOrSharedSemaphore<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            secrets: RandomSecrets,
            holder: HolderId::for_process(),
        }
    }
}

impl<S: LeaseStore, G: SecretGen> ExclusiveOrSharedSemaphore<S, G> {
    pub fn with_secrets<G2: SecretGen>(self, secrets: G2) -> ExclusiveOrSharedSemaphore<S, G2> {
        ExclusiveOrSharedSemaphore {
            store: self.store,
            secrets,
            holder: self.holder,
        }
    }

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

    // -- shared -------------------------------------------------------------

    pub async fn acquire_shared_lock(
        &self,
        key: &str,
        timeout: Duration,
    ) -> Result<LeaseToken, LockError> {
        let context = self.holder.as_str().to_string();
        self.acquire_shared_lock_with_context(key, timeout, &context)
            .await
    }

    /// Take a read lease unless a writer has announced itself
    pub async fn acquire_shared_lock_with_context(
        &self,
        key: &str,
        timeout: Duration,
        context: &str,
    ) -> Result<LeaseToken, LockError> {
        validate_key(key)?;
        validate_timeout(timeout)?;
        validate_context(context)?;

        if let Some(writer) = self.existing_writer_context(key).await? {
            return Err(LockError::unavailable(key, LockKind::Read, Some(writer)));
        }

        let secret = self.secrets.lease_secret();
        let mut slot = 0u32;
        loop {
            let claimed = self
                .store
                .try_insert(NewLease {
                    pool: Pool::Shared,
                    key: key.to_string(),
                    slot,
                    token: secret.clone(),
                    ttl: timeout,
                    context: context.to_string(),
                })
                .await?;
            if claimed {
                break;
            }
            slot = slot
                .checked_add(1)
                .ok_or_else(|| LockError::unavailable(key, LockKind::Read, None))?;
        }

        // A writer may have announced itself between the check and the insert
        let writer = match self.existing_writer_context(key).await {
            Ok(writer) => writer,
            Err(e) => {
                self.withdraw_shared(key, slot, &secret).await;
                return Err(e);
            }
        };
        if let Some(writer) = writer {
            if self.withdraw_shared(key, slot, &secret).await {
                return Err(LockError::unavailable(key, LockKind::Read, Some(writer)));
            }
            // The row is still ours; its owner must be able to release it.
            // The writer waits for it like any other reader.
            warn!(key, slot, "shared lease kept, writer arrived but withdrawal failed");
        }

        debug!(key, slot, "shared lease acquired");
        Ok(LeaseToken::new(slot, secret))
    }

    /// Release a read lease; an expired or reclaimed lease is an error
    pub async fn release_shared_lock(&self, key: &str, token: &LeaseToken) -> Result<(), LockError> {
        validate_key(key)?;
        match self
            .store
            .try_remove(Pool::Shared, key, token.slot(), token.secret())
            .await?
        {
            Removal::Live => {
                debug!(key, slot = token.slot(), "shared lease released");
                Ok(())
            }
            Removal::Expired | Removal::Missing => Err(LockError::LockReleaseFailed {
                key: key.to_string(),
                kind: LockKind::Read,
            }),
        }
    }

    pub async fn refresh_shared_lock(&self, key: &str, token: &LeaseToken) -> Result<(), LockError> {
        self.extend(Pool::Shared, LockKind::Read, key, token).await
    }

    // -- exclusive ----------------------------------------------------------

    pub async fn request_exclusive_lock_token(&self, key: &str) -> Result<RequestToken, LockError> {
        let context = self.holder.as_str().to_string();
        self.request_exclusive_lock_token_with_context(key, &context)
            .await
    }

    /// First phase: announce the writer and block new readers
    pub async fn request_exclusive_lock_token_with_context(
        &self,
        key: &str,
        context: &str,
    ) -> Result<RequestToken, LockError> {
        validate_key(key)?;
        validate_context(context)?;

        if let Some(holder) = self.store.first_live_context(Pool::Exclusive, key).await? {
            return Err(LockError::unavailable(key, LockKind::Write, Some(holder)));
        }

        let request = self.secrets.request_token();
        if !self
            .store
            .try_insert_intent(key, request.as_str(), WRITE_INTENT_TTL, context)
            .await?
        {
            let holder = self.store.live_intent_context(key).await?;
            return Err(LockError::unavailable(key, LockKind::Write, holder));
        }

        // A previous writer may have promoted between the check and the insert
        let holder = match self.store.first_live_context(Pool::Exclusive, key).await {
            Ok(holder) => holder,
            Err(e) => {
                self.withdraw_intent(key, request.as_str()).await;
                return Err(e.into());
            }
        };
        if let Some(holder) = holder {
            self.withdraw_intent(key, request.as_str()).await;
            return Err(LockError::unavailable(key, LockKind::Write, Some(holder)));
        }

        info!(key, "write intent registered");
        Ok(request)
    }

    pub async fn acquire_exclusive_lock(
        &self,
        key: &str,
        request: &RequestToken,
        timeout: Duration,
    ) -> Result<Option<LeaseToken>, LockError> {
        let context = self.holder.as_str().to_string();
        self.acquire_exclusive_lock_with_context(key, request, timeout, &context)
            .await
    }

    /// Second phase, polled until it returns a token
    ///
    /// Every call re-asserts the intent. Returns `None` while live shared
    /// leases remain; the caller retries after a short delay, well inside
    /// the intent TTL.
    pub async fn acquire_exclusive_lock_with_context(
        &self,
        key: &str,
        request: &RequestToken,
        timeout: Duration,
        context: &str,
    ) -> Result<Option<LeaseToken>, LockError> {
        validate_key(key)?;
        validate_timeout(timeout)?;
        validate_context(context)?;

        self.reassert_intent(key, request, context).await?;

        let readers = self.store.count_live(Pool::Shared, key, None).await?;
        if readers > 0 {
            debug!(key, readers, "waiting for readers to drain");
            return Ok(None);
        }

        let token = request.clone().into_lease_token();
        let promoted = self
            .store
            .try_insert(NewLease {
                pool: Pool::Exclusive,
                key: key.to_string(),
                slot: EXCLUSIVE_SLOT,
                token: token.secret().to_string(),
                ttl: timeout,
                context: context.to_string(),
            })
            .await?;
        if !promoted {
            debug!(key, "exclusive slot still held");
            return Ok(None);
        }

        // Promotion stands; a residual intent goes with the release
        if let Err(e) = self.store.remove_intent(key, request.as_str()).await {
            warn!(key, error = %e, "write intent left behind after promotion");
        }
        info!(key, "exclusive lock acquired");
        Ok(Some(token))
    }

    /// Release the write lease and any residual intent
    pub async fn release_exclusive_lock(
        &self,
        key: &str,
        token: &LeaseToken,
    ) -> Result<(), LockError> {
        validate_key(key)?;
        let removal = self
            .store
            .try_remove(Pool::Exclusive, key, token.slot(), token.secret())
            .await?;
        self.store.remove_intent(key, token.secret()).await?;

        match removal {
            Removal::Live => {
                info!(key, "exclusive lock released");
                Ok(())
            }
            Removal::Expired | Removal::Missing => Err(LockError::LockReleaseFailed {
                key: key.to_string(),
                kind: LockKind::Write,
            }),
        }
    }

    pub async fn refresh_exclusive_lock(
        &self,
        key: &str,
        token: &LeaseToken,
    ) -> Result<(), LockError> {
        self.extend(Pool::Exclusive, LockKind::Write, key, token)
            .await
    }

    /// Withdraw a write request whose lease will never reach its caller
    ///
    /// Removes the intent and, if the request was already promoted, the
    /// exclusive lease it became. Returns whether anything was removed.
    pub async fn abandon_exclusive_request(
        &self,
        key: &str,
        request: &RequestToken,
    ) -> Result<bool, LockError> {
        validate_key(key)?;
        let promoted = self
            .store
            .try_remove(Pool::Exclusive, key, EXCLUSIVE_SLOT, request.as_str())
            .await?;
        let intent = self.store.remove_intent(key, request.as_str()).await?;
        if promoted == Removal::Live {
            info!(key, "promoted exclusive lease abandoned");
        } else if intent {
            info!(key, "write intent abandoned");
        }
        Ok(promoted == Removal::Live || intent)
    }

    // -- diagnostics --------------------------------------------------------

    /// Context of the reader whose lease expires first
    pub async fn existing_reader_context(&self, key: &str) -> Result<Option<String>, LockError> {
        Ok(self.store.first_live_context(Pool::Shared, key).await?)
    }

    /// Context of the live writer, intent first
    pub async fn existing_writer_context(&self, key: &str) -> Result<Option<String>, LockError> {
        if let Some(context) = self.store.live_intent_context(key).await? {
            return Ok(Some(context));
        }
        Ok(self.store.first_live_context(Pool::Exclusive, key).await?)
    }

    pub async fn state(&self, key: &str) -> Result<ResourceState, LockError> {
        let status = self.store.snapshot(key).await?;
        let state = if status.count(Pool::Exclusive) > 0 {
            ResourceState::WriteHeld
        } else if status.write_intent.is_some() {
            ResourceState::WriteRequested
        } else {
            match status.count(Pool::Shared) {
                0 => ResourceState::Free,
                n => ResourceState::Shared(n),
            }
        };
        Ok(state)
    }

    // -- internals ----------------------------------------------------------

    async fn extend(
        &self,
        pool: Pool,
        kind: LockKind,
        key: &str,
        token: &LeaseToken,
    ) -> Result<(), LockError> {
        validate_key(key)?;
        if !self
            .store
            .try_extend(pool, key, token.slot(), token.secret())
            .await?
        {
            return Err(LockError::NotFound {
                key: key.to_string(),
                kind,
            });
        }
        debug!(key, %pool, slot = token.slot(), "lease extended");
        Ok(())
    }

    /// Best-effort removal of a shared lease this call just inserted
    async fn withdraw_shared(&self, key: &str, slot: u32, secret: &str) -> bool {
        match self.store.try_remove(Pool::Shared, key, slot, secret).await {
            Ok(_) => {
                debug!(key, slot, "shared lease withdrawn, writer arrived");
                true
            }
            Err(e) => {
                warn!(key, slot, error = %e, "failed to withdraw shared lease");
                false
            }
        }
    }

    /// Best-effort removal of an intent this call just inserted; it lapses
    /// after `WRITE_INTENT_TTL` otherwise
    async fn withdraw_intent(&self, key: &str, secret: &str) {
        if let Err(e) = self.store.remove_intent(key, secret).await {
            warn!(key, error = %e, "failed to withdraw write intent, it will lapse");
        }
    }

    /// Reset the intent TTL, re-creating the intent if it lapsed unclaimed
    async fn reassert_intent(
        &self,
        key: &str,
        request: &RequestToken,
        context: &str,
    ) -> Result<(), LockError> {
        if self
            .store
            .try_refresh_intent(key, request.as_str(), WRITE_INTENT_TTL)
            .await?
        {
            return Ok(());
        }

        if let Some(holder) = self.store.live_intent_context(key).await? {
            return Err(LockError::unavailable(key, LockKind::Write, Some(holder)));
        }
        if let Some(holder) = self.store.first_live_context(Pool::Exclusive, key).await? {
            return Err(LockError::unavailable(key, LockKind::Write, Some(holder)));
        }
        if !self
            .store
            .try_insert_intent(key, request.as_str(), WRITE_INTENT_TTL, context)
            .await?
        {
            let holder = self.store.live_intent_context(key).await?;
            return Err(LockError::unavailable(key, LockKind::Write, holder));
        }
        debug!(key, "lapsed write intent re-created");
        Ok(())
    }
}

#[cfg(test)]
#[path = "exclusive_tests.rs"]
mod tests;
