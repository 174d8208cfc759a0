// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Run work while holding an exclusive or shared lock
//!
//! Every entry point releases the lock on every exit path: explicitly after
//! the work returns, or through a [`LeaseGuard`] if the future is dropped.

use crate::error::RunError;
use crate::guard::LeaseGuard;
use crate::keepalive::{keepalive_period, with_keepalive};
use crate::retry::RetryPolicy;
use dbsem_core::{
    ExclusiveOrSharedSemaphore, SecretGen, LeaseStore, LeaseToken, LockError, RequestToken,
    RunnerConfig, RandomSecrets,
};
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, error, info};

#[derive(Clone, Debug)]
pub struct GatedRunner<S, G = RandomSecrets> {
    semaphore: ExclusiveOrSharedSemaphore<S, G>,
    policy: RetryPolicy,
    keepalive_fraction: u32,
}

impl<S: LeaseStore, G: SecretGen> GatedRunner<S, G> {
    pub fn new(semaphore: ExclusiveOrSharedSemaphore<S, G>) -> Self {
        Self::with_config(semaphore, &RunnerConfig::default())
    }

    pub fn with_config(semaphore: ExclusiveOrSharedSemaphore<S, G>, config: &RunnerConfig) -> Self {
        Self {
            semaphore,
            policy: RetryPolicy::from_config(config),
            keepalive_fraction: config.keepalive_fraction,
        }
    }

    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn semaphore(&self) -> &ExclusiveOrSharedSemaphore<S, G> {
        &self.semaphore
    }

    /// Two-phase acquire, run `work`, release
    ///
    /// A competing writer fails the first phase immediately with
    /// `LockUnavailable`. The second phase is polled with backoff until the
    /// readers drain or the policy deadline passes. Dropping the future at
    /// any point withdraws the write intent in the background.
    pub async fn run_with_exclusive_lock<T, E, F, Fut>(
        &self,
        key: &str,
        timeout: Duration,
        work: F,
    ) -> Result<T, RunError<E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let request = self.semaphore.request_exclusive_lock_token(key).await?;

        // Dropped while polling: withdraw the intent, and the lease if the
        // request was promoted before the drop
        let pending = {
            let semaphore = self.semaphore.clone();
            let (abandon_key, abandon_request) = (key.to_string(), request.clone());
            LeaseGuard::new(key, async move {
                if let Err(e) = semaphore
                    .abandon_exclusive_request(&abandon_key, &abandon_request)
                    .await
                {
                    error!(key = %abandon_key, error = %e, "background write intent withdrawal failed");
                }
            })
        };
        let polled = self.poll_exclusive::<E>(key, &request, timeout).await;
        pending.disarm();
        let token = polled?;

        let guard = {
            let semaphore = self.semaphore.clone();
            let (release_key, release_token) = (key.to_string(), token.clone());
            LeaseGuard::new(key, async move {
                if let Err(e) = semaphore
                    .release_exclusive_lock(&release_key, &release_token)
                    .await
                {
                    error!(key = %release_key, error = %e, "background exclusive release failed");
                }
            })
        };

        let (semaphore, held) = (&self.semaphore, &token);
        let period = keepalive_period(timeout, self.keepalive_fraction);
        let outcome = with_keepalive(key, work(), period, move || {
            semaphore.refresh_exclusive_lock(key, held)
        })
        .await;

        guard.disarm();
        let released = self.semaphore.release_exclusive_lock(key, &token).await;
        settle(key, outcome, released)
    }

    /// Acquire a read lock, run `work`, release; never waits
    pub async fn run_with_shared_lock<T, E, F, Fut>(
        &self,
        key: &str,
        timeout: Duration,
        work: F,
    ) -> Result<T, RunError<E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let token = self.semaphore.acquire_shared_lock(key, timeout).await?;

        let guard = {
            let semaphore = self.semaphore.clone();
            let (release_key, release_token) = (key.to_string(), token.clone());
            LeaseGuard::new(key, async move {
                if let Err(e) = semaphore
                    .release_shared_lock(&release_key, &release_token)
                    .await
                {
                    error!(key = %release_key, error = %e, "background shared release failed");
                }
            })
        };

        let (semaphore, held) = (&self.semaphore, &token);
        let period = keepalive_period(timeout, self.keepalive_fraction);
        let outcome = with_keepalive(key, work(), period, move || {
            semaphore.refresh_shared_lock(key, held)
        })
        .await;

        guard.disarm();
        let released = self.semaphore.release_shared_lock(key, &token).await;
        settle(key, outcome, released)
    }

    /// Read-lock several keys in order, run `work`, release them all
    ///
    /// If any key is unavailable the locks taken so far are released and
    /// the error is returned.
    pub async fn run_with_shared_locks<T, E, F, Fut>(
        &self,
        keys: &[&str],
        timeout: Duration,
        work: F,
    ) -> Result<T, RunError<E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let mut held: Vec<(String, LeaseToken)> = Vec::with_capacity(keys.len());
        for key in keys {
            match self.semaphore.acquire_shared_lock(key, timeout).await {
                Ok(token) => held.push((key.to_string(), token)),
                Err(e) => {
                    self.release_all_shared(&held).await;
                    return Err(RunError::Lock(e));
                }
            }
        }

        let label = keys.join(",");
        let guard = {
            let (semaphore, held) = (self.semaphore.clone(), held.clone());
            LeaseGuard::new(&label, async move {
                for (key, token) in &held {
                    if let Err(e) = semaphore.release_shared_lock(key, token).await {
                        error!(key = %key, error = %e, "background shared release failed");
                    }
                }
            })
        };

        let period = keepalive_period(timeout, self.keepalive_fraction);
        let (semaphore, leases) = (&self.semaphore, &held);
        let outcome = with_keepalive(&label, work(), period, move || async move {
            for (key, token) in leases {
                semaphore.refresh_shared_lock(key, token).await?;
            }
            Ok(())
        })
        .await;

        guard.disarm();
        let mut released = Ok(());
        for (key, token) in &held {
            let result = self.semaphore.release_shared_lock(key, token).await;
            if released.is_ok() {
                released = result;
            } else if let Err(e) = result {
                error!(key = %key, error = %e, "shared release failed");
            }
        }
        settle(&label, outcome, released)
    }

    async fn poll_exclusive<E>(
        &self,
        key: &str,
        request: &RequestToken,
        timeout: Duration,
    ) -> Result<LeaseToken, RunError<E>> {
        let started = Instant::now();
        let mut delays = self.policy.delays();
        let mut polls = 0u32;

        loop {
            polls += 1;
            match self
                .semaphore
                .acquire_exclusive_lock(key, request, timeout)
                .await
            {
                Ok(Some(token)) => {
                    debug!(key, polls, "exclusive lock promoted");
                    return Ok(token);
                }
                Ok(None) => {}
                Err(e) => {
                    self.abandon(key, request).await;
                    return Err(RunError::Lock(e));
                }
            }

            let delay = delays.next().unwrap_or(self.policy.max);
            if let Some(deadline) = self.policy.deadline {
                let waited = started.elapsed();
                if waited + delay > deadline {
                    self.abandon(key, request).await;
                    info!(key, ?waited, polls, "gave up waiting for exclusive lock");
                    return Err(RunError::TimedOut {
                        key: key.to_string(),
                        waited,
                    });
                }
            }
            tokio::time::sleep(delay).await;
        }
    }

    async fn abandon(&self, key: &str, request: &RequestToken) {
        if let Err(e) = self.semaphore.abandon_exclusive_request(key, request).await {
            error!(key, error = %e, "failed to withdraw write intent");
        }
    }

    async fn release_all_shared(&self, held: &[(String, LeaseToken)]) {
        for (key, token) in held {
            if let Err(e) = self.semaphore.release_shared_lock(key, token).await {
                error!(key = %key, error = %e, "shared release failed");
            }
        }
    }
}

/// Combine the work outcome with the release outcome
///
/// A release failure after failed work is logged; the work error wins.
pub(crate) fn settle<T, E>(
    key: &str,
    outcome: Result<T, E>,
    released: Result<(), LockError>,
) -> Result<T, RunError<E>> {
    match (outcome, released) {
        (Ok(value), Ok(())) => Ok(value),
        (Ok(_), Err(e)) => {
            error!(key, error = %e, "release failed after gated work");
            Err(RunError::Lock(e))
        }
        (Err(work), Ok(())) => Err(RunError::Work(work)),
        (Err(work), Err(e)) => {
            error!(key, error = %e, "release failed after gated work failed");
            Err(RunError::Work(work))
        }
    }
}

#[cfg(test)]
#[path = "runner_tests.rs"]
mod tests;
