// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Counting-semaphore gated task runner
//!
//! Meant to be fired by a periodic [`Trigger`](crate::Trigger): each
//! attempt runs the task if a slot is free and otherwise returns at once.

use crate::error::RunError;
use crate::guard::LeaseGuard;
use crate::keepalive::{keepalive_period, with_keepalive};
use crate::runner::settle;
use crate::trigger::Trigger;
use async_trait::async_trait;
use dbsem_core::{
    CountingSemaphore, HolderId, LeaseStore, LeaseToken, LockError, RunnerConfig,
    SemaphoreLimits,
};
use std::fmt::{Debug, Display};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

/// Unit of work run under a counting-semaphore lease
#[async_trait]
pub trait GatedTask: Send + Sync + 'static {
    type Error: Debug + Display + Send;

    async fn run(&self) -> Result<(), Self::Error>;
}

/// Precondition checked before any lease is taken
#[async_trait]
pub trait Gate: Send + Sync + 'static {
    async fn can_run(&self) -> bool;
}

/// Gate that never closes
#[derive(Clone, Copy, Debug, Default)]
pub struct AlwaysOpen;

#[async_trait]
impl Gate for AlwaysOpen {
    async fn can_run(&self) -> bool {
        true
    }
}

/// What one attempt did
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunOutcome {
    /// The task ran (in `lane` when slots were tried as lanes)
    Ran { lane: Option<u32> },
    /// Every slot was held
    NoSlot,
    /// The gate said no; no lease was taken
    GateClosed,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GatedRunnerConfig {
    pub lock_key: String,
    pub max_lock_count: u32,
    pub lock_timeout: Duration,
}

impl GatedRunnerConfig {
    pub fn new(lock_key: impl Into<String>, max_lock_count: u32, lock_timeout: Duration) -> Self {
        Self {
            lock_key: lock_key.into(),
            max_lock_count,
            lock_timeout,
        }
    }

    /// A runner needs at least one slot to ever run
    pub fn validate(&self) -> Result<(), LockError> {
        if self.max_lock_count == 0 {
            return Err(LockError::InvalidArgument(format!(
                "max lock count for '{}' must be at least 1",
                self.lock_key
            )));
        }
        Ok(())
    }
}

pub struct SemaphoreGatedRunner<S, T, Gt = AlwaysOpen> {
    semaphore: CountingSemaphore<S>,
    config: GatedRunnerConfig,
    task: T,
    gate: Gt,
    keepalive_fraction: u32,
}

impl<S: LeaseStore, T: GatedTask> SemaphoreGatedRunner<S, T> {
    pub fn new(store: S, config: GatedRunnerConfig, task: T) -> Self {
        // Lanes of attempt_to_run_all_slots are single-slot keys
        let limits = SemaphoreLimits::uniform(1)
            .with_limit(config.lock_key.clone(), config.max_lock_count);
        Self {
            semaphore: CountingSemaphore::new(store, limits),
            config,
            task,
            gate: AlwaysOpen,
            keepalive_fraction: RunnerConfig::default().keepalive_fraction,
        }
    }
}

impl<S: LeaseStore, T: GatedTask, Gt: Gate> SemaphoreGatedRunner<S, T, Gt> {
    pub fn with_gate<G2: Gate>(self, gate: G2) -> SemaphoreGatedRunner<S, T, G2> {
        SemaphoreGatedRunner {
            semaphore: self.semaphore,
            config: self.config,
            task: self.task,
            gate,
            keepalive_fraction: self.keepalive_fraction,
        }
    }

    pub fn with_holder(mut self, holder: HolderId) -> Self {
        self.semaphore = self.semaphore.with_holder(holder);
        self
    }

    pub fn with_runner_config(mut self, config: &RunnerConfig) -> Self {
        self.keepalive_fraction = config.keepalive_fraction;
        self
    }

    pub fn config(&self) -> &GatedRunnerConfig {
        &self.config
    }

    /// Run the task once if the gate is open and a slot is free
    pub async fn attempt_to_run(&self) -> Result<RunOutcome, RunError<T::Error>> {
        self.config.validate()?;
        if !self.gate.can_run().await {
            debug!(key = %self.config.lock_key, "gate closed, skipping run");
            return Ok(RunOutcome::GateClosed);
        }

        let key = &self.config.lock_key;
        let Some(token) = self
            .semaphore
            .acquire(key, self.config.lock_timeout)
            .await?
        else {
            debug!(key = %key, "no free slot");
            return Ok(RunOutcome::NoSlot);
        };

        self.run_holding(key, token, self.task.run()).await?;
        Ok(RunOutcome::Ran { lane: None })
    }

    /// Try each of the N slots of `<lock_key>-<extra_key>` as a lane
    ///
    /// Lane `i` is the single-slot key `<lock_key>-<extra_key>#<i>`. Lanes
    /// are tried in order and `task(lane)` runs in the first free one, so
    /// repeated attempts keep making progress while some lanes are busy.
    pub async fn attempt_to_run_all_slots<F, Fut, E>(
        &self,
        extra_key: &str,
        task: F,
    ) -> Result<RunOutcome, RunError<E>>
    where
        F: FnOnce(u32) -> Fut,
        Fut: Future<Output = Result<(), E>>,
    {
        self.config.validate()?;
        if !self.gate.can_run().await {
            debug!(key = %self.config.lock_key, "gate closed, skipping run");
            return Ok(RunOutcome::GateClosed);
        }

        for lane in 0..self.config.max_lock_count {
            let key = lane_key(&self.config.lock_key, extra_key, lane);
            if let Some(token) = self
                .semaphore
                .acquire(&key, self.config.lock_timeout)
                .await?
            {
                self.run_holding(&key, token, task(lane)).await?;
                return Ok(RunOutcome::Ran { lane: Some(lane) });
            }
        }

        debug!(key = %self.config.lock_key, extra_key, "every lane busy");
        Ok(RunOutcome::NoSlot)
    }

    async fn run_holding<E, Fut>(
        &self,
        key: &str,
        token: LeaseToken,
        work: Fut,
    ) -> Result<(), RunError<E>>
    where
        Fut: Future<Output = Result<(), E>>,
    {
        let guard = {
            let semaphore = self.semaphore.clone();
            let (release_key, release_token) = (key.to_string(), token.clone());
            LeaseGuard::new(key, async move {
                if let Err(e) = semaphore.release(&release_key, &release_token).await {
                    error!(key = %release_key, error = %e, "background counting release failed");
                }
            })
        };

        let (semaphore, held) = (&self.semaphore, &token);
        let period = keepalive_period(self.config.lock_timeout, self.keepalive_fraction);
        let outcome = with_keepalive(key, work, period, move || {
            semaphore.extend_lease(key, held)
        })
        .await;

        guard.disarm();
        let released = self.semaphore.release(key, &token).await;
        settle(key, outcome, released)
    }

    /// Fire `attempt_to_run` on every trigger tick until shutdown
    pub fn schedule(
        self: Arc<Self>,
        trigger: Trigger,
        shutdown: watch::Receiver<bool>,
    ) -> JoinHandle<()> {
        let key = self.config.lock_key.clone();
        trigger.spawn(shutdown, move || {
            let runner = Arc::clone(&self);
            let key = key.clone();
            async move {
                match runner.attempt_to_run().await {
                    Ok(RunOutcome::Ran { .. }) => info!(key = %key, "gated task ran"),
                    Ok(outcome) => debug!(key = %key, ?outcome, "gated task skipped"),
                    Err(e) => error!(key = %key, error = %e, "gated task failed"),
                }
            }
        })
    }
}

pub fn lane_key(lock_key: &str, extra_key: &str, lane: u32) -> String {
    format!("{}-{}#{}", lock_key, extra_key, lane)
}

#[cfg(test)]
#[path = "gated_tests.rs"]
mod tests;
