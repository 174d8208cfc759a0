// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Periodic firing of a callback with a start delay

use std::future::Future;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::debug;

/// When to fire: once after `start_delay`, then every `repeat_interval`
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Trigger {
    pub start_delay: Duration,
    pub repeat_interval: Duration,
}

impl Trigger {
    pub fn new(start_delay: Duration, repeat_interval: Duration) -> Self {
        Self {
            start_delay,
            repeat_interval,
        }
    }

    /// Fire immediately, then every `repeat_interval`
    pub fn every(repeat_interval: Duration) -> Self {
        Self::new(Duration::ZERO, repeat_interval)
    }

    /// Run `tick` on schedule until `shutdown` turns true or its sender drops
    ///
    /// Ticks never overlap: a slow tick delays the next one.
    pub fn spawn<F, Fut>(self, mut shutdown: watch::Receiver<bool>, mut tick: F) -> JoinHandle<()>
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send,
    {
        let period = self.repeat_interval.max(Duration::from_millis(1));
        tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + self.start_delay, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                let stopping = *shutdown.borrow();
                if stopping {
                    break;
                }
                tokio::select! {
                    biased;
                    changed = shutdown.changed() => {
                        if changed.is_err() {
                            break;
                        }
                    }
                    _ = ticker.tick() => tick().await,
                }
            }
            debug!("trigger stopped");
        })
    }
}

#[cfg(test)]
#[path = "trigger_tests.rs"]
mod tests;
