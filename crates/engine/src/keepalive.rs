// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Lease keep-alive while gated work runs

use dbsem_core::LockError;
use std::future::Future;
use std::time::Duration;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, warn};

/// Extension period for a lease of `timeout`
pub(crate) fn keepalive_period(timeout: Duration, fraction: u32) -> Duration {
    (timeout / fraction.max(1)).max(Duration::from_millis(1))
}

/// Drive `work` to completion, calling `extend` every `period`
///
/// A failed extension is logged and the work keeps running; the lease may
/// then expire under it, which the final release reports.
pub(crate) async fn with_keepalive<T, W, E, EFut>(
    key: &str,
    work: W,
    period: Duration,
    mut extend: E,
) -> T
where
    W: Future<Output = T>,
    E: FnMut() -> EFut,
    EFut: Future<Output = Result<(), LockError>>,
{
    tokio::pin!(work);
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            output = &mut work => return output,
            _ = ticker.tick() => match extend().await {
                Ok(()) => debug!(key, "lease kept alive"),
                Err(e) => warn!(key, error = %e, "lease keep-alive failed"),
            },
        }
    }
}

#[cfg(test)]
#[path = "keepalive_tests.rs"]
mod tests;
