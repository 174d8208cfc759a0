// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Release-on-drop for leases and write intents held by a runner

use std::future::Future;
use std::pin::Pin;
use tracing::warn;

type ReleaseFuture = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

/// Holds the release of a lease until it is disarmed
///
/// Runners release explicitly so they can report the outcome. If the
/// runner's future is dropped first (cancellation, a panic in the work),
/// the guard spawns the release on the current tokio runtime instead.
pub(crate) struct LeaseGuard {
    key: String,
    release: Option<ReleaseFuture>,
}

impl LeaseGuard {
    pub(crate) fn new<F>(key: &str, release: F) -> Self
    where
        F: Future<Output = ()> + Send + 'static,
    {
        Self {
            key: key.to_string(),
            release: Some(Box::pin(release)),
        }
    }

    /// The caller takes over releasing the lease
    pub(crate) fn disarm(mut self) {
        self.release = None;
    }
}

impl Drop for LeaseGuard {
    fn drop(&mut self) {
        let Some(release) = self.release.take() else {
            return;
        };
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                warn!(key = %self.key, "gated work cancelled, releasing lease in background");
                handle.spawn(release);
            }
            Err(_) => warn!(key = %self.key, "no runtime to release lease, it will expire"),
        }
    }
}

#[cfg(test)]
#[path = "guard_tests.rs"]
mod tests;
