// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for gated runners

use dbsem_core::LockError;
use std::time::Duration;
use thiserror::Error;

/// Why gated work did not produce a value
#[derive(Debug, Error)]
pub enum RunError<E> {
    #[error(transparent)]
    Lock(#[from] LockError),
    /// The work itself failed; the lease was still released
    #[error("gated work failed: {0}")]
    Work(E),
    #[error("gave up waiting for the exclusive lock on '{key}' after {waited:?}")]
    TimedOut { key: String, waited: Duration },
}

impl<E> RunError<E> {
    pub fn is_lock_unavailable(&self) -> bool {
        matches!(self, RunError::Lock(LockError::LockUnavailable { .. }))
    }

    pub fn work_error(&self) -> Option<&E> {
        match self {
            RunError::Work(e) => Some(e),
            _ => None,
        }
    }
}
