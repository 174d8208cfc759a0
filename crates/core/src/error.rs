// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for lease stores and semaphores

use crate::lease::LockKind;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by a lease store backend
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("lease table serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("lease store backend failed: {0}")]
    Backend(String),
}

/// Errors returned to callers of the semaphores
#[derive(Debug, Error)]
pub enum LockError {
    /// The lock cannot be acquired right now; retrying later may succeed
    #[error("{kind} lock unavailable for '{key}'{}", held_by(.holder))]
    LockUnavailable {
        key: String,
        kind: LockKind,
        holder: Option<String>,
    },
    /// A release found its lease already expired or reclaimed
    #[error("{kind} lock release failed for '{key}': lease expired before release, timeout too short")]
    LockReleaseFailed { key: String, kind: LockKind },
    /// The token no longer owns a live lease
    #[error("no live {kind} lease for '{key}' matches the token")]
    NotFound { key: String, kind: LockKind },
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl LockError {
    /// Only contention is worth retrying; everything else needs a fix
    pub fn is_retryable(&self) -> bool {
        matches!(self, LockError::LockUnavailable { .. })
    }

    pub(crate) fn unavailable(key: &str, kind: LockKind, holder: Option<String>) -> Self {
        LockError::LockUnavailable {
            key: key.to_string(),
            kind,
            holder,
        }
    }
}

fn held_by(holder: &Option<String>) -> String {
    match holder {
        Some(h) => format!(" (held by {})", h),
        None => String::new(),
    }
}
