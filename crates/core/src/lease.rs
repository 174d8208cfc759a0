// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Lease data model shared by the semaphores and the stores
//!
//! A lease is a time-boxed row identified by `(pool, resource key, slot)`.
//! Ownership is proven by the token secret written into the row at acquire
//! time, never by caller identity.

use crate::error::LockError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Longest holder context a lease row accepts
pub const MAX_CONTEXT_CHARS: usize = 1000;

/// Lifetime of a write intent between two re-assertions by its holder
pub const WRITE_INTENT_TTL: Duration = Duration::from_secs(5);

/// The single slot of the exclusive pool
pub const EXCLUSIVE_SLOT: u32 = 0;

/// Which family of rows a lease belongs to
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Pool {
    /// Up to N slots per key, owned by a counting semaphore
    Counting,
    /// Read leases of an exclusive-or-shared semaphore; slots are uncapped
    Shared,
    /// The single write lease of an exclusive-or-shared semaphore
    Exclusive,
}

impl fmt::Display for Pool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Pool::Counting => "counting",
            Pool::Shared => "shared",
            Pool::Exclusive => "exclusive",
        };
        f.write_str(name)
    }
}

/// Lock discipline named in errors
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LockKind {
    Counting,
    Read,
    Write,
}

impl fmt::Display for LockKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LockKind::Counting => "counting",
            LockKind::Read => "read",
            LockKind::Write => "write",
        };
        f.write_str(name)
    }
}

/// Identifies the process (or caller) that holds a lease
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HolderId(pub String);

impl HolderId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// `host:pid` of the current process
    pub fn for_process() -> Self {
        let host = std::env::var("HOSTNAME").unwrap_or_else(|_| "localhost".to_string());
        Self(format!("{}:{}", host, std::process::id()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for HolderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Capability proving ownership of one lease slot
///
/// Rendered as `<secret>.<slot>` so it can travel through logs, environment
/// variables or job payloads and be parsed back.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct LeaseToken {
    slot: u32,
    secret: String,
}

impl LeaseToken {
    pub fn new(slot: u32, secret: impl Into<String>) -> Self {
        Self {
            slot,
            secret: secret.into(),
        }
    }

    pub fn slot(&self) -> u32 {
        self.slot
    }

    pub fn secret(&self) -> &str {
        &self.secret
    }
}

impl fmt::Display for LeaseToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.secret, self.slot)
    }
}

/// Error parsing a rendered lease token
#[derive(Debug, Error, PartialEq, Eq)]
#[error("malformed lease token: {0}")]
pub struct TokenParseError(String);

impl FromStr for LeaseToken {
    type Err = TokenParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (secret, slot) = s
            .rsplit_once('.')
            .ok_or_else(|| TokenParseError(s.to_string()))?;
        if secret.is_empty() {
            return Err(TokenParseError(s.to_string()));
        }
        let slot = slot.parse().map_err(|_| TokenParseError(s.to_string()))?;
        Ok(Self::new(slot, secret))
    }
}

/// Capability proving ownership of a write intent
///
/// Once the intent is promoted the same secret owns the exclusive lease, see
/// [`RequestToken::into_lease_token`].
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct RequestToken(String);

impl RequestToken {
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The token of the exclusive lease this request matures into
    pub fn into_lease_token(self) -> LeaseToken {
        LeaseToken::new(EXCLUSIVE_SLOT, self.0)
    }
}

impl fmt::Display for RequestToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

pub(crate) fn validate_key(key: &str) -> Result<(), LockError> {
    if key.trim().is_empty() {
        return Err(LockError::InvalidArgument(
            "resource key cannot be blank".to_string(),
        ));
    }
    Ok(())
}

pub(crate) fn validate_timeout(timeout: Duration) -> Result<(), LockError> {
    if timeout.is_zero() {
        return Err(LockError::InvalidArgument(
            "lease timeout must be greater than zero".to_string(),
        ));
    }
    Ok(())
}

pub(crate) fn validate_context(context: &str) -> Result<(), LockError> {
    if context.trim().is_empty() {
        return Err(LockError::InvalidArgument(
            "context cannot be blank".to_string(),
        ));
    }
    if context.chars().count() > MAX_CONTEXT_CHARS {
        return Err(LockError::InvalidArgument(format!(
            "context length cannot be more than: {}",
            MAX_CONTEXT_CHARS
        )));
    }
    Ok(())
}

#[cfg(test)]
#[path = "lease_tests.rs"]
mod tests;
