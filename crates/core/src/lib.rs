// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! dbsem-core: lease-based cluster coordination over a shared store
//!
//! This crate provides:
//! - The lease data model and the atomic [`LeaseStore`] boundary
//! - A counting semaphore (N holders per resource key)
//! - An exclusive-or-shared semaphore with two-phase writer acquisition
//! - TOML configuration

pub mod clock;
pub mod config;
pub mod counting;
pub mod error;
pub mod exclusive;
pub mod secret;
pub mod lease;
pub mod store;

pub use clock::{Clock, FakeClock, SystemClock};
pub use config::{Config, ConfigError, MaintenanceConfig, RunnerConfig, SemaphoreLimits};
pub use counting::CountingSemaphore;
pub use error::{LockError, StoreError};
pub use exclusive::{ExclusiveOrSharedSemaphore, ResourceState};
pub use secret::{RandomSecrets, SecretGen, SequentialSecrets};
pub use lease::{
    HolderId, LeaseToken, LockKind, Pool, RequestToken, TokenParseError, MAX_CONTEXT_CHARS,
    WRITE_INTENT_TTL,
};
pub use store::{
    Access, LeaseStore, MemoryBackend, MemoryLeaseStore, NewLease, Removal, ResourceStatus,
    TableBackend, TableStore,
};

#[cfg(any(test, feature = "test-support"))]
pub use store::FaultyStore;
