// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Lease stores shared between processes
//!
//! [`FileLeaseStore`] is the only durable backend. It coordinates the
//! processes of one host, or hosts sharing a filesystem with working
//! `flock` semantics; it is not a database shared by a fleet of servers.
//! Each operation rereads the whole table and each write rewrites it, so
//! cost grows with the number of rows and every operation is serialized
//! behind one lock. Run `dbsem gc` to keep the table small. A fleet-wide
//! deployment needs another [`TableBackend`](dbsem_core::TableBackend)
//! or [`LeaseStore`](dbsem_core::LeaseStore) over a shared database.

mod file;
mod traced;

pub use file::{open_file_store, open_file_store_with_clock, FileBackend, FileLeaseStore};
pub use traced::TracedLeaseStore;
