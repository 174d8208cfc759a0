// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Lease table persisted as a JSON file
//!
//! Every operation takes an exclusive advisory lock on a sibling `.lock`
//! file, loads the table, applies the operation and, for writes, replaces
//! the file through a temp file and rename. All processes on a host that
//! open the same path therefore see one atomic table.
//!
//! Network filesystems that do not honor `flock` (many NFS setups) lose
//! that atomicity; keep the file on local disk.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dbsem_core::store::{Access, LeaseTable, TableBackend, TableStore};
use dbsem_core::{Clock, StoreError, SystemClock};
use fs2::FileExt;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// Lease store over a JSON file
pub type FileLeaseStore<C = SystemClock> = TableStore<FileBackend<C>>;

/// Open (or create on first write) the lease table at `path`
pub fn open_file_store(path: impl Into<PathBuf>) -> Result<FileLeaseStore, StoreError> {
    open_file_store_with_clock(path, SystemClock)
}

pub fn open_file_store_with_clock<C: Clock>(
    path: impl Into<PathBuf>,
    clock: C,
) -> Result<FileLeaseStore<C>, StoreError> {
    Ok(TableStore::new(FileBackend::open(path, clock)?))
}

#[derive(Clone, Debug)]
pub struct FileBackend<C: Clock = SystemClock> {
    paths: Arc<Paths>,
    clock: C,
}

#[derive(Debug)]
struct Paths {
    table: PathBuf,
    lock: PathBuf,
    temp: PathBuf,
}

impl<C: Clock> FileBackend<C> {
    pub fn open(path: impl Into<PathBuf>, clock: C) -> Result<Self, StoreError> {
        let table = path.into();
        if let Some(parent) = table.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(io_error(parent))?;
        }
        let paths = Paths {
            lock: sibling(&table, "lock"),
            temp: sibling(&table, "tmp"),
            table,
        };
        Ok(Self {
            paths: Arc::new(paths),
            clock,
        })
    }

    pub fn path(&self) -> &Path {
        &self.paths.table
    }
}

#[async_trait]
impl<C: Clock> TableBackend for FileBackend<C> {
    async fn with_table<R, F>(&self, access: Access, op: F) -> Result<R, StoreError>
    where
        F: FnOnce(&mut LeaseTable, DateTime<Utc>) -> R + Send + 'static,
        R: Send + 'static,
    {
        let paths = Arc::clone(&self.paths);
        let clock = self.clock.clone();
        tokio::task::spawn_blocking(move || apply(&paths, access, op, &clock))
            .await
            .map_err(|e| StoreError::Backend(format!("lease store task failed: {}", e)))?
    }
}

fn apply<R, F, C>(paths: &Paths, access: Access, op: F, clock: &C) -> Result<R, StoreError>
where
    F: FnOnce(&mut LeaseTable, DateTime<Utc>) -> R,
    C: Clock,
{
    let lock = OpenOptions::new()
        .create(true)
        .truncate(false)
        .read(true)
        .write(true)
        .open(&paths.lock)
        .map_err(io_error(&paths.lock))?;
    lock.lock_exclusive().map_err(io_error(&paths.lock))?;

    let mut table = load(&paths.table)?;
    // Read the time only once the lock is held
    let result = op(&mut table, clock.now());
    if access == Access::Write {
        save(paths, &table)?;
        debug!(path = %paths.table.display(), "lease table saved");
    }

    lock.unlock().map_err(io_error(&paths.lock))?;
    Ok(result)
}

fn load(path: &Path) -> Result<LeaseTable, StoreError> {
    match fs::read(path) {
        Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => Ok(LeaseTable::new()),
        Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(LeaseTable::new()),
        Err(e) => Err(io_error(path)(e)),
    }
}

fn save(paths: &Paths, table: &LeaseTable) -> Result<(), StoreError> {
    let json = serde_json::to_vec_pretty(table)?;
    let mut file = File::create(&paths.temp).map_err(io_error(&paths.temp))?;
    file.write_all(&json).map_err(io_error(&paths.temp))?;
    file.sync_all().map_err(io_error(&paths.temp))?;
    fs::rename(&paths.temp, &paths.table).map_err(io_error(&paths.table))
}

fn sibling(path: &Path, extension: &str) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".");
    name.push(extension);
    path.with_file_name(name)
}

fn io_error(path: &Path) -> impl FnOnce(io::Error) -> StoreError + '_ {
    move |source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    }
}

#[cfg(test)]
#[path = "file_tests.rs"]
mod tests;
