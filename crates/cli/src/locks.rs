// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Per-file and cache-wide reentrant locking.
//!
//! File locks gate both the on-disk bytes and the corresponding cache entry
//! mutation; the single cache lock guards the entry table and the state
//! snapshot updater. Ownership metadata is recorded for diagnostics.

use std::backtrace::{Backtrace, BacktraceStatus};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::thread::{self, ThreadId};
use std::time::{Duration, Instant};

use dashmap::DashMap;
use parking_lot::{Condvar, Mutex};

use crate::error::{Error, Result};

/// Default deadline for file-lock acquisition.
pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(5);

/// Diagnostics key for the cache-wide lock.
const CACHE_LOCK_KEY: &str = "<cache>";

#[derive(Debug, Default)]
struct LockState {
    owner: Option<ThreadId>,
    depth: u32,
    acquired_at: Option<Instant>,
    owner_name: Option<String>,
    acquired_from: Option<String>,
}

/// Reentrant per-key lock with ownership diagnostics.
///
/// Reentrancy is per thread: the owning thread may acquire again without
/// blocking, which supports handlers that call back into file operations
/// while a transaction holds their locks.
pub struct FileLock {
    key: String,
    state: Mutex<LockState>,
    available: Condvar,
}

impl FileLock {
    fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            state: Mutex::new(LockState::default()),
            available: Condvar::new(),
        }
    }

    /// Acquire the lock, waiting up to `timeout` (`None` = unbounded).
    fn acquire(&self, timeout: Option<Duration>) -> bool {
        let me = thread::current().id();
        let mut state = self.state.lock();

        if state.owner == Some(me) {
            state.depth += 1;
            return true;
        }

        let deadline = timeout.map(|t| Instant::now() + t);
        while state.owner.is_some() {
            match deadline {
                Some(deadline) => {
                    if self.available.wait_until(&mut state, deadline).timed_out()
                        && state.owner.is_some()
                    {
                        tracing::warn!("timeout waiting for lock on {}", self.key);
                        return false;
                    }
                }
                None => self.available.wait(&mut state),
            }
        }

        state.owner = Some(me);
        state.depth = 1;
        state.acquired_at = Some(Instant::now());
        state.owner_name = thread::current().name().map(str::to_string);
        let trace = Backtrace::capture();
        state.acquired_from =
            matches!(trace.status(), BacktraceStatus::Captured).then(|| trace.to_string());
        true
    }

    /// Release one level of ownership. Releasing a lock owned by another
    /// thread (or not held at all) logs a warning and is a no-op.
    fn release(&self) -> bool {
        let me = thread::current().id();
        let mut state = self.state.lock();

        if state.owner != Some(me) {
            tracing::warn!("release of lock on {} not owned by this thread", self.key);
            return false;
        }

        state.depth -= 1;
        if state.depth == 0 {
            *state = LockState::default();
            self.available.notify_one();
        }
        true
    }

    fn is_locked(&self) -> bool {
        self.state.lock().owner.is_some()
    }

    fn owner_info(&self) -> Option<LockOwnerInfo> {
        let state = self.state.lock();
        state.owner.map(|_| LockOwnerInfo {
            thread: state.owner_name.clone(),
            depth: state.depth,
            held_for: state.acquired_at.map(|t| t.elapsed()).unwrap_or_default(),
            acquired_from: state.acquired_from.clone(),
        })
    }
}

/// Ownership diagnostics for one held lock.
#[derive(Debug, Clone)]
pub struct LockOwnerInfo {
    /// Name of the owning thread, when it has one.
    pub thread: Option<String>,
    /// Reentrant acquisition depth.
    pub depth: u32,
    /// How long the lock has been held.
    pub held_for: Duration,
    /// Call stack at acquisition (present when backtraces are enabled).
    pub acquired_from: Option<String>,
}

/// Observable lock-manager state.
#[derive(Debug, Default)]
pub struct LockStatistics {
    /// Locks ever created.
    pub total: usize,
    /// Locks currently held.
    pub active: usize,
    /// Per-key owner diagnostics for held locks.
    pub owners: BTreeMap<String, LockOwnerInfo>,
}

/// RAII guard for a per-file lock.
pub struct FileLockGuard {
    lock: Arc<FileLock>,
}

impl FileLockGuard {
    /// Key this guard protects.
    pub fn key(&self) -> &str {
        &self.lock.key
    }
}

impl Drop for FileLockGuard {
    fn drop(&mut self) {
        self.lock.release();
    }
}

/// RAII guard for the cache-wide lock.
pub struct CacheLockGuard {
    lock: Arc<FileLock>,
}

impl Drop for CacheLockGuard {
    fn drop(&mut self) {
        self.lock.release();
    }
}

/// Lock table: per-file reentrant locks plus the cache-wide lock.
pub struct LockManager {
    files: DashMap<String, Arc<FileLock>>,
    cache: Arc<FileLock>,
    default_timeout: Option<Duration>,
}

impl LockManager {
    /// Create a manager with the given default file-lock deadline
    /// (`None` = unbounded).
    pub fn new(default_timeout: Option<Duration>) -> Self {
        Self {
            files: DashMap::new(),
            cache: Arc::new(FileLock::new(CACHE_LOCK_KEY)),
            default_timeout,
        }
    }

    fn lock_for(&self, key: &str) -> Arc<FileLock> {
        self.files
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(FileLock::new(key)))
            .clone()
    }

    /// Acquire the lock for `key`, blocking up to `timeout`.
    pub fn file_lock(&self, key: &str, timeout: Option<Duration>) -> Result<FileLockGuard> {
        let lock = self.lock_for(key);
        let started = Instant::now();
        if lock.acquire(timeout) {
            Ok(FileLockGuard { lock })
        } else {
            Err(Error::LockTimeout {
                key: key.to_string(),
                waited: started.elapsed(),
            })
        }
    }

    /// Acquire the lock for `key` with the manager's default deadline.
    pub fn file_lock_default(&self, key: &str) -> Result<FileLockGuard> {
        self.file_lock(key, self.default_timeout)
    }

    /// Acquire the cache-wide lock. Unbounded; reentrant per thread.
    pub fn cache_lock(&self) -> CacheLockGuard {
        self.cache.acquire(None);
        CacheLockGuard {
            lock: Arc::clone(&self.cache),
        }
    }

    /// Default file-lock deadline this manager was built with.
    pub fn default_timeout(&self) -> Option<Duration> {
        self.default_timeout
    }

    /// Snapshot lock diagnostics.
    pub fn statistics(&self) -> LockStatistics {
        let mut stats = LockStatistics {
            total: self.files.len(),
            ..LockStatistics::default()
        };

        for entry in self.files.iter() {
            if let Some(info) = entry.value().owner_info() {
                stats.active += 1;
                stats.owners.insert(entry.key().clone(), info);
            }
        }
        if let Some(info) = self.cache.owner_info() {
            stats.active += 1;
            stats.owners.insert(CACHE_LOCK_KEY.to_string(), info);
        }

        stats
    }

    /// Discard all file locks. Refuses while any lock is held, since a
    /// transaction in flight still depends on the table.
    pub fn cleanup_locks(&self) -> Result<usize> {
        let active = self.files.iter().any(|e| e.value().is_locked());
        if active || self.cache.is_locked() {
            return Err(Error::Internal(
                "cannot discard locks while transactions are in flight".to_string(),
            ));
        }

        let count = self.files.len();
        self.files.clear();
        Ok(count)
    }
}

#[cfg(test)]
#[path = "locks_tests.rs"]
mod tests;
