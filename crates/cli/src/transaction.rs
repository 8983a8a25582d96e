// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Transactional composition of file mutations and cache updates.
//!
//! A transaction acquires its file locks in canonical-key sorted order, which
//! precludes lock cycles across overlapping transactions, runs its file
//! operations in enqueue order, and publishes cache updates only after every
//! file operation succeeded. Filesystem mutations are atomic per file but not
//! across files: a mid-transaction failure leaves earlier operations applied
//! and publishes nothing.

use serde_json::{Map, Value};

use crate::context::AppContext;
use crate::error::Result;
use crate::locks::FileLockGuard;
use crate::state::FileRecord;

/// One file mutation inside a transaction.
#[derive(Debug, Clone)]
pub enum FileOp {
    /// Replace the contents of a key.
    Write { key: String, content: Vec<u8> },
    /// Append to a key, creating it when missing.
    Append { key: String, content: Vec<u8> },
    /// Remove a key.
    Delete { key: String },
    /// Shallow-merge a patch into a JSON document.
    UpdateJson {
        key: String,
        patch: Map<String, Value>,
        create_if_missing: bool,
    },
}

impl FileOp {
    /// Canonical key this operation touches.
    pub fn key(&self) -> &str {
        match self {
            FileOp::Write { key, .. }
            | FileOp::Append { key, .. }
            | FileOp::Delete { key }
            | FileOp::UpdateJson { key, .. } => key,
        }
    }

    fn is_delete(&self) -> bool {
        matches!(self, FileOp::Delete { .. })
    }
}

/// One cache update published on commit.
#[derive(Debug, Clone)]
pub enum CacheOp {
    /// Reload the key from disk into the cache and refresh its state record.
    Publish { key: String },
    /// Drop the key from the cache and its state record.
    Drop { key: String },
}

/// Outcome of a committed transaction.
#[derive(Debug, Clone, Copy, Default)]
pub struct TransactionOutcome {
    /// Whether the file operations all succeeded.
    pub committed: bool,
    /// Cache operations applied after commit.
    pub cache_ops_applied: usize,
    /// Cache operations that failed (logged, commit stands).
    pub cache_ops_failed: usize,
}

/// Ordered bundle of file and cache operations executed under a set of
/// per-file locks plus the cache lock.
pub struct Transaction {
    files: std::collections::BTreeSet<String>,
    update_cache: bool,
    file_ops: Vec<FileOp>,
    cache_ops: Vec<CacheOp>,
}

impl Transaction {
    /// Create a transaction over a set of canonical keys.
    pub fn new<I, S>(files: I, update_cache: bool) -> Transaction
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Transaction {
            files: files.into_iter().map(Into::into).collect(),
            update_cache,
            file_ops: Vec::new(),
            cache_ops: Vec::new(),
        }
    }

    /// Enqueue a file operation; its key joins the lock set.
    pub fn stage(&mut self, op: FileOp) {
        self.files.insert(op.key().to_string());
        self.file_ops.push(op);
    }

    /// Enqueue an explicit cache operation, published after the implicit
    /// ones derived from the file operations.
    pub fn stage_cache(&mut self, op: CacheOp) {
        self.cache_ops.push(op);
    }

    /// Abandon the transaction before execution. No effect.
    pub fn cancel(self) {}

    /// Acquire locks, run the file operations, publish cache updates.
    ///
    /// Lock acquisition failure releases everything already acquired and
    /// fails with `LockTimeout`. A failing file operation aborts with no
    /// cache publication. Cache publication is best-effort per operation.
    pub fn execute(mut self, ctx: &AppContext) -> Result<TransactionOutcome> {
        let mut guards: Vec<FileLockGuard> = Vec::with_capacity(self.files.len());
        for key in &self.files {
            match ctx.locks.file_lock(key, ctx.lock_timeout()) {
                Ok(guard) => guards.push(guard),
                Err(e) => {
                    release_reverse(&mut guards);
                    return Err(e);
                }
            }
        }

        // Cache lock is ordered strictly after the last file lock.
        let cache_guard = self.update_cache.then(|| ctx.locks.cache_lock());

        for op in &self.file_ops {
            if let Err(e) = apply_file_op(ctx, op) {
                tracing::error!("transaction aborted on {}: {e}", op.key());
                drop(cache_guard);
                release_reverse(&mut guards);
                return Err(e);
            }
        }

        let mut outcome = TransactionOutcome {
            committed: true,
            ..TransactionOutcome::default()
        };

        if self.update_cache {
            let mut ops: Vec<CacheOp> = self
                .file_ops
                .iter()
                .map(|op| {
                    let key = op.key().to_string();
                    if op.is_delete() {
                        CacheOp::Drop { key }
                    } else {
                        CacheOp::Publish { key }
                    }
                })
                .collect();
            ops.append(&mut self.cache_ops);

            for op in &ops {
                match apply_cache_op(ctx, op) {
                    Ok(()) => outcome.cache_ops_applied += 1,
                    Err(e) => {
                        outcome.cache_ops_failed += 1;
                        tracing::error!("cache operation failed: {e}");
                    }
                }
            }
        }

        drop(cache_guard);
        release_reverse(&mut guards);
        Ok(outcome)
    }
}

/// Release guards in reverse acquisition order.
fn release_reverse(guards: &mut Vec<FileLockGuard>) {
    while guards.pop().is_some() {}
}

fn apply_file_op(ctx: &AppContext, op: &FileOp) -> Result<()> {
    match op {
        FileOp::Write { key, content } => ctx.fileops.write_file(key, content),
        FileOp::Append { key, content } => ctx.fileops.append_file(key, content),
        FileOp::Delete { key } => ctx.fileops.delete_file(key).map(|_| ()),
        FileOp::UpdateJson {
            key,
            patch,
            create_if_missing,
        } => ctx
            .fileops
            .update_json(key, patch, *create_if_missing)
            .map(|_| ()),
    }
}

fn apply_cache_op(ctx: &AppContext, op: &CacheOp) -> Result<()> {
    match op {
        CacheOp::Publish { key } => {
            ctx.cache.load(key)?;
            let record = FileRecord::from_disk(&ctx.fileops.abs_path(key))?;
            ctx.state.update_record(key, record)
        }
        CacheOp::Drop { key } => {
            ctx.cache.invalidate(key);
            ctx.state.remove_record(key).map(|_| ())
        }
    }
}

#[cfg(test)]
#[path = "transaction_tests.rs"]
mod tests;
