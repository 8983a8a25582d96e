// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Cache-to-filesystem synchronization verification and repair.
//!
//! Compares the persisted cache state against a walk of the base directory
//! and classifies every divergence into one of three disjoint sets, then
//! optionally repairs the state from filesystem truth.

use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;
use std::sync::Arc;

use globset::{Glob, GlobSet, GlobSetBuilder};

use crate::checkpoint;
use crate::error::{Error, Result};
use crate::state::{
    CACHE_STATE_FILE, CacheStateFile, DETAILED_STATE_FILE, FileRecord, StateStore,
};
use crate::walker::{DocWalker, WalkerConfig};

/// Divergence detail for one key present on both sides.
#[derive(Debug, Clone)]
pub struct MismatchDetail {
    /// Record built from filesystem truth.
    pub disk: FileRecord,
    /// Record found in the cache state.
    pub cached: FileRecord,
}

/// Result of a verification pass: three disjoint sets.
#[derive(Debug, Default)]
pub struct SyncReport {
    /// Paths present on disk but absent from the cache state.
    pub missing_in_cache: BTreeSet<String>,
    /// Keys present in the cache state but absent on disk.
    pub missing_in_filesystem: BTreeSet<String>,
    /// Keys present on both sides with differing metadata.
    pub metadata_mismatch: BTreeMap<String, MismatchDetail>,
}

impl SyncReport {
    /// Whether cache state and filesystem agree.
    pub fn is_clean(&self) -> bool {
        self.missing_in_cache.is_empty()
            && self.missing_in_filesystem.is_empty()
            && self.metadata_mismatch.is_empty()
    }

    /// Total number of divergences.
    pub fn total(&self) -> usize {
        self.missing_in_cache.len()
            + self.missing_in_filesystem.len()
            + self.metadata_mismatch.len()
    }
}

/// Result of a repair pass.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixSummary {
    /// Records inserted from the filesystem.
    pub added: usize,
    /// Records dropped for vanished files.
    pub removed: usize,
    /// Records rewritten from filesystem truth.
    pub updated: usize,
    /// Whether the re-verify after persisting came back clean.
    pub clean: bool,
}

/// Verifier over one base directory and its persisted cache state.
pub struct SyncVerifier {
    base_dir: PathBuf,
    state: Arc<StateStore>,
    include: GlobSet,
    exclude: GlobSet,
}

impl SyncVerifier {
    /// Build a verifier; pattern compilation failures are config errors.
    pub fn new(
        base_dir: PathBuf,
        state: Arc<StateStore>,
        include_patterns: &[String],
        exclude_patterns: &[String],
    ) -> Result<SyncVerifier> {
        Ok(SyncVerifier {
            base_dir,
            state,
            include: build_globset(include_patterns)?,
            exclude: build_globset(exclude_patterns)?,
        })
    }

    /// Compare cache state against the filesystem.
    pub fn verify(&self) -> Result<SyncReport> {
        let state = self.load_state_or_empty()?;
        let disk = self.scan();

        let mut report = SyncReport::default();

        for key in disk.keys() {
            if !state.files.contains_key(key) {
                report.missing_in_cache.insert(key.clone());
            }
        }
        for key in state.files.keys() {
            if !disk.contains_key(key) {
                report.missing_in_filesystem.insert(key.clone());
            }
        }

        for (key, path) in &disk {
            let Some(cached) = state.files.get(key) else {
                continue;
            };
            let record = match FileRecord::from_disk(path) {
                Ok(record) => record,
                Err(e) => {
                    tracing::warn!("skipping {key}: {e}");
                    continue;
                }
            };
            if !record.matches(cached) {
                report.metadata_mismatch.insert(
                    key.clone(),
                    MismatchDetail {
                        disk: record,
                        cached: cached.clone(),
                    },
                );
            }
        }

        tracing::info!(
            "verify: {} missing in cache, {} missing on disk, {} mismatched",
            report.missing_in_cache.len(),
            report.missing_in_filesystem.len(),
            report.metadata_mismatch.len()
        );
        Ok(report)
    }

    /// Repair every divergence from filesystem truth, persist the state
    /// atomically, and re-verify. The summary is clean only when the second
    /// verify returns three empty sets.
    pub fn fix_sync_issues(&self) -> Result<FixSummary> {
        let report = self.verify()?;
        let mut state = self.load_state_or_empty()?;
        let mut summary = FixSummary::default();

        for key in &report.missing_in_cache {
            match FileRecord::from_disk(&self.base_dir.join(key)) {
                Ok(record) => {
                    state.files.insert(key.clone(), record);
                    summary.added += 1;
                }
                Err(e) => tracing::warn!("cannot record {key}: {e}"),
            }
        }

        for key in &report.missing_in_filesystem {
            if state.files.remove(key).is_some() {
                summary.removed += 1;
            }
        }

        for key in report.metadata_mismatch.keys() {
            match FileRecord::from_disk(&self.base_dir.join(key)) {
                Ok(record) => {
                    state.files.insert(key.clone(), record);
                    summary.updated += 1;
                }
                Err(e) => tracing::warn!("cannot refresh {key}: {e}"),
            }
        }

        state.snapshot.document_count = state.files.len();
        state.snapshot.cache_size = state.files.values().map(|r| r.size).sum();
        state.snapshot.is_initialized = true;
        self.state.save(&state)?;

        summary.clean = self.verify()?.is_clean();
        if !summary.clean {
            tracing::warn!("sync issues remain after repair");
        }
        Ok(summary)
    }

    /// Rebuild the cache state from scratch: clear, then verify and repair.
    pub fn initialize_cache(&self) -> Result<FixSummary> {
        let mut state = self.load_state_or_empty()?;
        state.files.clear();
        state.snapshot.document_count = 0;
        state.snapshot.cache_size = 0;
        self.state.save(&state)?;
        self.fix_sync_issues()
    }

    /// An unreadable state file counts as empty: the next repair rebuilds
    /// it from filesystem truth.
    fn load_state_or_empty(&self) -> Result<CacheStateFile> {
        match self.state.load() {
            Ok(state) => Ok(state),
            Err(Error::Corrupted { key, message }) => {
                tracing::warn!("unreadable cache state ({key}: {message}); treating as empty");
                Ok(CacheStateFile::default())
            }
            Err(e) => Err(e),
        }
    }

    /// Walk the base directory and keep files passing the patterns. State
    /// files and checkpoint artifacts are never documents.
    fn scan(&self) -> BTreeMap<String, PathBuf> {
        let (docs, stats) = DocWalker::new(WalkerConfig::default()).walk_collect(&self.base_dir);
        if stats.errors > 0 {
            tracing::warn!("{} errors during filesystem scan", stats.errors);
        }

        let mut out = BTreeMap::new();
        for doc in docs {
            if self.is_reserved(&doc.key) || !self.matches_patterns(&doc.key) {
                continue;
            }
            out.insert(doc.key, doc.path);
        }
        out
    }

    fn is_reserved(&self, key: &str) -> bool {
        key == CACHE_STATE_FILE
            || key == DETAILED_STATE_FILE
            || key.starts_with(&format!("{}/", checkpoint::BACKUP_DIR))
            || key.ends_with(".tmp")
    }

    fn matches_patterns(&self, key: &str) -> bool {
        (self.include.is_empty() || self.include.is_match(key)) && !self.exclude.is_match(key)
    }
}

fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern).map_err(|e| Error::Config {
            message: format!("invalid sync pattern {pattern:?}: {e}"),
            path: None,
        })?;
        builder.add(glob);
    }
    builder.build().map_err(|e| Error::Config {
        message: e.to_string(),
        path: None,
    })
}

#[cfg(test)]
#[path = "verifier_tests.rs"]
mod tests;
