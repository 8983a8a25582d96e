// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Checkpoint-safe shutdown, backup and restore.
//!
//! An external supervisor asks the system to become quiescent: cache state
//! persisted, observers drained, no open descriptors. After the checkpoint a
//! restore pass rehydrates the cache, preferring the backup files and falling
//! back to the live state files.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;

use crate::cache::{BackupEntry, DocumentStore, HASH_MAX_BYTES};
use crate::cleanup::{CleanupOutcome, CleanupRegistry};
use crate::error::{Error, Result};
use crate::fileops::FileOps;
use crate::state::{
    CacheStateFile, DetailedSnapshot, EntryMetadata, FileRecord, StateSnapshot, StateStore,
    system_time_secs, time_from_parts,
};

/// Default backup directory under the project root.
pub const BACKUP_DIR: &str = "checkpoint_backup";

/// Full cache contents, postcard-encoded.
pub const CACHE_BACKUP_FILE: &str = "cache_backup.bin";

/// Copy of the aggregate state at backup time.
pub const STATE_BACKUP_FILE: &str = "state_backup.json";

/// Timestamp and version of the last prepared checkpoint.
pub const METADATA_FILE: &str = "checkpoint_metadata.json";

/// Report written after the quiescence protocol.
pub const CLEANUP_REPORT_FILE: &str = "cleanup_report.json";

/// Report written after a restore.
pub const RECOVERY_REPORT_FILE: &str = "recovery_report.json";

/// Report written when the protocol aborts.
pub const DIAGNOSTIC_REPORT_FILE: &str = "checkpoint_diagnostic_report.json";

/// Declared protocol version, recorded in the metadata file.
pub const CHECKPOINT_VERSION: &str = "1.1";

/// Result of a prepare pass.
#[derive(Debug, Clone, Copy)]
pub struct PrepareSummary {
    /// Documents captured in the backup.
    pub documents: usize,
    /// Cleanup handlers that ran successfully.
    pub handlers_run: usize,
    /// Cleanup handlers that failed.
    pub handlers_failed: usize,
}

/// Where a restore found its data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestoreSource {
    /// The checkpoint backup files.
    Backup,
    /// The live state files.
    LiveState,
}

impl RestoreSource {
    /// Name used in the recovery report.
    pub fn as_str(&self) -> &'static str {
        match self {
            RestoreSource::Backup => "checkpoint_backup",
            RestoreSource::LiveState => "regular_state",
        }
    }
}

/// Result of a restore pass.
#[derive(Debug, Clone, Copy)]
pub struct RestoreSummary {
    /// Entries installed into the cache.
    pub restored: usize,
    /// Which files supplied the data.
    pub source: RestoreSource,
}

/// Checkpoint driver over a document store.
pub struct Checkpoint {
    store: Arc<dyn DocumentStore>,
    state: Arc<StateStore>,
    cleanup: Arc<CleanupRegistry>,
    fileops: Arc<FileOps>,
    backup_dir: String,
    max_cache_size: usize,
    watched_directories: Vec<String>,
    settle: Duration,
}

impl Checkpoint {
    /// Create a checkpoint driver.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        store: Arc<dyn DocumentStore>,
        state: Arc<StateStore>,
        cleanup: Arc<CleanupRegistry>,
        fileops: Arc<FileOps>,
        backup_dir: String,
        max_cache_size: usize,
        watched_directories: Vec<String>,
        settle: Duration,
    ) -> Self {
        Self {
            store,
            state,
            cleanup,
            fileops,
            backup_dir,
            max_cache_size,
            watched_directories,
            settle,
        }
    }

    /// Override the settle interval (tests use zero).
    pub fn with_settle(mut self, settle: Duration) -> Self {
        self.settle = settle;
        self
    }

    fn backup_key(&self, name: &str) -> String {
        format!("{}/{name}", self.backup_dir)
    }

    /// Run the full quiescence protocol: metadata, snapshot, cleanup
    /// handlers, cache shutdown, settle, cleanup report.
    pub fn prepare(&self) -> Result<PrepareSummary> {
        if let Err(e) = self.write_metadata() {
            tracing::warn!("failed to write checkpoint metadata: {e}");
        }

        let documents = match self.backup() {
            Ok(count) => count,
            Err(e) => {
                self.write_diagnostic("backup", &e);
                return Err(Error::CheckpointAborted {
                    stage: "backup",
                    message: e.to_string(),
                });
            }
        };

        let outcome = self.cleanup.run_all();
        self.store.shutdown();

        if !self.settle.is_zero() {
            std::thread::sleep(self.settle);
        }

        let report = serde_json::json!({
            "timestamp": Utc::now().to_rfc3339(),
            "status": "success",
            "handlers_run": outcome.ran,
            "handlers_failed": outcome.failed,
            "documents_backed_up": documents,
        });
        if let Err(e) = self
            .fileops
            .write_json(&self.backup_key(CLEANUP_REPORT_FILE), &report)
        {
            tracing::warn!("failed to write cleanup report: {e}");
        }

        Ok(PrepareSummary {
            documents,
            handlers_run: outcome.ran,
            handlers_failed: outcome.failed,
        })
    }

    /// Snapshot the cache into the backup directory and refresh the live
    /// state files. Returns the number of documents captured.
    pub fn backup(&self) -> Result<usize> {
        let entries = self.store.snapshot();

        let bytes =
            postcard::to_allocvec(&entries).map_err(|e| Error::Internal(e.to_string()))?;
        self.fileops
            .write_file(&self.backup_key(CACHE_BACKUP_FILE), &bytes)?;

        let state = self.state_from_entries(&entries);
        let value = serde_json::to_value(&state).map_err(|e| Error::Internal(e.to_string()))?;
        self.fileops
            .write_json(&self.backup_key(STATE_BACKUP_FILE), &value)?;
        self.state.save(&state)?;

        let detailed = DetailedSnapshot {
            entries: entries
                .iter()
                .map(|e| {
                    (
                        e.key.clone(),
                        EntryMetadata {
                            accessed_secs: e.accessed_secs,
                            accessed_nanos: e.accessed_nanos,
                            modified_secs: e.modified_secs,
                            modified_nanos: e.modified_nanos,
                            access_count: e.access_count,
                            size: e.size,
                            category: e.category,
                        },
                    )
                })
                .collect(),
            ..DetailedSnapshot::default()
        };
        self.state.save_detailed(&detailed)?;

        tracing::info!("backed up {} documents", entries.len());
        Ok(entries.len())
    }

    /// Rehydrate the cache: backup files win, live state is the fallback.
    /// With neither present the cache stays empty and the restore fails.
    pub fn restore(&self) -> Result<RestoreSummary> {
        let backup_key = self.backup_key(CACHE_BACKUP_FILE);
        if self.fileops.exists(&backup_key) {
            let bytes = self.fileops.read_file(&backup_key)?;
            let entries: Vec<BackupEntry> =
                postcard::from_bytes(&bytes).map_err(|e| Error::Corrupted {
                    key: backup_key.clone(),
                    message: e.to_string(),
                })?;

            self.restore_live_state_from_backup();

            let restored = self.store.restore(entries);
            self.write_recovery(restored, RestoreSource::Backup);
            return Ok(RestoreSummary {
                restored,
                source: RestoreSource::Backup,
            });
        }

        let detailed = self.state.load_detailed()?;
        if detailed.is_none() && !self.state.state_exists() {
            return Err(Error::CheckpointAborted {
                stage: "restore",
                message: "no backup or live state found".to_string(),
            });
        }

        // Metadata-only fallback: contents come back from the documents
        // still on disk; vanished files are skipped.
        let mut entries = Vec::new();
        if let Some(snapshot) = detailed {
            for (key, meta) in snapshot.entries {
                match self.fileops.read_file(&key) {
                    Ok(content) => entries.push(BackupEntry {
                        content,
                        accessed_secs: meta.accessed_secs,
                        accessed_nanos: meta.accessed_nanos,
                        modified_secs: meta.modified_secs,
                        modified_nanos: meta.modified_nanos,
                        access_count: meta.access_count,
                        size: meta.size,
                        priority: 0,
                        category: meta.category,
                        key,
                    }),
                    Err(e) => tracing::warn!("cannot rehydrate {key}: {e}"),
                }
            }
        }

        let restored = self.store.restore(entries);
        self.write_recovery(restored, RestoreSource::LiveState);
        Ok(RestoreSummary {
            restored,
            source: RestoreSource::LiveState,
        })
    }

    /// Run the cleanup handlers alone and write the cleanup report.
    pub fn run_cleanup(&self) -> Result<CleanupOutcome> {
        let outcome = self.cleanup.run_all();
        let status = if outcome.failed == 0 { "success" } else { "partial" };
        let report = serde_json::json!({
            "timestamp": Utc::now().to_rfc3339(),
            "status": status,
            "handlers_run": outcome.ran,
            "handlers_failed": outcome.failed,
        });
        self.fileops
            .write_json(&self.backup_key(CLEANUP_REPORT_FILE), &report)?;
        Ok(outcome)
    }

    fn state_from_entries(&self, entries: &[BackupEntry]) -> CacheStateFile {
        let mut files = BTreeMap::new();
        for entry in entries {
            let modified = time_from_parts(entry.modified_secs, entry.modified_nanos);
            let content_hash = (entry.size <= HASH_MAX_BYTES)
                .then(|| format!("{:x}", md5::compute(&entry.content)));
            files.insert(
                entry.key.clone(),
                FileRecord {
                    size: entry.size,
                    last_modified: system_time_secs(modified),
                    content_hash,
                },
            );
        }

        CacheStateFile {
            snapshot: StateSnapshot {
                cache_size: entries.iter().map(|e| e.size).sum(),
                document_count: entries.len(),
                max_cache_size: self.max_cache_size,
                is_initialized: true,
                watched_directories: self.watched_directories.clone(),
            },
            files,
        }
    }

    fn restore_live_state_from_backup(&self) {
        let state_backup = self.backup_key(STATE_BACKUP_FILE);
        if !self.fileops.exists(&state_backup) {
            return;
        }
        match self
            .fileops
            .read_json(&state_backup)
            .and_then(|value| {
                serde_json::from_value::<CacheStateFile>(value).map_err(|e| Error::Corrupted {
                    key: state_backup.clone(),
                    message: e.to_string(),
                })
            }) {
            Ok(state) => {
                if let Err(e) = self.state.save(&state) {
                    tracing::warn!("failed to restore live state: {e}");
                }
            }
            Err(e) => tracing::warn!("unusable state backup: {e}"),
        }
    }

    fn write_recovery(&self, restored: usize, source: RestoreSource) {
        let report = serde_json::json!({
            "timestamp": Utc::now().to_rfc3339(),
            "restored_documents": restored,
            "source": source.as_str(),
            "success": true,
        });
        if let Err(e) = self
            .fileops
            .write_json(&self.backup_key(RECOVERY_REPORT_FILE), &report)
        {
            tracing::warn!("failed to write recovery report: {e}");
        }
    }

    fn write_diagnostic(&self, stage: &str, error: &Error) {
        let report = serde_json::json!({
            "timestamp": Utc::now().to_rfc3339(),
            "stage": stage,
            "error": error.to_string(),
            "success": false,
        });
        if let Err(e) = self
            .fileops
            .write_json(&self.backup_key(DIAGNOSTIC_REPORT_FILE), &report)
        {
            tracing::warn!("failed to write diagnostic report: {e}");
        }
    }

    fn write_metadata(&self) -> Result<()> {
        let metadata = serde_json::json!({
            "timestamp": Utc::now().to_rfc3339(),
            "checkpoint_version": CHECKPOINT_VERSION,
        });
        self.fileops
            .write_json(&self.backup_key(METADATA_FILE), &metadata)
    }
}

#[cfg(test)]
#[path = "checkpoint_tests.rs"]
mod tests;
