// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Persisted cache state.
//!
//! Two files carry state across restarts: `cache_state.json` (aggregate
//! snapshot plus per-file records, the sync verifier's source of truth) and
//! `cache_detailed_state.bin` (a postcard-encoded metadata-only projection
//! used by checkpoint restore).

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use serde::{Deserialize, Serialize};

use crate::cache::HASH_MAX_BYTES;
use crate::category::DocCategory;
use crate::error::{Error, Result};
use crate::fileops::FileOps;

/// Live aggregate state file.
pub const CACHE_STATE_FILE: &str = "cache_state.json";

/// Live detailed (metadata-only) state file.
pub const DETAILED_STATE_FILE: &str = "cache_detailed_state.bin";

/// Format version for the detailed snapshot.
pub const DETAILED_STATE_VERSION: u32 = 1;

/// Modification-time comparison tolerance in seconds.
pub const MTIME_TOLERANCE_SECS: f64 = 1.0;

/// Aggregate cache state; never holds document contents.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StateSnapshot {
    /// Total cached content bytes.
    pub cache_size: u64,
    /// Number of cached documents.
    pub document_count: usize,
    /// Configured document budget.
    pub max_cache_size: usize,
    /// Whether the cache has been initialized.
    pub is_initialized: bool,
    /// Directories the cache watches for documents.
    pub watched_directories: Vec<String>,
}

/// Per-file record inside `cache_state.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileRecord {
    /// File size in bytes.
    pub size: u64,
    /// Modification time, seconds since epoch.
    pub last_modified: f64,
    /// Lowercase hex md5 of the content; absent above [`HASH_MAX_BYTES`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_hash: Option<String>,
}

impl FileRecord {
    /// Build a record from filesystem truth.
    pub fn from_disk(path: &Path) -> Result<FileRecord> {
        let meta = fs::metadata(path).map_err(|e| Error::io(path, e))?;
        let last_modified =
            system_time_secs(meta.modified().unwrap_or(SystemTime::UNIX_EPOCH));

        let content_hash = if meta.len() <= HASH_MAX_BYTES {
            let bytes = fs::read(path).map_err(|e| Error::io(path, e))?;
            Some(format!("{:x}", md5::compute(&bytes)))
        } else {
            None
        };

        Ok(FileRecord {
            size: meta.len(),
            last_modified,
            content_hash,
        })
    }

    /// Whether two records agree: equal size, mtimes within tolerance, and
    /// matching hashes when both sides carry one.
    pub fn matches(&self, other: &FileRecord) -> bool {
        self.size == other.size
            && (self.last_modified - other.last_modified).abs() <= MTIME_TOLERANCE_SECS
            && match (&self.content_hash, &other.content_hash) {
                (Some(a), Some(b)) => a == b,
                _ => true,
            }
    }
}

/// Full contents of `cache_state.json`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CacheStateFile {
    /// Aggregate fields.
    #[serde(flatten)]
    pub snapshot: StateSnapshot,
    /// Per-file records keyed by canonical key.
    #[serde(default)]
    pub files: BTreeMap<String, FileRecord>,
}

/// Metadata-only projection of one cache entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntryMetadata {
    pub accessed_secs: i64,
    pub accessed_nanos: u32,
    pub modified_secs: i64,
    pub modified_nanos: u32,
    pub access_count: u64,
    pub size: u64,
    pub category: DocCategory,
}

/// Contents of `cache_detailed_state.bin`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetailedSnapshot {
    /// Format version for invalidation on layout changes.
    pub version: u32,
    /// Metadata per canonical key.
    pub entries: BTreeMap<String, EntryMetadata>,
}

impl Default for DetailedSnapshot {
    fn default() -> Self {
        Self {
            version: DETAILED_STATE_VERSION,
            entries: BTreeMap::new(),
        }
    }
}

/// Reader/writer for the two state files. Record mutations are
/// read-modify-write; callers serialize them under the cache lock.
pub struct StateStore {
    fileops: Arc<FileOps>,
}

impl StateStore {
    /// Create a store over the project's file operations.
    pub fn new(fileops: Arc<FileOps>) -> Self {
        Self { fileops }
    }

    /// Canonical key of the aggregate state file.
    pub fn state_key(&self) -> &'static str {
        CACHE_STATE_FILE
    }

    /// Whether the aggregate state file exists.
    pub fn state_exists(&self) -> bool {
        self.fileops.exists(CACHE_STATE_FILE)
    }

    /// Load the aggregate state; a missing file is an empty state.
    pub fn load(&self) -> Result<CacheStateFile> {
        if !self.fileops.exists(CACHE_STATE_FILE) {
            return Ok(CacheStateFile::default());
        }
        let value = self.fileops.read_json(CACHE_STATE_FILE)?;
        serde_json::from_value(value).map_err(|e| Error::Corrupted {
            key: CACHE_STATE_FILE.to_string(),
            message: e.to_string(),
        })
    }

    /// Persist the aggregate state atomically.
    pub fn save(&self, state: &CacheStateFile) -> Result<()> {
        let value = serde_json::to_value(state).map_err(|e| Error::Internal(e.to_string()))?;
        self.fileops.write_json(CACHE_STATE_FILE, &value)
    }

    /// Insert or replace the record for one key.
    pub fn update_record(&self, key: &str, record: FileRecord) -> Result<()> {
        let mut state = self.load()?;
        state.files.insert(key.to_string(), record);
        state.snapshot.document_count = state.files.len();
        state.snapshot.cache_size = state.files.values().map(|r| r.size).sum();
        self.save(&state)
    }

    /// Drop the record for one key. Returns whether it existed.
    pub fn remove_record(&self, key: &str) -> Result<bool> {
        let mut state = self.load()?;
        let existed = state.files.remove(key).is_some();
        if existed {
            state.snapshot.document_count = state.files.len();
            state.snapshot.cache_size = state.files.values().map(|r| r.size).sum();
            self.save(&state)?;
        }
        Ok(existed)
    }

    /// Persist the detailed snapshot atomically.
    pub fn save_detailed(&self, snapshot: &DetailedSnapshot) -> Result<()> {
        let bytes =
            postcard::to_allocvec(snapshot).map_err(|e| Error::Internal(e.to_string()))?;
        self.fileops.write_file(DETAILED_STATE_FILE, &bytes)
    }

    /// Load the detailed snapshot; `None` when it has never been written.
    pub fn load_detailed(&self) -> Result<Option<DetailedSnapshot>> {
        if !self.fileops.exists(DETAILED_STATE_FILE) {
            return Ok(None);
        }
        let bytes = self.fileops.read_file(DETAILED_STATE_FILE)?;
        let snapshot: DetailedSnapshot =
            postcard::from_bytes(&bytes).map_err(|e| Error::Corrupted {
                key: DETAILED_STATE_FILE.to_string(),
                message: e.to_string(),
            })?;
        if snapshot.version != DETAILED_STATE_VERSION {
            return Err(Error::Corrupted {
                key: DETAILED_STATE_FILE.to_string(),
                message: format!("unsupported snapshot version {}", snapshot.version),
            });
        }
        Ok(Some(snapshot))
    }
}

/// Seconds since epoch as a float; pre-epoch times collapse to zero.
pub(crate) fn system_time_secs(t: SystemTime) -> f64 {
    t.duration_since(SystemTime::UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or_default()
}

/// Split a timestamp into whole seconds and nanoseconds since epoch.
pub(crate) fn time_parts(t: SystemTime) -> (i64, u32) {
    let duration = t
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap_or_default();
    (duration.as_secs() as i64, duration.subsec_nanos())
}

/// Rebuild a timestamp from its stored parts.
pub(crate) fn time_from_parts(secs: i64, nanos: u32) -> SystemTime {
    SystemTime::UNIX_EPOCH + Duration::new(secs.max(0) as u64, nanos)
}

#[cfg(test)]
#[path = "state_tests.rs"]
mod tests;
