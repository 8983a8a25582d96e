// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory document cache.
//!
//! Holds a bounded collection of cache entries keyed by canonical key, with
//! approximate-LRU eviction biased by per-entry priority, running hit-rate
//! statistics, token-overlap search, and directory preloading. All table
//! mutations hold the cache lock; single-entry reads go through the
//! concurrent map directly.

use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::SystemTime;

use dashmap::DashMap;
use serde::{Deserialize, Serialize};

use crate::category::DocCategory;
use crate::error::Result;
use crate::fileops::FileOps;
use crate::locks::LockManager;
use crate::state::{time_from_parts, time_parts};
use crate::walker::{DocWalker, WalkerConfig};

/// Largest content size that still gets a stored hash.
pub const HASH_MAX_BYTES: u64 = 10 * 1024 * 1024;

/// Maximum results returned by a search.
pub const SEARCH_LIMIT: usize = 25;

/// In-memory record for one document.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// Canonical key; identity.
    pub key: String,
    /// Full document bytes. Arc'd for O(1) clone on cache hits.
    pub content: Arc<Vec<u8>>,
    /// Byte length of `content`.
    pub size: u64,
    /// Filesystem mtime at load/update.
    pub last_modified: SystemTime,
    /// Wall-clock time of the last successful read.
    pub last_accessed: SystemTime,
    /// Successful reads of this entry.
    pub access_count: u64,
    /// Eviction bias; higher is stickier.
    pub priority: i32,
    /// Category derived from the key.
    pub category: DocCategory,
    /// md5 of the content; absent above [`HASH_MAX_BYTES`].
    pub content_hash: Option<[u8; 16]>,
}

impl CacheEntry {
    fn new(
        key: String,
        content: Vec<u8>,
        last_modified: SystemTime,
        category: DocCategory,
    ) -> Self {
        let size = content.len() as u64;
        let content_hash = (size <= HASH_MAX_BYTES).then(|| md5::compute(&content).0);
        Self {
            key,
            content: Arc::new(content),
            size,
            last_modified,
            last_accessed: SystemTime::now(),
            access_count: 0,
            priority: 0,
            category,
            content_hash,
        }
    }

    /// Content as text, with invalid UTF-8 replaced.
    pub fn content_str(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.content)
    }
}

/// Serializable full projection of a cache entry, used by checkpoint backup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackupEntry {
    pub key: String,
    pub content: Vec<u8>,
    pub accessed_secs: i64,
    pub accessed_nanos: u32,
    pub modified_secs: i64,
    pub modified_nanos: u32,
    pub access_count: u64,
    pub size: u64,
    pub priority: i32,
    pub category: DocCategory,
}

impl BackupEntry {
    /// Project a cache entry into its serializable form.
    pub fn from_entry(entry: &CacheEntry) -> BackupEntry {
        let (accessed_secs, accessed_nanos) = time_parts(entry.last_accessed);
        let (modified_secs, modified_nanos) = time_parts(entry.last_modified);
        BackupEntry {
            key: entry.key.clone(),
            content: entry.content.as_ref().clone(),
            accessed_secs,
            accessed_nanos,
            modified_secs,
            modified_nanos,
            access_count: entry.access_count,
            size: entry.size,
            priority: entry.priority,
            category: entry.category,
        }
    }

    /// Rebuild the in-memory entry, recomputing the content hash.
    pub fn into_entry(self) -> CacheEntry {
        let size = self.content.len() as u64;
        let content_hash = (size <= HASH_MAX_BYTES).then(|| md5::compute(&self.content).0);
        CacheEntry {
            key: self.key,
            content: Arc::new(self.content),
            size,
            last_modified: time_from_parts(self.modified_secs, self.modified_nanos),
            last_accessed: time_from_parts(self.accessed_secs, self.accessed_nanos),
            access_count: self.access_count,
            priority: self.priority,
            category: self.category,
            content_hash,
        }
    }
}

/// Per-category aggregate.
#[derive(Debug, Clone, Copy, Default)]
pub struct CategoryStats {
    /// Cached documents in the category.
    pub count: usize,
    /// Total content bytes in the category.
    pub total_bytes: u64,
}

/// Cache statistics.
#[derive(Debug, Clone, Default)]
pub struct CacheStatistics {
    /// Total cached content bytes.
    pub cache_size: u64,
    /// Number of cached documents.
    pub document_count: usize,
    /// Configured document budget.
    pub max_cache_size: usize,
    /// Running quotient of hits over `get` calls.
    pub hit_rate: f64,
    /// Aggregates per category.
    pub by_category: BTreeMap<DocCategory, CategoryStats>,
}

/// Capability contract a document store exposes to collaborators.
pub trait DocumentStore: Send + Sync {
    /// Read an entry without faulting from disk.
    fn read(&self, key: &str) -> Option<CacheEntry>;
    /// Insert or replace an entry from raw bytes.
    fn write(&self, key: &str, content: Vec<u8>);
    /// Remove an entry; returns whether something was removed.
    fn invalidate(&self, key: &str) -> bool;
    /// Drain every entry into its serializable projection, sorted by key.
    fn snapshot(&self) -> Vec<BackupEntry>;
    /// Install entries, returning how many were accepted.
    fn restore(&self, entries: Vec<BackupEntry>) -> usize;
    /// Drop all entries and release resources.
    fn shutdown(&self);
}

/// Bounded in-memory document cache.
pub struct DocumentCache {
    entries: DashMap<String, CacheEntry>,
    locks: Arc<LockManager>,
    fileops: Arc<FileOps>,
    standards_dir: String,
    max_documents: usize,
    max_bytes: u64,
    total_bytes: AtomicU64,
    hits: AtomicU64,
    gets: AtomicU64,
}

impl DocumentCache {
    /// Create a cache with the given budgets.
    pub fn new(
        locks: Arc<LockManager>,
        fileops: Arc<FileOps>,
        standards_dir: String,
        max_documents: usize,
        max_bytes: u64,
    ) -> Self {
        Self {
            entries: DashMap::new(),
            locks,
            fileops,
            standards_dir,
            max_documents,
            max_bytes,
            total_bytes: AtomicU64::new(0),
            hits: AtomicU64::new(0),
            gets: AtomicU64::new(0),
        }
    }

    /// Configured document budget.
    pub fn max_documents(&self) -> usize {
        self.max_documents
    }

    /// Look up an entry. Hits update access bookkeeping; misses never fault
    /// from disk. Callers that want auto-load use [`DocumentCache::load`].
    pub fn get(&self, key: &str) -> Option<CacheEntry> {
        self.gets.fetch_add(1, Ordering::Relaxed);
        let mut entry = self.entries.get_mut(key)?;
        entry.last_accessed = SystemTime::now();
        entry.access_count += 1;
        self.hits.fetch_add(1, Ordering::Relaxed);
        Some(entry.clone())
    }

    /// Read a document from disk and insert or replace its entry.
    /// Propagates `NotFound` and I/O errors unchanged. Idempotent.
    pub fn load(&self, key: &str) -> Result<CacheEntry> {
        let content = self.fileops.read_file(key)?;
        let path = self.fileops.abs_path(key);
        let modified = fs::metadata(&path)
            .and_then(|m| m.modified())
            .unwrap_or(SystemTime::UNIX_EPOCH);

        let entry = CacheEntry::new(
            key.to_string(),
            content,
            modified,
            DocCategory::classify(key, &self.standards_dir),
        );

        let _guard = self.locks.cache_lock();
        self.insert_locked(entry.clone());
        Ok(entry)
    }

    /// Insert or replace an entry from raw bytes.
    pub fn put(&self, key: &str, content: Vec<u8>) {
        let entry = CacheEntry::new(
            key.to_string(),
            content,
            SystemTime::now(),
            DocCategory::classify(key, &self.standards_dir),
        );
        let _guard = self.locks.cache_lock();
        self.insert_locked(entry);
    }

    /// Adjust the eviction bias of a cached entry.
    pub fn set_priority(&self, key: &str, priority: i32) -> bool {
        let _guard = self.locks.cache_lock();
        match self.entries.get_mut(key) {
            Some(mut entry) => {
                entry.priority = priority;
                true
            }
            None => false,
        }
    }

    /// Remove an entry. Returns whether something was removed.
    pub fn invalidate(&self, key: &str) -> bool {
        let _guard = self.locks.cache_lock();
        match self.entries.remove(key) {
            Some((_, entry)) => {
                self.total_bytes.fetch_sub(entry.size, Ordering::Relaxed);
                true
            }
            None => false,
        }
    }

    /// Drop all entries; returns the count dropped.
    pub fn clear(&self) -> usize {
        let _guard = self.locks.cache_lock();
        let count = self.entries.len();
        self.entries.clear();
        self.total_bytes.store(0, Ordering::Relaxed);
        count
    }

    /// Discover documents under a directory and load each whose category is
    /// in the include list. Returns the count loaded.
    pub fn preload(&self, directory: &Path, recursive: bool, categories: &[DocCategory]) -> usize {
        let walker = DocWalker::new(WalkerConfig {
            recursive,
            ..WalkerConfig::default()
        });
        let (rx, handle) = walker.walk(directory);

        let mut loaded = 0;
        for doc in rx {
            let key = self.key_for_path(&doc.path);
            let category = DocCategory::classify(&key, &self.standards_dir);
            if !categories.contains(&category) {
                continue;
            }
            match self.load(&key) {
                Ok(_) => loaded += 1,
                Err(e) => tracing::warn!("preload failed for {key}: {e}"),
            }
        }

        handle.join();
        loaded
    }

    /// Rank cached documents by token overlap with the query over content
    /// and key. Ties break toward higher access count, then more recent
    /// access. Returns at most [`SEARCH_LIMIT`] results.
    pub fn search(&self, query: &str) -> Vec<(String, usize)> {
        let terms: HashSet<String> = tokenize(query).collect();
        if terms.is_empty() {
            return Vec::new();
        }

        let mut scored: Vec<(String, usize, u64, SystemTime)> = Vec::new();
        for entry in self.entries.iter() {
            let text = entry.content_str();
            let tokens: HashSet<String> =
                tokenize(&text).chain(tokenize(entry.key.as_str())).collect();
            let score = terms.iter().filter(|t| tokens.contains(*t)).count();
            if score > 0 {
                scored.push((
                    entry.key.clone(),
                    score,
                    entry.access_count,
                    entry.last_accessed,
                ));
            }
        }

        scored.sort_by(|a, b| b.1.cmp(&a.1).then(b.2.cmp(&a.2)).then(b.3.cmp(&a.3)));
        scored.truncate(SEARCH_LIMIT);
        scored.into_iter().map(|(key, score, ..)| (key, score)).collect()
    }

    /// Aggregate statistics.
    pub fn statistics(&self) -> CacheStatistics {
        let gets = self.gets.load(Ordering::Relaxed);
        let hits = self.hits.load(Ordering::Relaxed);

        let mut by_category: BTreeMap<DocCategory, CategoryStats> = BTreeMap::new();
        for entry in self.entries.iter() {
            let stats = by_category.entry(entry.category).or_default();
            stats.count += 1;
            stats.total_bytes += entry.size;
        }

        CacheStatistics {
            cache_size: self.total_bytes.load(Ordering::Relaxed),
            document_count: self.entries.len(),
            max_cache_size: self.max_documents,
            hit_rate: if gets == 0 {
                0.0
            } else {
                hits as f64 / gets as f64
            },
            by_category,
        }
    }

    /// Canonical key for an absolute path: project-relative when inside the
    /// root, the absolute form otherwise.
    fn key_for_path(&self, path: &Path) -> String {
        match path.strip_prefix(self.fileops.root()) {
            Ok(relative) => relative.to_string_lossy().replace('\\', "/"),
            Err(_) => path.to_string_lossy().replace('\\', "/"),
        }
    }

    /// Insert under the (held) cache lock, preserving a replaced entry's
    /// priority, then enforce both budgets.
    fn insert_locked(&self, mut entry: CacheEntry) {
        if let Some(prev_priority) = self.entries.get(&entry.key).map(|e| e.priority) {
            entry.priority = prev_priority;
        }

        let size = entry.size;
        if let Some(prev) = self.entries.insert(entry.key.clone(), entry) {
            self.total_bytes.fetch_sub(prev.size, Ordering::Relaxed);
        }
        self.total_bytes.fetch_add(size, Ordering::Relaxed);

        self.evict_over_budget();
    }

    /// Evict the entry minimizing `(priority, last_accessed)` until both the
    /// document count and byte budgets are respected.
    fn evict_over_budget(&self) {
        loop {
            let over_count = self.entries.len() > self.max_documents;
            let over_bytes = self.total_bytes.load(Ordering::Relaxed) > self.max_bytes;
            if !over_count && !over_bytes {
                break;
            }

            let victim = self
                .entries
                .iter()
                .min_by(|a, b| (a.priority, a.last_accessed).cmp(&(b.priority, b.last_accessed)))
                .map(|e| e.key.clone());

            match victim {
                Some(key) => {
                    if let Some((_, evicted)) = self.entries.remove(&key) {
                        self.total_bytes.fetch_sub(evicted.size, Ordering::Relaxed);
                        tracing::debug!("evicted {key} ({} bytes)", evicted.size);
                    } else {
                        break;
                    }
                }
                None => break,
            }
        }
    }
}

impl DocumentStore for DocumentCache {
    fn read(&self, key: &str) -> Option<CacheEntry> {
        self.get(key)
    }

    fn write(&self, key: &str, content: Vec<u8>) {
        self.put(key, content);
    }

    fn invalidate(&self, key: &str) -> bool {
        DocumentCache::invalidate(self, key)
    }

    fn snapshot(&self) -> Vec<BackupEntry> {
        let mut entries: Vec<BackupEntry> = self
            .entries
            .iter()
            .map(|e| BackupEntry::from_entry(&e))
            .collect();
        entries.sort_by(|a, b| a.key.cmp(&b.key));
        entries
    }

    fn restore(&self, entries: Vec<BackupEntry>) -> usize {
        let _guard = self.locks.cache_lock();
        let mut restored = 0;
        for backup in entries {
            self.insert_locked(backup.into_entry());
            restored += 1;
        }
        restored
    }

    fn shutdown(&self) {
        let dropped = self.clear();
        tracing::debug!("cache shut down, {dropped} entries dropped");
    }
}

fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
}

#[cfg(test)]
#[path = "cache_tests.rs"]
mod tests;
