// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Streaming document discovery.
//!
//! Walks a base directory, skipping hidden entries and a fixed set of
//! binary/archive extensions, and streams surviving files through a channel
//! with their base-relative key, size, and modification time.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use crossbeam_channel::{Receiver, bounded};
use ignore::WalkBuilder;

/// Extensions never treated as documents (binary, archive, scratch files).
pub(crate) const SKIP_EXTENSIONS: &[&str] = &[
    "pyc", "so", "dll", "exe", "zip", "tar", "gz", "bz2", "rar", "jpg", "jpeg", "png", "gif",
    "ico", "mp3", "mp4", "avi", "mkv", "mov", "db", "sqlite", "sqlite3", "tmp", "temp", "bak",
    "swp",
];

/// Default maximum directory depth.
pub const DEFAULT_MAX_DEPTH: usize = 100;

/// Walker configuration.
#[derive(Debug, Clone)]
pub struct WalkerConfig {
    /// Maximum directory depth (default: 100).
    pub max_depth: Option<usize>,

    /// Descend into subdirectories; false limits the walk to the base.
    pub recursive: bool,
}

impl Default for WalkerConfig {
    fn default() -> Self {
        Self {
            max_depth: Some(DEFAULT_MAX_DEPTH),
            recursive: true,
        }
    }
}

/// File discovered by the walker.
#[derive(Debug)]
pub struct WalkedDoc {
    /// Absolute path on disk.
    pub path: PathBuf,

    /// Base-relative forward-slash key.
    pub key: String,

    /// File size in bytes.
    pub size: u64,

    /// Modification time.
    pub modified: SystemTime,
}

/// Statistics from a walk operation.
#[derive(Debug, Default)]
pub struct WalkStats {
    /// Files streamed to the receiver.
    pub files_found: usize,

    /// Files skipped by the extension list.
    pub files_skipped: usize,

    /// Errors encountered.
    pub errors: usize,
}

/// Sequential streaming walker for document trees.
pub struct DocWalker {
    config: WalkerConfig,
}

impl DocWalker {
    /// Create a walker with the given configuration.
    pub fn new(config: WalkerConfig) -> Self {
        Self { config }
    }

    /// Walk the base directory, returning a receiver of discovered files.
    ///
    /// Files are streamed through the channel as they're discovered.
    /// Returns (receiver, handle) where the handle can be joined for stats.
    pub fn walk(&self, base: &Path) -> (Receiver<WalkedDoc>, WalkHandle) {
        let (tx, rx) = bounded(256);

        let mut builder = WalkBuilder::new(base);
        builder
            .hidden(true)
            .git_ignore(false)
            .git_global(false)
            .git_exclude(false)
            .follow_links(false);

        let depth = if self.config.recursive {
            self.config.max_depth
        } else {
            Some(1)
        };
        builder.max_depth(depth);

        let walker = builder.build();
        let base = base.to_path_buf();

        let handle = std::thread::spawn(move || {
            let mut stats = WalkStats::default();

            for entry in walker {
                match entry {
                    Ok(entry) => {
                        if !entry.file_type().map(|t| t.is_file()).unwrap_or(false) {
                            continue;
                        }
                        let path = entry.into_path();
                        if has_skipped_extension(&path) {
                            stats.files_skipped += 1;
                            continue;
                        }
                        let meta = match std::fs::metadata(&path) {
                            Ok(meta) => meta,
                            Err(e) => {
                                tracing::warn!("cannot stat {}: {e}", path.display());
                                stats.errors += 1;
                                continue;
                            }
                        };
                        let key = match path.strip_prefix(&base) {
                            Ok(relative) => relative.to_string_lossy().replace('\\', "/"),
                            Err(_) => continue,
                        };

                        let doc = WalkedDoc {
                            key,
                            size: meta.len(),
                            modified: meta.modified().unwrap_or(SystemTime::UNIX_EPOCH),
                            path,
                        };

                        stats.files_found += 1;
                        if tx.send(doc).is_err() {
                            break;
                        }
                    }
                    Err(err) => {
                        tracing::warn!("walk error: {err}");
                        stats.errors += 1;
                    }
                }
            }

            stats
        });

        (rx, WalkHandle { handle })
    }

    /// Walk and collect all files (convenience method for small trees).
    pub fn walk_collect(&self, base: &Path) -> (Vec<WalkedDoc>, WalkStats) {
        let (rx, handle) = self.walk(base);
        let docs: Vec<_> = rx.iter().collect();
        let stats = handle.join();
        (docs, stats)
    }
}

/// Handle to a running walk operation.
pub struct WalkHandle {
    handle: std::thread::JoinHandle<WalkStats>,
}

impl WalkHandle {
    /// Wait for the walk to complete and return stats.
    pub fn join(self) -> WalkStats {
        self.handle.join().unwrap_or_default()
    }
}

fn has_skipped_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| SKIP_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

#[cfg(test)]
#[path = "walker_tests.rs"]
mod tests;
