// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Configuration parsing and validation.
//!
//! Handles docvault.toml parsing with version validation. All sections are
//! optional; defaults describe a standalone project rooted at the discovered
//! project root.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::category::DocCategory;
use crate::error::{Error, Result};

/// Supported config file version.
pub const CONFIG_VERSION: i64 = 1;

/// Full configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Config file version (must be 1).
    #[serde(default)]
    pub version: i64,

    /// Project layout.
    #[serde(default)]
    pub project: ProjectConfig,

    /// Document cache budgets.
    #[serde(default)]
    pub cache: CacheConfig,

    /// Lock acquisition deadlines.
    #[serde(default)]
    pub locks: LockConfig,

    /// Sync verifier patterns.
    #[serde(default)]
    pub sync: SyncConfig,

    /// Checkpoint protocol settings.
    #[serde(default)]
    pub checkpoint: CheckpointConfig,
}

impl Config {
    /// Load configuration from a file, validating the version field.
    pub fn load(path: &Path) -> Result<Config> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::Config {
            message: format!("cannot read config: {e}"),
            path: Some(path.to_path_buf()),
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| Error::Config {
            message: e.to_string(),
            path: Some(path.to_path_buf()),
        })?;

        if config.version != CONFIG_VERSION {
            return Err(Error::Config {
                message: format!(
                    "unsupported config version {} (expected {CONFIG_VERSION})",
                    config.version
                ),
                path: Some(path.to_path_buf()),
            });
        }

        Ok(config)
    }
}

/// Project layout configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProjectConfig {
    /// Explicit project root (overrides discovery).
    pub root: Option<PathBuf>,

    /// Directory holding standards documents, relative to the root.
    pub standards_dir: String,

    /// Directory `../`-relative keys are joined against.
    pub collaborator_dir: String,

    /// Directories recorded in the persisted state snapshot.
    pub watched_directories: Vec<String>,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            root: None,
            standards_dir: "standards".to_string(),
            collaborator_dir: "platform".to_string(),
            watched_directories: vec!["standards".to_string(), "work-items".to_string()],
        }
    }
}

/// Document cache budgets.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CacheConfig {
    /// Maximum number of cached documents.
    pub max_documents: usize,

    /// Maximum total content bytes held in memory.
    pub max_bytes: u64,

    /// Categories eligible for directory preloading.
    pub preload_categories: Vec<DocCategory>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_documents: 500,
            max_bytes: 64 * 1024 * 1024,
            preload_categories: vec![
                DocCategory::Standard,
                DocCategory::TaskList,
                DocCategory::IncidentList,
                DocCategory::ProjectContext,
                DocCategory::NextActions,
            ],
        }
    }
}

/// Lock acquisition deadlines.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LockConfig {
    /// Seconds to wait for a file lock; negative means wait forever.
    pub timeout_secs: f64,
}

impl Default for LockConfig {
    fn default() -> Self {
        Self { timeout_secs: 5.0 }
    }
}

impl LockConfig {
    /// Deadline as a duration; `None` when unbounded.
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_secs >= 0.0).then(|| Duration::from_secs_f64(self.timeout_secs))
    }
}

/// Sync verifier patterns.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SyncConfig {
    /// Glob patterns a file must match to be tracked.
    pub include: Vec<String>,

    /// Glob patterns excluding files from tracking.
    pub exclude: Vec<String>,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            include: vec!["**/*".to_string()],
            exclude: Vec::new(),
        }
    }
}

/// Checkpoint protocol settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CheckpointConfig {
    /// Backup directory, relative to the project root.
    pub backup_dir: String,

    /// Settle interval after resource teardown, capped at 3 seconds.
    pub settle_secs: f64,
}

impl Default for CheckpointConfig {
    fn default() -> Self {
        Self {
            backup_dir: "checkpoint_backup".to_string(),
            settle_secs: 3.0,
        }
    }
}

impl CheckpointConfig {
    /// Settle interval as a duration, clamped to the 3 second ceiling.
    pub fn settle(&self) -> Duration {
        Duration::from_secs_f64(self.settle_secs.clamp(0.0, 3.0))
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
