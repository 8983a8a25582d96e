// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Config file and project root discovery.
//!
//! Walks from the current directory up to the git root looking for
//! docvault.toml, and upward for a directory containing the standards root.

use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Name of the configuration file.
pub const CONFIG_FILE_NAME: &str = "docvault.toml";

/// Find docvault.toml starting from `start_dir` and walking up to git root.
pub fn find_config(start_dir: &Path) -> Option<PathBuf> {
    let mut current = start_dir.to_path_buf();

    loop {
        let config_path = current.join(CONFIG_FILE_NAME);
        if config_path.exists() {
            return Some(config_path);
        }

        // Stop at git root
        if current.join(".git").exists() {
            return None;
        }

        match current.parent() {
            Some(parent) => current = parent.to_path_buf(),
            None => return None,
        }
    }
}

/// Resolve config path from CLI arg, env var, or discovery.
///
/// Priority:
/// 1. CLI flag `-C`/`--config` (handled by clap with env = "DOCVAULT_CONFIG")
/// 2. Discovery from current directory up to git root
/// 3. None (use defaults)
pub fn resolve_config(explicit: Option<&Path>, cwd: &Path) -> Result<Option<PathBuf>> {
    match explicit {
        Some(path) => {
            if path.exists() {
                Ok(Some(path.to_path_buf()))
            } else {
                Err(Error::Config {
                    message: format!("config file not found: {}", path.display()),
                    path: Some(path.to_path_buf()),
                })
            }
        }
        None => Ok(find_config(cwd)),
    }
}

/// Find the project root by walking upward until a directory containing the
/// standards root is found. Returns `None` when no ancestor qualifies; the
/// caller falls back to the current working directory.
pub fn find_project_root(start_dir: &Path, standards_dir: &str) -> Option<PathBuf> {
    let mut current = start_dir.to_path_buf();

    loop {
        if current.join(standards_dir).is_dir() {
            return Some(current);
        }

        match current.parent() {
            Some(parent) => current = parent.to_path_buf(),
            None => return None,
        }
    }
}

#[cfg(test)]
#[path = "discovery_tests.rs"]
mod tests;
