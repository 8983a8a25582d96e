// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Atomic, lock-scoped file operations.
//!
//! Every mutation writes a temp file beside the target, flushes it, and
//! renames it into place, so readers never observe a half-written file. A
//! rename failure (e.g. across volumes) surfaces as an I/O error rather than
//! degrading to a non-atomic copy.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::{Map, Value};

use crate::error::{Error, Result};
use crate::locks::LockManager;

/// Atomic file operations rooted at the project directory.
pub struct FileOps {
    root: PathBuf,
    locks: Arc<LockManager>,
}

impl FileOps {
    /// Create file operations for the given project root.
    pub fn new(root: PathBuf, locks: Arc<LockManager>) -> Self {
        Self { root, locks }
    }

    /// Project root these operations resolve keys against.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Absolute on-disk path for a canonical key. Escape-hatch keys outside
    /// the project root are already absolute and pass through unchanged.
    pub fn abs_path(&self, key: &str) -> PathBuf {
        let path = Path::new(key);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(key)
        }
    }

    /// Whether the key currently exists on disk.
    pub fn exists(&self, key: &str) -> bool {
        self.abs_path(key).exists()
    }

    /// Read the full contents of a key under its file lock.
    pub fn read_file(&self, key: &str) -> Result<Vec<u8>> {
        let _guard = self.locks.file_lock_default(key)?;
        let path = self.abs_path(key);
        if !path.exists() {
            return Err(Error::NotFound {
                key: key.to_string(),
            });
        }
        fs::read(&path).map_err(|e| Error::io(path, e))
    }

    /// Read a key as UTF-8 text.
    pub fn read_to_string(&self, key: &str) -> Result<String> {
        let bytes = self.read_file(key)?;
        String::from_utf8(bytes).map_err(|e| Error::Corrupted {
            key: key.to_string(),
            message: e.to_string(),
        })
    }

    /// Atomically replace the contents of a key.
    pub fn write_file(&self, key: &str, content: &[u8]) -> Result<()> {
        let _guard = self.locks.file_lock_default(key)?;
        self.atomic_write(&self.abs_path(key), content)
    }

    /// Atomically append to a key, creating it when missing.
    pub fn append_file(&self, key: &str, content: &[u8]) -> Result<()> {
        let _guard = self.locks.file_lock_default(key)?;
        let path = self.abs_path(key);
        let mut combined = if path.exists() {
            fs::read(&path).map_err(|e| Error::io(&path, e))?
        } else {
            Vec::new()
        };
        combined.extend_from_slice(content);
        self.atomic_write(&path, &combined)
    }

    /// Delete a key. Returns whether a file was removed.
    pub fn delete_file(&self, key: &str) -> Result<bool> {
        let _guard = self.locks.file_lock_default(key)?;
        let path = self.abs_path(key);
        if !path.exists() {
            return Ok(false);
        }
        fs::remove_file(&path).map_err(|e| Error::io(path, e))?;
        Ok(true)
    }

    /// Read and parse a JSON document.
    pub fn read_json(&self, key: &str) -> Result<Value> {
        let bytes = self.read_file(key)?;
        serde_json::from_slice(&bytes).map_err(|e| Error::Corrupted {
            key: key.to_string(),
            message: e.to_string(),
        })
    }

    /// Atomically write a JSON document, pretty-printed with 2-space indent
    /// and non-ASCII preserved.
    pub fn write_json(&self, key: &str, value: &Value) -> Result<()> {
        let text =
            serde_json::to_string_pretty(value).map_err(|e| Error::Internal(e.to_string()))?;
        self.write_file(key, text.as_bytes())
    }

    /// Shallow-merge `patch` into the JSON object at `key` and rewrite it
    /// atomically. A missing file becomes an empty object when
    /// `create_if_missing`; an unparseable or non-object file is treated as
    /// empty and rewritten. Returns the merged document.
    pub fn update_json(
        &self,
        key: &str,
        patch: &Map<String, Value>,
        create_if_missing: bool,
    ) -> Result<Value> {
        let _guard = self.locks.file_lock_default(key)?;

        let mut data = if self.exists(key) {
            match self.read_json(key) {
                Ok(Value::Object(map)) => map,
                Ok(_) => Map::new(),
                Err(Error::Corrupted { .. }) => Map::new(),
                Err(e) => return Err(e),
            }
        } else if create_if_missing {
            Map::new()
        } else {
            return Err(Error::NotFound {
                key: key.to_string(),
            });
        };

        for (k, v) in patch {
            data.insert(k.clone(), v.clone());
        }

        let merged = Value::Object(data);
        self.write_json(key, &merged)?;
        Ok(merged)
    }

    /// Temp file in the target directory, flushed, renamed onto the target.
    /// The temp file is unlinked before any error is surfaced.
    fn atomic_write(&self, path: &Path, content: &[u8]) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
        }

        let tmp = temp_sibling(path);
        let result = (|| -> std::io::Result<()> {
            let mut file = fs::File::create(&tmp)?;
            file.write_all(content)?;
            file.sync_all()?;
            fs::rename(&tmp, path)
        })();

        if let Err(e) = result {
            let _ = fs::remove_file(&tmp);
            return Err(Error::io(path, e));
        }
        Ok(())
    }
}

/// Temp-file name beside the target, so the rename stays on one volume.
fn temp_sibling(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "file".into());
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(test)]
#[path = "fileops_tests.rs"]
mod tests;
