// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Error types shared across the cache core.

use std::path::PathBuf;
use std::time::Duration;

/// Docvault error types
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Target key absent on disk.
    #[error("not found: {key}")]
    NotFound { key: String },

    /// File exists but cannot be parsed.
    #[error("corrupted: {key}: {message}")]
    Corrupted { key: String, message: String },

    /// Underlying filesystem failure.
    #[error("io error: {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Could not acquire a file lock within the deadline.
    #[error("lock timeout: {key} (waited {}ms)", .waited.as_millis())]
    LockTimeout { key: String, waited: Duration },

    /// Quiescence or restore prerequisites failed.
    #[error("checkpoint aborted during {stage}: {message}")]
    CheckpointAborted {
        stage: &'static str,
        message: String,
    },

    /// Configuration file not found or invalid
    #[error("config error: {message}")]
    Config {
        message: String,
        path: Option<PathBuf>,
    },

    /// Internal error (bug)
    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Wrap an I/O error with the path it occurred on.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result type using docvault Error
pub type Result<T> = std::result::Result<T, Error>;

/// Exit codes for the command-line tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ExitCode {
    /// Operation completed
    Success = 0,
    /// Operation failed or found divergences
    Failure = 1,
}

impl From<&Error> for ExitCode {
    fn from(_: &Error) -> Self {
        ExitCode::Failure
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
