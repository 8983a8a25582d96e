// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! CLI argument parsing with clap derive.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Document cache and synchronization tools
#[derive(Parser)]
#[command(name = "docvault")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Use specific config file
    #[arg(short = 'C', long = "config", global = true, env = "DOCVAULT_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Checkpoint-safe shutdown, backup and restore
    Checkpoint {
        #[command(subcommand)]
        action: CheckpointAction,
    },
    /// Inspect and repair the document cache
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
}

#[derive(Subcommand)]
pub enum CheckpointAction {
    /// Run the full quiescence protocol
    Prepare,
    /// Restore cache state after a checkpoint
    Restore,
    /// Snapshot the cache without shutting down
    Backup,
    /// Run registered cleanup handlers only
    Cleanup,
}

#[derive(Subcommand)]
pub enum CacheAction {
    /// Verify cache state against the filesystem
    Check {
        /// Repair any divergences found
        #[arg(long)]
        fix: bool,
    },
    /// Print cache statistics
    Stats,
}

#[cfg(test)]
#[path = "cli_tests.rs"]
mod tests;
