// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! `checkpoint` subcommands: prepare, restore, backup, cleanup.

use crate::context::AppContext;
use crate::error::{ExitCode, Result};

/// Run the full quiescence protocol.
pub fn run_prepare(ctx: &AppContext) -> Result<ExitCode> {
    let summary = ctx.checkpoint().prepare()?;
    println!(
        "checkpoint ready: {} documents backed up, {} cleanup handlers run ({} failed)",
        summary.documents, summary.handlers_run, summary.handlers_failed
    );
    Ok(ExitCode::Success)
}

/// Restore cache state after a checkpoint.
pub fn run_restore(ctx: &AppContext) -> Result<ExitCode> {
    let summary = ctx.checkpoint().restore()?;
    println!(
        "restored {} documents from {}",
        summary.restored,
        summary.source.as_str()
    );
    Ok(ExitCode::Success)
}

/// Snapshot the cache without shutting down.
pub fn run_backup(ctx: &AppContext) -> Result<ExitCode> {
    let documents = ctx.checkpoint().backup()?;
    println!("backed up {documents} documents");
    Ok(ExitCode::Success)
}

/// Run registered cleanup handlers only.
pub fn run_cleanup(ctx: &AppContext) -> Result<ExitCode> {
    let outcome = ctx.checkpoint().run_cleanup()?;
    println!(
        "ran {} cleanup handlers ({} failed)",
        outcome.total(),
        outcome.failed
    );
    Ok(ExitCode::Success)
}
