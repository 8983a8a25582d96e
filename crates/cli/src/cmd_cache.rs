// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! `cache` subcommands: verify/repair and statistics.

use crate::context::AppContext;
use crate::error::{ExitCode, Result};

/// Run `cache check [--fix]`. Exits nonzero while divergences remain.
pub fn run_check(ctx: &AppContext, fix: bool) -> Result<ExitCode> {
    let verifier = ctx.verifier()?;

    if fix {
        let summary = verifier.fix_sync_issues()?;
        println!(
            "cache check: {} added, {} removed, {} updated",
            summary.added, summary.removed, summary.updated
        );
        if summary.clean {
            println!("cache state is in sync");
            Ok(ExitCode::Success)
        } else {
            println!("cache state still diverges after repair");
            Ok(ExitCode::Failure)
        }
    } else {
        let report = verifier.verify()?;
        if report.is_clean() {
            println!("cache state is in sync");
            return Ok(ExitCode::Success);
        }

        println!(
            "cache check: {} missing in cache, {} missing on disk, {} metadata mismatches",
            report.missing_in_cache.len(),
            report.missing_in_filesystem.len(),
            report.metadata_mismatch.len()
        );
        for key in &report.missing_in_cache {
            println!("  + {key}");
        }
        for key in &report.missing_in_filesystem {
            println!("  - {key}");
        }
        for key in report.metadata_mismatch.keys() {
            println!("  ~ {key}");
        }
        println!("run `docvault cache check --fix` to repair");
        Ok(ExitCode::Failure)
    }
}

/// Run `cache stats`.
pub fn run_stats(ctx: &AppContext) -> Result<ExitCode> {
    let stats = ctx.cache.statistics();
    let state = ctx.state.load()?;

    println!(
        "documents: {} in memory ({} bytes), {} tracked on disk",
        stats.document_count,
        stats.cache_size,
        state.files.len()
    );
    println!("max cache size: {}", stats.max_cache_size);
    println!("hit rate: {:.1}%", stats.hit_rate * 100.0);
    for (category, aggregate) in &stats.by_category {
        println!(
            "  {category}: {} documents, {} bytes",
            aggregate.count, aggregate.total_bytes
        );
    }

    Ok(ExitCode::Success)
}

#[cfg(test)]
#[path = "cmd_cache_tests.rs"]
mod tests;
