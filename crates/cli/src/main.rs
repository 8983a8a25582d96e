// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Docvault CLI entry point.

use clap::{CommandFactory, Parser};
use tracing_subscriber::{EnvFilter, fmt};

use docvault::cli::{CacheAction, CheckpointAction, Cli, Command};
use docvault::context::AppContext;
use docvault::error::ExitCode;
use docvault::{cmd_cache, cmd_checkpoint};

fn init_logging() {
    let filter = EnvFilter::try_from_env("DOCVAULT_LOG").unwrap_or_else(|_| EnvFilter::new("off"));

    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    init_logging();

    let exit_code = match run() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("docvault: {e}");
            ExitCode::Failure
        }
    };

    std::process::exit(exit_code as i32);
}

fn run() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    let Some(command) = &cli.command else {
        // Show help for bare invocation
        Cli::command().print_help()?;
        println!();
        return Ok(ExitCode::Success);
    };

    let ctx = AppContext::from_cli(cli.config.as_deref())?;

    let code = match command {
        Command::Checkpoint { action } => match action {
            CheckpointAction::Prepare => cmd_checkpoint::run_prepare(&ctx)?,
            CheckpointAction::Restore => cmd_checkpoint::run_restore(&ctx)?,
            CheckpointAction::Backup => cmd_checkpoint::run_backup(&ctx)?,
            CheckpointAction::Cleanup => cmd_checkpoint::run_cleanup(&ctx)?,
        },
        Command::Cache { action } => match action {
            CacheAction::Check { fix } => cmd_cache::run_check(&ctx, *fix)?,
            CacheAction::Stats => cmd_cache::run_stats(&ctx)?,
        },
    };

    Ok(code)
}
