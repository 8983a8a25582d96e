#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use clap::Parser;

use super::*;

#[test]
fn parses_checkpoint_subcommands() {
    for (args, expected) in [
        (
            vec!["docvault", "checkpoint", "prepare"],
            CheckpointAction::Prepare,
        ),
        (
            vec!["docvault", "checkpoint", "restore"],
            CheckpointAction::Restore,
        ),
        (
            vec!["docvault", "checkpoint", "backup"],
            CheckpointAction::Backup,
        ),
        (
            vec!["docvault", "checkpoint", "cleanup"],
            CheckpointAction::Cleanup,
        ),
    ] {
        let cli = Cli::try_parse_from(args).unwrap();
        match cli.command {
            Some(Command::Checkpoint { action }) => {
                assert!(std::mem::discriminant(&action) == std::mem::discriminant(&expected));
            }
            _ => panic!("expected checkpoint command"),
        }
    }
}

#[test]
fn parses_cache_check_with_fix_flag() {
    let cli = Cli::try_parse_from(["docvault", "cache", "check", "--fix"]).unwrap();
    match cli.command {
        Some(Command::Cache {
            action: CacheAction::Check { fix },
        }) => assert!(fix),
        _ => panic!("expected cache check"),
    }

    let cli = Cli::try_parse_from(["docvault", "cache", "check"]).unwrap();
    match cli.command {
        Some(Command::Cache {
            action: CacheAction::Check { fix },
        }) => assert!(!fix),
        _ => panic!("expected cache check"),
    }
}

#[test]
fn parses_cache_stats() {
    let cli = Cli::try_parse_from(["docvault", "cache", "stats"]).unwrap();
    assert!(matches!(
        cli.command,
        Some(Command::Cache {
            action: CacheAction::Stats
        })
    ));
}

#[test]
fn global_config_flag_is_accepted_anywhere() {
    let cli =
        Cli::try_parse_from(["docvault", "cache", "stats", "-C", "custom.toml"]).unwrap();
    assert_eq!(
        cli.config.as_deref(),
        Some(std::path::Path::new("custom.toml"))
    );
}

#[test]
fn bare_invocation_parses_with_no_command() {
    let cli = Cli::try_parse_from(["docvault"]).unwrap();
    assert!(cli.command.is_none());
}

#[test]
fn unknown_subcommand_is_rejected() {
    assert!(Cli::try_parse_from(["docvault", "frobnicate"]).is_err());
}
