#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use std::time::Duration;

use tempfile::tempdir;

use super::*;

#[test]
fn defaults_describe_standalone_project() {
    let config = Config::default();
    assert_eq!(config.project.standards_dir, "standards");
    assert_eq!(config.cache.max_documents, 500);
    assert_eq!(config.locks.timeout(), Some(Duration::from_secs(5)));
    assert_eq!(config.sync.include, vec!["**/*".to_string()]);
    assert!(config.sync.exclude.is_empty());
    assert_eq!(config.checkpoint.backup_dir, "checkpoint_backup");
}

#[test]
fn negative_lock_timeout_means_unbounded() {
    let config = LockConfig { timeout_secs: -1.0 };
    assert_eq!(config.timeout(), None);
}

#[test]
fn settle_is_capped_at_three_seconds() {
    let config = CheckpointConfig {
        settle_secs: 30.0,
        ..CheckpointConfig::default()
    };
    assert_eq!(config.settle(), Duration::from_secs(3));
}

#[test]
fn load_parses_partial_config() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("docvault.toml");
    std::fs::write(
        &path,
        r#"
version = 1

[cache]
max_documents = 10

[sync]
include = ["**/*.md"]
"#,
    )
    .unwrap();

    let config = Config::load(&path).unwrap();
    assert_eq!(config.cache.max_documents, 10);
    assert_eq!(config.sync.include, vec!["**/*.md".to_string()]);
    // Untouched sections keep defaults
    assert_eq!(config.project.standards_dir, "standards");
}

#[test]
fn load_rejects_unknown_fields() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("docvault.toml");
    std::fs::write(&path, "version = 1\nbogus = true\n").unwrap();

    assert!(matches!(
        Config::load(&path),
        Err(crate::error::Error::Config { .. })
    ));
}

#[test]
fn load_rejects_wrong_version() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("docvault.toml");
    std::fs::write(&path, "version = 2\n").unwrap();

    assert!(matches!(
        Config::load(&path),
        Err(crate::error::Error::Config { .. })
    ));
}

#[test]
fn load_rejects_missing_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("absent.toml");

    assert!(matches!(
        Config::load(&path),
        Err(crate::error::Error::Config { .. })
    ));
}
