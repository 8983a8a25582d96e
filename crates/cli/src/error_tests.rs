#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use std::time::Duration;

use super::*;

#[test]
fn every_error_maps_to_failure_exit_code() {
    let errors = [
        Error::NotFound {
            key: "a.md".to_string(),
        },
        Error::Corrupted {
            key: "a.json".to_string(),
            message: "bad".to_string(),
        },
        Error::io("/tmp/x", std::io::Error::other("boom")),
        Error::LockTimeout {
            key: "a.md".to_string(),
            waited: Duration::from_secs(5),
        },
        Error::CheckpointAborted {
            stage: "backup",
            message: "no space".to_string(),
        },
        Error::Config {
            message: "bad version".to_string(),
            path: None,
        },
        Error::Internal("bug".to_string()),
    ];

    for error in &errors {
        assert_eq!(ExitCode::from(error), ExitCode::Failure);
    }
}

#[test]
fn exit_codes_match_cli_contract() {
    assert_eq!(ExitCode::Success as i32, 0);
    assert_eq!(ExitCode::Failure as i32, 1);
}

#[test]
fn display_includes_key() {
    let err = Error::NotFound {
        key: "notes/a.md".to_string(),
    };
    assert_eq!(err.to_string(), "not found: notes/a.md");

    let err = Error::LockTimeout {
        key: "b.md".to_string(),
        waited: Duration::from_millis(250),
    };
    assert!(err.to_string().contains("b.md"));
    assert!(err.to_string().contains("250"));
}
