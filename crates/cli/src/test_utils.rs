// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Shared helpers for unit tests.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use std::path::Path;

use crate::config::Config;
use crate::context::AppContext;

/// Default config with the checkpoint settle interval disabled.
pub fn test_config() -> Config {
    let mut config = Config::default();
    config.checkpoint.settle_secs = 0.0;
    config
}

/// Context rooted at a test directory.
pub fn test_context(root: &Path) -> AppContext {
    AppContext::new(test_config(), root.to_path_buf())
}
