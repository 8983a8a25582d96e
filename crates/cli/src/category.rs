// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Document categorization.
//!
//! Categories are derived once from the canonical key using a fixed table of
//! prefix/suffix matchers and drive preload filtering and cache statistics.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Document category derived from the canonical key.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum DocCategory {
    /// Standards documents under the standards directory.
    Standard,
    /// Task list documents (`todo*.md`).
    TaskList,
    /// Incident list documents (`*incidents*.md`).
    IncidentList,
    /// Per-project context documents (`projects/*/context.md`).
    ProjectContext,
    /// Next-action documents (`*/next_actions.md`).
    NextActions,
    /// Virtual project metadata entries (`projects/*/metadata.json`).
    ProjectMetadata,
    /// Everything else.
    #[default]
    Unknown,
}

impl DocCategory {
    /// Classify a canonical key against the fixed matcher table.
    pub fn classify(key: &str, standards_dir: &str) -> DocCategory {
        if key.starts_with(&format!("{standards_dir}/")) {
            return DocCategory::Standard;
        }

        let file_name = key.rsplit('/').next().unwrap_or(key).to_ascii_lowercase();

        if file_name.starts_with("todo") && file_name.ends_with(".md") {
            return DocCategory::TaskList;
        }
        if file_name.contains("incidents") && file_name.ends_with(".md") {
            return DocCategory::IncidentList;
        }
        if project_entry(key, "context.md") {
            return DocCategory::ProjectContext;
        }
        if key == "next_actions.md" || key.ends_with("/next_actions.md") {
            return DocCategory::NextActions;
        }
        if project_entry(key, "metadata.json") {
            return DocCategory::ProjectMetadata;
        }

        DocCategory::Unknown
    }

    /// Stable lowercase name, matching the serialized form.
    pub fn as_str(&self) -> &'static str {
        match self {
            DocCategory::Standard => "standard",
            DocCategory::TaskList => "task_list",
            DocCategory::IncidentList => "incident_list",
            DocCategory::ProjectContext => "project_context",
            DocCategory::NextActions => "next_actions",
            DocCategory::ProjectMetadata => "project_metadata",
            DocCategory::Unknown => "unknown",
        }
    }
}

impl fmt::Display for DocCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Match `projects/<name>/<file>` keys with exactly one project segment.
fn project_entry(key: &str, file: &str) -> bool {
    let mut parts = key.split('/');
    parts.next() == Some("projects")
        && parts.next().is_some_and(|p| !p.is_empty())
        && parts.next() == Some(file)
        && parts.next().is_none()
}

#[cfg(test)]
#[path = "category_tests.rs"]
mod tests;
