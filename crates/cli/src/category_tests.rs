#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use super::*;

#[test]
fn standards_prefix_wins() {
    assert_eq!(
        DocCategory::classify("standards/0. core/registry standard.md", "standards"),
        DocCategory::Standard
    );
    // Custom standards directory name
    assert_eq!(
        DocCategory::classify("[standards .md]/registry standard.md", "[standards .md]"),
        DocCategory::Standard
    );
}

#[test]
fn todo_files_are_task_lists() {
    assert_eq!(
        DocCategory::classify("work-items/todo.md", "standards"),
        DocCategory::TaskList
    );
    assert_eq!(
        DocCategory::classify("todo_2026.md", "standards"),
        DocCategory::TaskList
    );
}

#[test]
fn incident_files_are_incident_lists() {
    assert_eq!(
        DocCategory::classify("work-items/open incidents.md", "standards"),
        DocCategory::IncidentList
    );
}

#[test]
fn project_context_requires_exact_shape() {
    assert_eq!(
        DocCategory::classify("projects/alpha/context.md", "standards"),
        DocCategory::ProjectContext
    );
    // Too deep: not a project context
    assert_eq!(
        DocCategory::classify("projects/alpha/sub/context.md", "standards"),
        DocCategory::Unknown
    );
}

#[test]
fn next_actions_matches_root_and_nested() {
    assert_eq!(
        DocCategory::classify("next_actions.md", "standards"),
        DocCategory::NextActions
    );
    assert_eq!(
        DocCategory::classify("projects/alpha/next_actions.md", "standards"),
        DocCategory::NextActions
    );
}

#[test]
fn project_metadata_entries() {
    assert_eq!(
        DocCategory::classify("projects/alpha/metadata.json", "standards"),
        DocCategory::ProjectMetadata
    );
}

#[test]
fn everything_else_is_unknown() {
    assert_eq!(
        DocCategory::classify("notes/a.md", "standards"),
        DocCategory::Unknown
    );
    assert_eq!(
        DocCategory::classify("README.md", "standards"),
        DocCategory::Unknown
    );
}

#[test]
fn display_matches_serialized_form() {
    assert_eq!(DocCategory::TaskList.to_string(), "task_list");
    let json = serde_json::to_string(&DocCategory::IncidentList).unwrap();
    assert_eq!(json, "\"incident_list\"");
}
