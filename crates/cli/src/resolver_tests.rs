#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use tempfile::{TempDir, tempdir};

use super::*;

/// Project tree with a standards directory holding a few documents.
fn standards_fixture() -> (TempDir, KeyResolver) {
    let dir = tempdir().unwrap();
    let standards = dir.path().join("standards");
    std::fs::create_dir_all(standards.join("0. core")).unwrap();
    std::fs::create_dir_all(standards.join("archive 2024")).unwrap();

    std::fs::write(
        standards.join("0. core/registry standard.md"),
        "# Registry\n",
    )
    .unwrap();
    std::fs::write(standards.join("task-standard.md"), "# Task\n").unwrap();
    std::fs::write(standards.join("archive 2024/stale standard.md"), "old").unwrap();

    let resolver = KeyResolver::new(dir.path(), "standards", "platform");
    (dir, resolver)
}

#[test]
fn logical_map_built_from_standards_scan() {
    let (_dir, resolver) = standards_fixture();

    assert_eq!(
        resolver.resolve_logical("abstract://standard:registry"),
        Some("standards/0. core/registry standard.md")
    );
    assert_eq!(
        resolver.resolve_logical("abstract://standard:task"),
        Some("standards/task-standard.md")
    );
}

#[test]
fn archive_folders_are_skipped() {
    let (_dir, resolver) = standards_fixture();

    assert_eq!(resolver.resolve_logical("abstract://standard:stale"), None);
    assert_eq!(resolver.statistics().logical_mappings, 2);
}

#[test]
fn unknown_logical_address_resolves_to_none() {
    let (_dir, resolver) = standards_fixture();

    assert_eq!(resolver.resolve_logical("abstract://standard:absent"), None);
}

#[test]
fn normalize_resolves_known_logical_addresses() {
    let (_dir, resolver) = standards_fixture();

    assert_eq!(
        resolver.normalize("abstract://standard:registry"),
        "standards/0. core/registry standard.md"
    );
    // Unknown addresses pass through unchanged.
    assert_eq!(
        resolver.normalize("abstract://standard:absent"),
        "abstract://standard:absent"
    );
}

#[test]
fn normalize_makes_absolute_paths_project_relative() {
    let (dir, resolver) = standards_fixture();

    let absolute = dir.path().join("notes/a.md");
    assert_eq!(
        resolver.normalize(&absolute.to_string_lossy()),
        "notes/a.md"
    );
}

#[test]
fn normalize_keeps_paths_outside_the_root_absolute() {
    let (_dir, resolver) = standards_fixture();

    let outside = "/var/other/project/file.md";
    assert_eq!(resolver.normalize(outside), outside);
}

#[test]
fn normalize_joins_parent_relative_against_collaborator_dir() {
    let (_dir, resolver) = standards_fixture();

    // "../standards/x.md" relative to "<root>/platform" lands in the root.
    assert_eq!(
        resolver.normalize("../standards/x.md"),
        "standards/x.md"
    );
}

#[test]
fn normalize_rewrites_backslashes_and_strips_decoration() {
    let (_dir, resolver) = standards_fixture();

    assert_eq!(resolver.normalize("notes\\a.md"), "notes/a.md");
    assert_eq!(resolver.normalize("./notes/a.md"), "notes/a.md");
    assert_eq!(resolver.normalize("notes/dir/"), "notes/dir");
    assert_eq!(resolver.normalize(""), "");
}

#[test]
fn canonical_keys_are_already_normal() {
    let (_dir, resolver) = standards_fixture();

    assert_eq!(resolver.normalize("notes/a.md"), "notes/a.md");
    assert_eq!(resolver.normalize("a.md"), "a.md");
}

#[test]
fn aliases_cover_every_accepted_form() {
    let (dir, resolver) = standards_fixture();

    let key = "standards/0. core/registry standard.md";
    let aliases = resolver.all_aliases(key);

    assert!(aliases.contains(key));
    assert!(aliases.contains(&dir.path().join(key).to_string_lossy().replace('\\', "/")));
    assert!(aliases.contains(&format!("../{key}")));
    assert!(aliases.contains("registry standard.md"));
    assert!(aliases.contains("abstract://standard:registry"));
}

#[test]
fn find_by_any_key_substitutes_aliases() {
    let (_dir, resolver) = standards_fixture();

    let live_keys = vec![
        "standards/0. core/registry standard.md".to_string(),
        "notes/a.md".to_string(),
    ];

    // Logical form finds the canonical key.
    assert_eq!(
        resolver.find_by_any_key("abstract://standard:registry", &live_keys),
        Some("standards/0. core/registry standard.md".to_string())
    );
    // Bare filename falls back to name comparison.
    assert_eq!(
        resolver.find_by_any_key("a.md", &live_keys),
        Some("notes/a.md".to_string())
    );
    assert_eq!(resolver.find_by_any_key("missing.md", &live_keys), None);
}

#[test]
fn aliases_resolve_back_for_every_live_key() {
    let (_dir, resolver) = standards_fixture();

    let live_keys = vec![
        "standards/0. core/registry standard.md".to_string(),
        "standards/task-standard.md".to_string(),
    ];

    for key in &live_keys {
        for alias in resolver.all_aliases(key) {
            let found = resolver.find_by_any_key(&alias, &live_keys);
            assert_eq!(
                found.as_deref(),
                Some(key.as_str()),
                "alias {alias:?} did not resolve to {key:?}"
            );
        }
    }
}

#[test]
fn register_logical_accepts_both_address_forms() {
    let (_dir, mut resolver) = standards_fixture();

    assert!(resolver.register_logical("abstract://incident:security", "work-items/incidents.md"));
    assert!(resolver.register_logical("abstract://alpha/context/main", "projects/alpha/context.md"));
    assert!(!resolver.register_logical("abstract://", "x.md"));
    assert!(!resolver.register_logical("not-a-scheme://a:b", "x.md"));

    assert_eq!(
        resolver.resolve_logical("abstract://incident:security"),
        Some("work-items/incidents.md")
    );
    assert_eq!(
        resolver.resolve_logical("abstract://alpha/context/main"),
        Some("projects/alpha/context.md")
    );
}

#[test]
fn logical_address_parsing() {
    assert_eq!(
        LogicalAddress::parse("abstract://standard:registry"),
        Some(LogicalAddress::Namespaced {
            namespace: "standard",
            id: "registry"
        })
    );
    assert_eq!(
        LogicalAddress::parse("abstract://alpha/context/main"),
        Some(LogicalAddress::Scoped {
            project: "alpha",
            category: "context",
            id: "main"
        })
    );
    assert_eq!(LogicalAddress::parse("abstract://only-one-part"), None);
    assert_eq!(LogicalAddress::parse("abstract://a/b/c/d"), None);
    assert_eq!(LogicalAddress::parse("file://a:b"), None);
}

#[test]
fn stop_words_never_become_ids() {
    let dir = tempdir().unwrap();
    let standards = dir.path().join("standards");
    std::fs::create_dir_all(&standards).unwrap();
    // Stem "by" matches the trailing-token pattern but is a stop word.
    std::fs::write(standards.join("by.md"), "x").unwrap();

    let resolver = KeyResolver::new(dir.path(), "standards", "platform");
    assert_eq!(resolver.statistics().logical_mappings, 0);
}

#[test]
fn missing_standards_root_is_tolerated() {
    let dir = tempdir().unwrap();
    let resolver = KeyResolver::new(dir.path(), "standards", "platform");

    let stats = resolver.statistics();
    assert_eq!(stats.logical_mappings, 0);
    assert!(stats.project_root_exists);
    assert!(!stats.standards_root_exists);
}
