#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use tempfile::tempdir;

use crate::test_utils::test_context;

use super::*;

#[test]
fn fetch_document_resolves_logical_addresses_end_to_end() {
    let dir = tempdir().unwrap();
    let standards = dir.path().join("standards");
    std::fs::create_dir_all(&standards).unwrap();
    std::fs::write(standards.join("registry standard.md"), "# Registry rules\n").unwrap();

    let ctx = test_context(dir.path());

    assert_eq!(
        ctx.resolver.resolve_logical("abstract://standard:registry"),
        Some("standards/registry standard.md")
    );

    let entry = ctx.fetch_document("abstract://standard:registry").unwrap();
    assert_eq!(entry.key, "standards/registry standard.md");
    assert_eq!(entry.content.as_slice(), b"# Registry rules\n");

    // Second fetch is a cache hit.
    let again = ctx.fetch_document("abstract://standard:registry").unwrap();
    assert_eq!(again.access_count, 1);
}

#[test]
fn wrappers_accept_any_key_form() {
    let dir = tempdir().unwrap();
    let ctx = test_context(dir.path());

    // Absolute form normalizes to the canonical project-relative key.
    let absolute = dir.path().join("notes/a.md");
    ctx.write_file(&absolute.to_string_lossy(), b"hi", true)
        .unwrap();

    assert!(ctx.cache.get("notes/a.md").is_some());
    assert_eq!(ctx.read_file("notes/a.md").unwrap(), b"hi");
    assert_eq!(ctx.read_file(&absolute.to_string_lossy()).unwrap(), b"hi");
}

#[test]
fn append_and_update_json_wrappers_publish() {
    let dir = tempdir().unwrap();
    let ctx = test_context(dir.path());

    ctx.append_file("log.md", b"a", true).unwrap();
    ctx.append_file("log.md", b"b", true).unwrap();
    assert_eq!(ctx.cache.get("log.md").unwrap().content.as_slice(), b"ab");

    let patch = serde_json::json!({"k": 1}).as_object().unwrap().clone();
    ctx.update_json("m.json", patch, true, true).unwrap();
    assert!(ctx.cache.get("m.json").is_some());
}

#[test]
fn preload_loads_watched_categories_under_a_directory() {
    let dir = tempdir().unwrap();
    std::fs::create_dir_all(dir.path().join("work-items")).unwrap();
    std::fs::write(dir.path().join("work-items/todo.md"), "tasks").unwrap();
    std::fs::write(dir.path().join("work-items/scratch.md"), "junk").unwrap();

    let ctx = test_context(dir.path());
    let loaded = ctx.preload("work-items", true);

    assert_eq!(loaded, 1);
    assert!(ctx.cache.get("work-items/todo.md").is_some());
}

#[test]
fn from_cli_uses_cwd_when_no_config_or_standards_exist() {
    // No docvault.toml anywhere above a tempdir and no standards root
    // means defaults with the cwd as project root.
    let ctx = AppContext::from_cli(None).unwrap();
    assert_eq!(ctx.config.cache.max_documents, 500);
}
