// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Canonical key resolution.
//!
//! Every component stores project-relative forward-slash keys; this module
//! turns any accepted key form (logical `abstract://` address, absolute path,
//! `../`-relative path, canonical key, bare filename) into that one form.
//! Normalization is pure and lexical; only construction touches disk, to
//! build the logical address table from the standards tree.

use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::path::{Component, Path, PathBuf};

use regex::Regex;

/// Scheme prefix for logical addresses.
pub const LOGICAL_SCHEME: &str = "abstract://";

/// Words that never serve as a logical document id.
const ID_STOP_WORDS: &[&str] = &["by", "ai", "assistant", "may", "cet", "the", "and", "of"];

/// Folder-name fragments marking archived standards, skipped during the scan.
const ARCHIVE_MARKERS: &[&str] = &[
    "archive",
    "backup",
    "deprecated",
    "old",
    "consolidated",
    "rename",
    "template",
    "20250",
];

/// A parsed `abstract://` address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalAddress<'a> {
    /// `abstract://<namespace>:<id>`
    Namespaced { namespace: &'a str, id: &'a str },
    /// `abstract://<project>/<category>/<id>`
    Scoped {
        project: &'a str,
        category: &'a str,
        id: &'a str,
    },
}

impl LogicalAddress<'_> {
    /// Parse either accepted address form; `None` when malformed.
    pub fn parse(address: &str) -> Option<LogicalAddress<'_>> {
        let rest = address.strip_prefix(LOGICAL_SCHEME)?;

        if let Some((namespace, id)) = rest.split_once(':') {
            return (!namespace.is_empty() && !id.is_empty() && !namespace.contains('/'))
                .then_some(LogicalAddress::Namespaced { namespace, id });
        }

        let mut parts = rest.split('/');
        match (parts.next(), parts.next(), parts.next(), parts.next()) {
            (Some(project), Some(category), Some(id), None)
                if !project.is_empty() && !category.is_empty() && !id.is_empty() =>
            {
                Some(LogicalAddress::Scoped {
                    project,
                    category,
                    id,
                })
            }
            _ => None,
        }
    }
}

/// Resolver statistics for observability.
#[derive(Debug, Clone, Copy)]
pub struct ResolverStatistics {
    /// Registered logical address mappings.
    pub logical_mappings: usize,
    /// Whether the project root exists on disk.
    pub project_root_exists: bool,
    /// Whether the standards root exists on disk.
    pub standards_root_exists: bool,
}

/// Unified key resolver; owns the logical address table.
pub struct KeyResolver {
    project_root: PathBuf,
    standards_dir: String,
    collaborator_dir: String,
    logical: HashMap<String, String>,
}

impl KeyResolver {
    /// Build a resolver, scanning the standards tree for logical ids.
    pub fn new(project_root: &Path, standards_dir: &str, collaborator_dir: &str) -> KeyResolver {
        let mut resolver = KeyResolver {
            project_root: project_root.to_path_buf(),
            standards_dir: standards_dir.to_string(),
            collaborator_dir: collaborator_dir.to_string(),
            logical: HashMap::new(),
        };
        resolver.scan_standards();
        tracing::debug!(
            "resolver initialized: {} logical mappings under {}",
            resolver.logical.len(),
            resolver.project_root.display()
        );
        resolver
    }

    fn scan_standards(&mut self) {
        let root = self.project_root.join(&self.standards_dir);
        if !root.is_dir() {
            tracing::warn!("standards root not found: {}", root.display());
            return;
        }
        let patterns = id_patterns();
        self.scan_dir(&root, &patterns);
    }

    fn scan_dir(&mut self, dir: &Path, patterns: &[Regex]) {
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!("cannot read standards directory {}: {e}", dir.display());
                return;
            }
        };

        for entry in entries.flatten() {
            let path = entry.path();
            let name = entry.file_name().to_string_lossy().to_lowercase();
            if path.is_dir() {
                if !is_archive_folder(&name) {
                    self.scan_dir(&path, patterns);
                }
            } else if name.ends_with(".md")
                && let Some(id) = extract_logical_id(&path, patterns)
            {
                let canonical = self.to_canonical(&path);
                let address = format!("{LOGICAL_SCHEME}standard:{id}");
                tracing::debug!("mapped {address} -> {canonical}");
                self.logical.insert(address, canonical);
            }
        }
    }

    /// Normalize any accepted key form into a canonical key. Pure; unknown
    /// logical addresses pass through unchanged.
    pub fn normalize(&self, any_key: &str) -> String {
        if any_key.is_empty() {
            return String::new();
        }

        let key = any_key.replace('\\', "/");

        if key.starts_with(LOGICAL_SCHEME) {
            return match self.logical.get(&key) {
                Some(canonical) => canonical.clone(),
                None => {
                    tracing::debug!("unknown logical address: {key}");
                    key
                }
            };
        }

        if Path::new(&key).is_absolute() {
            return self.to_canonical(Path::new(&key));
        }

        if key.starts_with("../") {
            let joined = self
                .project_root
                .join(&self.collaborator_dir)
                .join(&key);
            return self.to_canonical(&joined);
        }

        // Already canonical, or a bare filename.
        let mut trimmed = key.as_str();
        while let Some(rest) = trimmed.strip_prefix("./") {
            trimmed = rest;
        }
        trimmed.trim_end_matches('/').to_string()
    }

    /// Look up a registered logical address; missing addresses are `None`.
    pub fn resolve_logical(&self, address: &str) -> Option<&str> {
        self.logical.get(address).map(String::as_str)
    }

    /// Register a logical address for an integration adapter. Returns false
    /// (with a warning) when the address is malformed.
    pub fn register_logical(&mut self, address: &str, key: &str) -> bool {
        if LogicalAddress::parse(address).is_none() {
            tracing::warn!("rejected malformed logical address: {address}");
            return false;
        }
        self.logical
            .insert(address.to_string(), self.normalize(key));
        true
    }

    /// Every equivalent input the resolver accepts for a canonical key.
    pub fn all_aliases(&self, canonical_key: &str) -> BTreeSet<String> {
        let mut aliases = BTreeSet::new();
        aliases.insert(canonical_key.to_string());
        aliases.insert(path_to_slash(&self.project_root.join(canonical_key)));

        if canonical_key.starts_with(&self.standards_dir) {
            aliases.insert(format!("../{canonical_key}"));
        }

        if let Some(name) = Path::new(canonical_key).file_name() {
            aliases.insert(name.to_string_lossy().into_owned());
        }

        if let Some((address, _)) = self
            .logical
            .iter()
            .find(|(_, canonical)| canonical.as_str() == canonical_key)
        {
            aliases.insert(address.clone());
        }

        aliases
    }

    /// Find a candidate key matching `search_key` in any accepted form:
    /// alias substitution first, then bare filename comparison.
    pub fn find_by_any_key(&self, search_key: &str, candidates: &[String]) -> Option<String> {
        let canonical = self.normalize(search_key);
        for alias in self.all_aliases(&canonical) {
            if candidates.iter().any(|c| *c == alias) {
                return Some(alias);
            }
        }

        let search_name = Path::new(search_key).file_name()?;
        candidates
            .iter()
            .find(|c| Path::new(c.as_str()).file_name() == Some(search_name))
            .cloned()
    }

    /// Resolver observability counters.
    pub fn statistics(&self) -> ResolverStatistics {
        ResolverStatistics {
            logical_mappings: self.logical.len(),
            project_root_exists: self.project_root.exists(),
            standards_root_exists: self.project_root.join(&self.standards_dir).exists(),
        }
    }

    /// Project-relative slash form; paths outside the project root keep
    /// their normalized absolute form as an escape hatch.
    fn to_canonical(&self, path: &Path) -> String {
        let normalized = lexical_normalize(path);
        match normalized.strip_prefix(&self.project_root) {
            Ok(relative) => path_to_slash(relative),
            Err(_) => path_to_slash(&normalized),
        }
    }
}

fn id_patterns() -> Vec<Regex> {
    // Ordered: the first match wins.
    [
        r"(\w+)\s+standard",
        r"(\w+)[-_]standard",
        r"^(\w+)\s",
        r"(\w+)$",
    ]
    .iter()
    .filter_map(|p| Regex::new(p).ok())
    .collect()
}

fn is_archive_folder(name: &str) -> bool {
    if ARCHIVE_MARKERS.iter().any(|marker| name.contains(marker)) {
        return true;
    }
    // Date-like prefix: "2024-..." or "2024_...".
    let bytes = name.as_bytes();
    bytes.len() >= 5
        && bytes[..4].iter().all(u8::is_ascii_digit)
        && matches!(bytes[4], b'-' | b'_')
}

fn extract_logical_id(path: &Path, patterns: &[Regex]) -> Option<String> {
    let stem = path.file_stem()?.to_string_lossy().to_lowercase();
    for pattern in patterns {
        if let Some(capture) = pattern.captures(&stem).and_then(|c| c.get(1)) {
            let id = capture.as_str().replace(' ', "_");
            if !ID_STOP_WORDS.contains(&id.as_str()) {
                return Some(id);
            }
        }
    }
    None
}

/// Resolve `.` and `..` components lexically, without touching disk.
fn lexical_normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::ParentDir => {
                out.pop();
            }
            Component::CurDir => {}
            other => out.push(other.as_os_str()),
        }
    }
    out
}

fn path_to_slash(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

#[cfg(test)]
#[path = "resolver_tests.rs"]
mod tests;
