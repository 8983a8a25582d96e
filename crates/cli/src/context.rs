// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Application context.
//!
//! Owns the long-lived components (resolver, lock manager, file operations,
//! document cache, state store, cleanup registry) and passes them to every
//! entry point. Convenience wrappers accept any key form and run single-file
//! transactions, so each successful mutation publishes its cache update.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use serde_json::{Map, Value};

use crate::cache::{CacheEntry, DocumentCache, DocumentStore};
use crate::checkpoint::Checkpoint;
use crate::cleanup::CleanupRegistry;
use crate::config::Config;
use crate::discovery;
use crate::error::{Error, Result};
use crate::fileops::FileOps;
use crate::locks::LockManager;
use crate::resolver::KeyResolver;
use crate::state::StateStore;
use crate::transaction::{FileOp, Transaction};
use crate::verifier::SyncVerifier;

/// Owner of the core components for one project.
pub struct AppContext {
    /// Loaded configuration.
    pub config: Config,
    /// Discovered project root.
    pub root: PathBuf,
    /// Key resolver.
    pub resolver: KeyResolver,
    /// Lock manager.
    pub locks: Arc<LockManager>,
    /// Atomic file operations.
    pub fileops: Arc<FileOps>,
    /// Persisted-state reader/writer.
    pub state: Arc<StateStore>,
    /// In-memory document cache.
    pub cache: Arc<DocumentCache>,
    /// Cleanup handler registry.
    pub cleanup: Arc<CleanupRegistry>,
}

impl AppContext {
    /// Wire up a context for the given config and project root.
    pub fn new(config: Config, root: PathBuf) -> AppContext {
        let locks = Arc::new(LockManager::new(config.locks.timeout()));
        let fileops = Arc::new(FileOps::new(root.clone(), Arc::clone(&locks)));
        let state = Arc::new(StateStore::new(Arc::clone(&fileops)));
        let cache = Arc::new(DocumentCache::new(
            Arc::clone(&locks),
            Arc::clone(&fileops),
            config.project.standards_dir.clone(),
            config.cache.max_documents,
            config.cache.max_bytes,
        ));
        let resolver = KeyResolver::new(
            &root,
            &config.project.standards_dir,
            &config.project.collaborator_dir,
        );

        AppContext {
            config,
            root,
            resolver,
            locks,
            fileops,
            state,
            cache,
            cleanup: Arc::new(CleanupRegistry::new()),
        }
    }

    /// Build a context from the current directory: config discovery first,
    /// then project-root discovery with a cwd fallback.
    pub fn from_cli(explicit_config: Option<&Path>) -> Result<AppContext> {
        let cwd = std::env::current_dir().map_err(|e| Error::io(".", e))?;

        let config = match discovery::resolve_config(explicit_config, &cwd)? {
            Some(path) => Config::load(&path)?,
            None => Config::default(),
        };

        let root = config
            .project
            .root
            .clone()
            .or_else(|| discovery::find_project_root(&cwd, &config.project.standards_dir))
            .unwrap_or(cwd);

        Ok(AppContext::new(config, root))
    }

    /// Configured file-lock deadline.
    pub fn lock_timeout(&self) -> Option<Duration> {
        self.config.locks.timeout()
    }

    /// Atomically write a document; publishes the cache update when asked.
    pub fn write_file(&self, key: &str, content: &[u8], update_cache: bool) -> Result<()> {
        let key = self.resolver.normalize(key);
        let mut tx = Transaction::new([key.clone()], update_cache);
        tx.stage(FileOp::Write {
            key,
            content: content.to_vec(),
        });
        tx.execute(self).map(|_| ())
    }

    /// Atomically append to a document.
    pub fn append_file(&self, key: &str, content: &[u8], update_cache: bool) -> Result<()> {
        let key = self.resolver.normalize(key);
        let mut tx = Transaction::new([key.clone()], update_cache);
        tx.stage(FileOp::Append {
            key,
            content: content.to_vec(),
        });
        tx.execute(self).map(|_| ())
    }

    /// Atomically delete a document.
    pub fn delete_file(&self, key: &str, update_cache: bool) -> Result<()> {
        let key = self.resolver.normalize(key);
        let mut tx = Transaction::new([key.clone()], update_cache);
        tx.stage(FileOp::Delete { key });
        tx.execute(self).map(|_| ())
    }

    /// Shallow-merge a patch into a JSON document.
    pub fn update_json(
        &self,
        key: &str,
        patch: Map<String, Value>,
        create_if_missing: bool,
        update_cache: bool,
    ) -> Result<()> {
        let key = self.resolver.normalize(key);
        let mut tx = Transaction::new([key.clone()], update_cache);
        tx.stage(FileOp::UpdateJson {
            key,
            patch,
            create_if_missing,
        });
        tx.execute(self).map(|_| ())
    }

    /// Read a document's bytes under its file lock.
    pub fn read_file(&self, key: &str) -> Result<Vec<u8>> {
        let key = self.resolver.normalize(key);
        self.fileops.read_file(&key)
    }

    /// Cache read-through: hit the cache or load from disk. Accepts any key
    /// form, so `abstract://` addresses work end-to-end.
    pub fn fetch_document(&self, key: &str) -> Result<CacheEntry> {
        let key = self.resolver.normalize(key);
        if let Some(entry) = self.cache.get(&key) {
            return Ok(entry);
        }
        self.cache.load(&key)
    }

    /// Preload documents under a directory into the cache.
    pub fn preload(&self, directory: &str, recursive: bool) -> usize {
        let key = self.resolver.normalize(directory);
        let dir = self.fileops.abs_path(&key);
        self.cache
            .preload(&dir, recursive, &self.config.cache.preload_categories)
    }

    /// Build the sync verifier over the project root.
    pub fn verifier(&self) -> Result<SyncVerifier> {
        SyncVerifier::new(
            self.root.clone(),
            Arc::clone(&self.state),
            &self.config.sync.include,
            &self.config.sync.exclude,
        )
    }

    /// Build the checkpoint driver.
    pub fn checkpoint(&self) -> Checkpoint {
        let store: Arc<dyn DocumentStore> = Arc::clone(&self.cache) as Arc<dyn DocumentStore>;
        Checkpoint::new(
            store,
            Arc::clone(&self.state),
            Arc::clone(&self.cleanup),
            Arc::clone(&self.fileops),
            self.config.checkpoint.backup_dir.clone(),
            self.config.cache.max_documents,
            self.config.project.watched_directories.clone(),
            self.config.checkpoint.settle(),
        )
    }
}

#[cfg(test)]
#[path = "context_tests.rs"]
mod tests;
