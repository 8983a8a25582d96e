// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Cleanup handler registry.
//!
//! Collaborators holding file observers or descriptors register a stop
//! callback; during quiescence the registry runs them all in order. The
//! protocol is best-effort: a failing handler is logged and must not poison
//! the others.

use parking_lot::Mutex;

type Handler = Box<dyn Fn() -> anyhow::Result<()> + Send + Sync>;

/// Outcome of running the registry.
#[derive(Debug, Clone, Copy, Default)]
pub struct CleanupOutcome {
    /// Handlers that completed successfully.
    pub ran: usize,
    /// Handlers that returned an error.
    pub failed: usize,
}

impl CleanupOutcome {
    /// Total handlers invoked.
    pub fn total(&self) -> usize {
        self.ran + self.failed
    }
}

/// Ordered list of named cleanup callbacks.
#[derive(Default)]
pub struct CleanupRegistry {
    handlers: Mutex<Vec<(String, Handler)>>,
}

impl CleanupRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a handler. Handlers run in registration order.
    pub fn register(
        &self,
        name: impl Into<String>,
        handler: impl Fn() -> anyhow::Result<()> + Send + Sync + 'static,
    ) {
        self.handlers.lock().push((name.into(), Box::new(handler)));
    }

    /// Run every handler in order, logging individual failures.
    pub fn run_all(&self) -> CleanupOutcome {
        let handlers = self.handlers.lock();
        let mut outcome = CleanupOutcome::default();

        for (name, handler) in handlers.iter() {
            match handler() {
                Ok(()) => outcome.ran += 1,
                Err(e) => {
                    outcome.failed += 1;
                    tracing::error!("cleanup handler {name} failed: {e}");
                }
            }
        }

        outcome
    }

    /// Number of registered handlers.
    pub fn len(&self) -> usize {
        self.handlers.lock().len()
    }

    /// Whether no handlers are registered.
    pub fn is_empty(&self) -> bool {
        self.handlers.lock().is_empty()
    }
}

#[cfg(test)]
#[path = "cleanup_tests.rs"]
mod tests;
