//! Idempotency gate for the processing loop.
//!
//! Detection (enqueue) is independent of completion, so duplicate
//! filesystem events can enqueue the same path more than once; the loop
//! consults this set to reject already-done items. Only the processing
//! loop touches it, so it needs no locking. The set is in-memory only and
//! lost on restart.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Set of source paths that have been fully processed
#[derive(Debug, Default)]
pub struct ProcessedSet {
    done: HashSet<PathBuf>,
}

impl ProcessedSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Has this path already completed successfully?
    #[must_use]
    pub fn is_done(&self, path: &Path) -> bool {
        self.done.contains(path)
    }

    /// Record a path as completed. No-op if already recorded.
    pub fn mark_done(&mut self, path: PathBuf) {
        self.done.insert(path);
    }

    /// Number of completed paths
    #[must_use]
    pub fn len(&self) -> usize {
        self.done.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.done.is_empty()
    }
}
