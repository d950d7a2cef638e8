//! Pending file changes between two delta computations.
//!
//! Watch events only ever touch these sets. A computation takes the whole
//! accumulated state at once, and hands it back if it fails so that nothing
//! is lost for the next attempt.

use std::path::{Path, PathBuf};

use kiln_graph::{Graph, PathSet};

use crate::watcher::{WatchEvent, WatchEventKind};

/// Paths modified or deleted since the last successful computation.
///
/// A path is never in both sets: the latest event for a path wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PendingChanges {
    pub modified: PathSet,
    pub deleted: PathSet,
}

impl PendingChanges {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one watch event.
    pub fn record(&mut self, event: &WatchEvent) {
        match event.kind {
            WatchEventKind::Delete => {
                self.modified.shift_remove(&event.path);
                self.deleted.insert(event.path.clone());
            }
            WatchEventKind::Modify => {
                self.deleted.shift_remove(&event.path);
                self.modified.insert(event.path.clone());
            }
        }
    }

    /// Returns true if no change is pending.
    pub fn is_empty(&self) -> bool {
        self.modified.is_empty() && self.deleted.is_empty()
    }

    /// Take everything recorded so far, leaving empty sets behind.
    pub fn take(&mut self) -> Self {
        std::mem::take(self)
    }

    /// Put back changes taken by a computation that failed.
    ///
    /// Events recorded after the take are newer and keep precedence: a path
    /// that has since been deleted is not restored as modified, and the other
    /// way round.
    pub fn restore(&mut self, taken: Self) {
        for path in taken.modified {
            if !self.deleted.contains(&path) {
                self.modified.insert(path);
            }
        }
        for path in taken.deleted {
            if !self.modified.contains(&path) {
                self.deleted.insert(path);
            }
        }
    }

    /// Paths an incremental traversal of `graph` has to revisit.
    ///
    /// Every module that imported a deleted file is revisited so it can fail
    /// or re-resolve. Paths the graph does not contain are dropped.
    pub fn paths_to_traverse(&self, graph: &Graph) -> Vec<PathBuf> {
        let mut paths = self.modified.clone();
        for deleted in &self.deleted {
            paths.extend(graph.inverse_dependencies_of(deleted));
        }
        paths
            .into_iter()
            .filter(|path| graph.contains(path))
            .collect()
    }

    pub fn is_modified(&self, path: &Path) -> bool {
        self.modified.contains(path)
    }

    pub fn is_deleted(&self, path: &Path) -> bool {
        self.deleted.contains(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn modify(path: &str) -> WatchEvent {
        WatchEvent::modify(path)
    }

    fn delete(path: &str) -> WatchEvent {
        WatchEvent::delete(path)
    }

    #[test]
    fn test_latest_event_wins() {
        let mut pending = PendingChanges::new();
        pending.record(&modify("/app/a.js"));
        pending.record(&delete("/app/a.js"));
        assert!(pending.is_deleted(Path::new("/app/a.js")));
        assert!(!pending.is_modified(Path::new("/app/a.js")));

        pending.record(&modify("/app/a.js"));
        assert!(pending.is_modified(Path::new("/app/a.js")));
        assert!(!pending.is_deleted(Path::new("/app/a.js")));
    }

    #[test]
    fn test_take_leaves_empty_sets() {
        let mut pending = PendingChanges::new();
        pending.record(&modify("/app/a.js"));
        pending.record(&delete("/app/b.js"));

        let taken = pending.take();
        assert!(pending.is_empty());
        assert_eq!(taken.modified.len(), 1);
        assert_eq!(taken.deleted.len(), 1);
    }

    #[test]
    fn test_restore_keeps_newer_events() {
        let mut pending = PendingChanges::new();
        pending.record(&modify("/app/a.js"));
        pending.record(&modify("/app/b.js"));
        let taken = pending.take();

        pending.record(&delete("/app/a.js"));
        pending.restore(taken);

        assert!(pending.is_deleted(Path::new("/app/a.js")));
        assert!(!pending.is_modified(Path::new("/app/a.js")));
        assert!(pending.is_modified(Path::new("/app/b.js")));
    }
}
