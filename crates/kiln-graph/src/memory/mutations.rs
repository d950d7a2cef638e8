//! Mutation methods for Graph.
//!
//! Everything that changes forward or inverse links goes through here so the
//! two sides stay in sync.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::graph::{EdgeMap, Graph};
use crate::DependencyEdge;

impl Graph {
    /// Insert an untransformed edge for `path` unless one exists.
    ///
    /// Returns `true` if the edge was created.
    pub(crate) fn create_edge(&mut self, path: PathBuf) -> bool {
        if self.dependencies.contains_key(&path) {
            return false;
        }
        let edge = DependencyEdge::new(path.clone());
        self.dependencies.insert(path, Arc::new(edge));
        true
    }

    /// Mutable access to an edge, cloning it if a snapshot still shares it.
    pub(crate) fn edge_mut(&mut self, path: &Path) -> Option<&mut DependencyEdge> {
        self.dependencies.get_mut(path).map(Arc::make_mut)
    }

    /// Record that `dependent` depends on `target`.
    pub(crate) fn add_inverse(&mut self, target: &Path, dependent: &Path) {
        if let Some(edge) = self.edge_mut(target) {
            edge.inverse_dependencies.insert(dependent.to_path_buf());
        }
    }

    /// Forget that `dependent` depends on `target`.
    pub(crate) fn remove_inverse(&mut self, target: &Path, dependent: &Path) {
        if let Some(edge) = self.edge_mut(target) {
            edge.inverse_dependencies.shift_remove(dependent);
        }
    }

    /// Remove an edge without touching the links of other edges.
    pub(crate) fn remove_edge(&mut self, path: &Path) -> Option<Arc<DependencyEdge>> {
        self.dependencies.shift_remove(path)
    }

    /// Drop every edge. The entry file is kept.
    pub fn clear(&mut self) {
        self.dependencies = EdgeMap::default();
        self.needs_collection = false;
    }

    /// Replace the edge order with [`Graph::reorder`].
    pub fn reorder_in_place(&mut self) {
        self.dependencies = self.reorder();
    }
}
