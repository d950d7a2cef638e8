//! Query methods for Graph.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::graph::{EdgeMap, Graph};
use crate::{DependencyEdge, GraphError, Result};

impl Graph {
    pub fn entry_file(&self) -> &Path {
        &self.entry_file
    }

    /// Number of modules in the graph.
    pub fn len(&self) -> usize {
        self.dependencies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dependencies.is_empty()
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.dependencies.contains_key(path)
    }

    pub fn edge(&self, path: &Path) -> Option<&Arc<DependencyEdge>> {
        self.dependencies.get(path)
    }

    /// The entry module's edge, if the graph has been built.
    pub fn entry_edge(&self) -> Result<&Arc<DependencyEdge>> {
        self.dependencies
            .get(&self.entry_file)
            .ok_or_else(|| GraphError::MissingEntry(self.entry_file.clone()))
    }

    /// Iterate over every edge in graph order.
    pub fn edges(&self) -> impl Iterator<Item = (&PathBuf, &Arc<DependencyEdge>)> {
        self.dependencies.iter()
    }

    /// Borrow the underlying edge map.
    pub fn dependencies(&self) -> &EdgeMap {
        &self.dependencies
    }

    /// Resolved dependency paths of `path` (empty if unknown).
    pub fn dependencies_of(&self, path: &Path) -> Vec<PathBuf> {
        self.dependencies
            .get(path)
            .map(|edge| edge.dependency_paths().cloned().collect())
            .unwrap_or_default()
    }

    /// Modules that depend on `path` (empty if unknown).
    pub fn inverse_dependencies_of(&self, path: &Path) -> Vec<PathBuf> {
        self.dependencies
            .get(path)
            .map(|edge| edge.inverse_dependencies.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Verify the closure and bidirectional-link invariants.
    ///
    /// Returns the first violation found.
    pub fn check_invariants(&self) -> Result<()> {
        for (path, edge) in &self.dependencies {
            for target in edge.dependency_paths() {
                let Some(target_edge) = self.dependencies.get(target) else {
                    return Err(GraphError::Invariant(format!(
                        "{} depends on {}, which is not in the graph",
                        path.display(),
                        target.display()
                    )));
                };
                if !target_edge.inverse_dependencies.contains(path) {
                    return Err(GraphError::Invariant(format!(
                        "{} depends on {}, but is missing from its inverse dependencies",
                        path.display(),
                        target.display()
                    )));
                }
            }

            for dependent in &edge.inverse_dependencies {
                let linked = self
                    .dependencies
                    .get(dependent)
                    .is_some_and(|d| d.dependency_paths().any(|p| p == path));
                if !linked {
                    return Err(GraphError::Invariant(format!(
                        "{} lists {} as a dependent, but it does not depend on it",
                        path.display(),
                        dependent.display()
                    )));
                }
            }
        }
        Ok(())
    }
}
