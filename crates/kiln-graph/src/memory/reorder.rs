//! Deterministic module ordering for full (reset) deltas.

use std::path::PathBuf;
use std::sync::Arc;

use super::graph::{EdgeMap, Graph};

impl Graph {
    /// Order every module depth-first from the entry.
    ///
    /// Children are visited in the order their module references them, and a
    /// module shared by several parents takes the position of its first visit.
    /// Modules not reachable from the entry keep their relative order at the
    /// end. Calling this twice on an unchanged graph yields the same order.
    pub fn reorder(&self) -> EdgeMap {
        let mut ordered = EdgeMap::with_capacity_and_hasher(self.len(), Default::default());
        let mut stack: Vec<PathBuf> = vec![self.entry_file.clone()];

        while let Some(path) = stack.pop() {
            if ordered.contains_key(&path) {
                continue;
            }
            let Some(edge) = self.dependencies.get(&path) else {
                continue;
            };
            ordered.insert(path, Arc::clone(edge));

            // Reverse so the first dependency is popped first.
            for dependency in edge.ordered_dependency_paths().into_iter().rev() {
                if !ordered.contains_key(dependency) {
                    stack.push(dependency.to_path_buf());
                }
            }
        }

        for (path, edge) in &self.dependencies {
            if !ordered.contains_key(path) {
                ordered.insert(path.clone(), Arc::clone(edge));
            }
        }

        ordered
    }
}
