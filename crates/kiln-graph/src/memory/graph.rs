//! Core Graph structure.

use std::path::PathBuf;
use std::sync::Arc;

use indexmap::{IndexMap, IndexSet};
use path_clean::PathClean;
use rustc_hash::FxBuildHasher;

use crate::DependencyEdge;

/// Ordered map from module path to its edge.
pub type EdgeMap = IndexMap<PathBuf, Arc<DependencyEdge>, FxBuildHasher>;

/// Ordered set of module paths.
pub type PathSet = IndexSet<PathBuf, FxBuildHasher>;

/// Module dependency graph rooted at a single entry file.
///
/// Edges are held behind `Arc` so that deltas can hand out snapshots without
/// copying module code. Updating an edge that a snapshot still references
/// clones it first (`Arc::make_mut`), so snapshots never change after the fact.
#[derive(Debug, Clone)]
pub struct Graph {
    pub(super) entry_file: PathBuf,
    pub(super) dependencies: EdgeMap,
    /// Set when a link was dropped and unreachable modules have not been
    /// collected yet. Survives a failed pass so the next one collects them.
    pub(super) needs_collection: bool,
}

impl Graph {
    /// Create an empty graph for `entry_file`.
    ///
    /// The path is lexically normalized so it matches resolver output.
    pub fn new(entry_file: impl Into<PathBuf>) -> Self {
        Self {
            entry_file: entry_file.into().clean(),
            dependencies: EdgeMap::default(),
            needs_collection: false,
        }
    }
}
