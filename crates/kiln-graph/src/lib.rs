//! # kiln-graph
//!
//! In-memory module dependency graph and the traversal engine that keeps it
//! up to date.
//!
//! ## Overview
//!
//! A [`Graph`] maps absolute module paths to [`DependencyEdge`]s and remembers
//! the entry file it was built from. The traversal engine populates it from
//! scratch ([`Graph::initial_traverse`]), re-processes a set of changed paths
//! ([`Graph::traverse`]) and produces a deterministic module order for full
//! snapshots ([`Graph::reorder`]).
//!
//! Source transformation and specifier resolution are not implemented here.
//! They are supplied through the [`Transformer`] and [`Resolver`] traits in
//! [`runtime`].
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │                   Graph                      │
//! │   entry_file + IndexMap<PathBuf, Arc<Edge>>  │
//! └───────────────┬──────────────────────────────┘
//!                 │
//!        ┌────────┴────────┐
//!        ▼                 ▼
//!  ┌───────────┐     ┌──────────────┐
//!  │ Traversal │────▶│   Runtime    │
//!  │  engine   │     │ (Resolver +  │
//!  └───────────┘     │ Transformer) │
//!                    └──────────────┘
//! ```
//!
//! ## Invariants
//!
//! After every successful traversal:
//!
//! - **Closure**: every path a module depends on is itself a key of the graph.
//! - **Bidirectional edges**: if `A` depends on `B`, `B`'s inverse
//!   dependencies contain `A`, and the other way round.
//!
//! [`Graph::check_invariants`] verifies both.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use kiln_graph::{Graph, TraversalContext, TransformOptions};
//! use kiln_graph::runtime::{Resolver, Transformer};
//!
//! # async fn example(resolver: &dyn Resolver, transformer: &dyn Transformer) -> kiln_graph::Result<()> {
//! let mut graph = Graph::new("/app/index.js");
//! let options = TransformOptions::default();
//! let ctx = TraversalContext::new(resolver, transformer, &options);
//!
//! let initial = graph.initial_traverse(&ctx).await?;
//! println!("{} modules", initial.added.len());
//!
//! let delta = graph.traverse(["/app/index.js".into()], &ctx).await?;
//! println!("{} modified, {} deleted", delta.added.len(), delta.deleted.len());
//! # Ok(())
//! # }
//! ```

pub mod edge;
pub mod runtime;
pub mod source_map;

mod memory;

pub use edge::{Dependency, DependencyEdge, ModuleType, TransformOutput};
pub use memory::{EdgeMap, Graph, PathSet, Traversal, TraversalContext};
pub use runtime::{ProgressFn, Resolver, TransformOptions, Transformer};
pub use source_map::{FunctionMap, RawSourceMap};

#[cfg(any(test, feature = "test-utils"))]
pub use runtime::test_utils::TestRuntime;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils {
    pub use super::runtime::test_utils::*;
}

use std::path::PathBuf;

/// Errors raised while building or updating a graph.
#[derive(Debug, Clone, thiserror::Error)]
pub enum GraphError {
    /// A dependency specifier could not be mapped to a module path.
    #[error("Failed to resolve module '{specifier}' from '{}': {reason}", from.display())]
    Resolution {
        specifier: String,
        from: PathBuf,
        reason: String,
    },

    /// A module could not be parsed or compiled.
    #[error("Failed to transform '{}': {reason}", path.display())]
    Transform { path: PathBuf, reason: String },

    /// The entry module has no edge in the graph.
    #[error("Entry module not found in graph: {}", .0.display())]
    MissingEntry(PathBuf),

    /// A structural invariant of the graph does not hold.
    #[error("Graph invariant violated: {0}")]
    Invariant(String),
}

impl GraphError {
    /// Create a resolution error.
    pub fn resolution(
        specifier: impl Into<String>,
        from: impl Into<PathBuf>,
        reason: impl Into<String>,
    ) -> Self {
        Self::Resolution {
            specifier: specifier.into(),
            from: from.into(),
            reason: reason.into(),
        }
    }

    /// Create a transform error.
    pub fn transform(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::Transform {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

/// Result type alias for graph operations.
pub type Result<T> = std::result::Result<T, GraphError>;

#[cfg(test)]
mod tests;
