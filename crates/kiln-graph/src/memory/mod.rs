//! In-memory dependency graph.
//!
//! The graph itself lives in `graph.rs`; the other files add `impl Graph`
//! blocks for mutations, queries, traversal and reordering.

mod graph;
mod mutations;
mod queries;
mod reorder;
mod traversal;

pub use graph::{EdgeMap, Graph, PathSet};
pub use traversal::{Traversal, TraversalContext};
