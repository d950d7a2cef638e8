//! Property-based tests for graph traversal.
//!
//! Random module graphs (cycles allowed) are built, one module is rewritten,
//! and the incremental result must match what a cold build of the new sources
//! would contain.

use std::collections::{BTreeSet, VecDeque};
use std::path::PathBuf;

use proptest::prelude::*;

use super::retraverse;
use crate::{Graph, TestRuntime, TransformOptions, TraversalContext};

const MAX_MODULES: usize = 8;

fn module_path(index: usize) -> String {
    format!("/app/m{index}.js")
}

fn source(deps: &[usize]) -> String {
    deps.iter()
        .map(|dep| format!("require('./m{dep}');"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Dependency lists for `n` modules.
fn graph_strategy() -> impl Strategy<Value = Vec<Vec<usize>>> {
    (2..=MAX_MODULES).prop_flat_map(|n| {
        prop::collection::vec(prop::collection::vec(0..n, 0..=3), n)
    })
}

fn expected_reachable(deps: &[Vec<usize>]) -> BTreeSet<PathBuf> {
    let mut seen = BTreeSet::new();
    let mut queue = VecDeque::from([0usize]);
    while let Some(current) = queue.pop_front() {
        if !seen.insert(PathBuf::from(module_path(current))) {
            continue;
        }
        queue.extend(deps[current].iter().copied());
    }
    seen
}

fn block_on<F: std::future::Future>(future: F) -> F::Output {
    tokio::runtime::Builder::new_current_thread()
        .build()
        .unwrap()
        .block_on(future)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    /// After any rewrite, the graph holds exactly the reachable modules and
    /// both link invariants hold.
    #[test]
    fn prop_incremental_matches_cold_build(
        (deps, target, new_deps) in graph_strategy().prop_flat_map(|deps| {
            let n = deps.len();
            (Just(deps), 0..n, prop::collection::vec(0..n, 0..=3))
        })
    ) {
        let runtime = TestRuntime::new();
        for (index, list) in deps.iter().enumerate() {
            runtime.write(module_path(index), source(list));
        }

        let mut graph = Graph::new(module_path(0));
        let options = TransformOptions::default();
        let ctx = TraversalContext::new(&runtime, &runtime, &options);
        block_on(graph.initial_traverse(&ctx)).unwrap();

        let keys: BTreeSet<PathBuf> = graph.edges().map(|(p, _)| p.clone()).collect();
        prop_assert_eq!(&keys, &expected_reachable(&deps));
        prop_assert!(graph.check_invariants().is_ok());

        let mut updated = deps.clone();
        updated[target] = new_deps.clone();
        runtime.write(module_path(target), source(&new_deps));

        let path = module_path(target);
        let before = keys;
        let traversal = block_on(retraverse(&mut graph, &runtime, &[path.as_str()])).unwrap();

        let after: BTreeSet<PathBuf> = graph.edges().map(|(p, _)| p.clone()).collect();
        prop_assert_eq!(&after, &expected_reachable(&updated));
        prop_assert!(graph.check_invariants().is_ok());

        let deleted: BTreeSet<PathBuf> = traversal.deleted.iter().cloned().collect();
        let expected_deleted: BTreeSet<PathBuf> = before.difference(&after).cloned().collect();
        prop_assert_eq!(deleted, expected_deleted);
        for added in before.iter().filter(|p| !after.contains(*p)) {
            prop_assert!(!traversal.added.contains_key(added));
        }
    }

    /// Reordering twice yields the same sequence and keeps every module.
    #[test]
    fn prop_reorder_is_deterministic(deps in graph_strategy()) {
        let runtime = TestRuntime::new();
        for (index, list) in deps.iter().enumerate() {
            runtime.write(module_path(index), source(list));
        }

        let mut graph = Graph::new(module_path(0));
        let options = TransformOptions::default();
        let ctx = TraversalContext::new(&runtime, &runtime, &options);
        block_on(graph.initial_traverse(&ctx)).unwrap();

        let first: Vec<PathBuf> = graph.reorder().keys().cloned().collect();
        let second: Vec<PathBuf> = graph.reorder().keys().cloned().collect();
        prop_assert_eq!(&first, &second);
        prop_assert_eq!(first.len(), graph.len());
        prop_assert_eq!(first.first(), Some(&PathBuf::from(module_path(0))));
    }
}
