mod property_tests;

use std::path::PathBuf;

use crate::{Graph, TestRuntime, TransformOptions, Traversal, TraversalContext};

/// index -> a, b; a -> c; b -> c
pub(crate) fn diamond() -> TestRuntime {
    TestRuntime::new()
        .with_file("/app/index.js", "require('./a');\nrequire('./b');")
        .with_file("/app/a.js", "require('./c');")
        .with_file("/app/b.js", "require('./c');")
        .with_file("/app/c.js", "module.exports = 42;")
}

pub(crate) async fn build(runtime: &TestRuntime) -> (Graph, Traversal) {
    let mut graph = Graph::new("/app/index.js");
    let options = TransformOptions::default();
    let ctx = TraversalContext::new(runtime, runtime, &options);
    let traversal = graph
        .initial_traverse(&ctx)
        .await
        .expect("initial traversal should succeed");
    (graph, traversal)
}

pub(crate) async fn retraverse(
    graph: &mut Graph,
    runtime: &TestRuntime,
    paths: &[&str],
) -> crate::Result<Traversal> {
    let options = TransformOptions::default();
    let ctx = TraversalContext::new(runtime, runtime, &options);
    let paths: Vec<PathBuf> = paths.iter().map(|p| PathBuf::from(*p)).collect();
    graph.traverse(paths, &ctx).await
}
