//! Shared test utilities for kiln-bundler tests

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;

use kiln_bundler::{
    BundlerRuntime, ChangeHub, DeltaBundler, DeltaCalculator, DeltaOptions, EdgeMap, PathSet,
};
use kiln_graph::TestRuntime;

pub const ENTRY: &str = "/app/index.js";

/// index -> a, b; a -> c; b -> c
pub fn diamond() -> Arc<TestRuntime> {
    Arc::new(
        TestRuntime::new()
            .with_file(ENTRY, "require('./a');\nrequire('./b');")
            .with_file("/app/a.js", "require('./c');")
            .with_file("/app/b.js", "require('./c');")
            .with_file("/app/c.js", "module.exports = 42;"),
    )
}

/// A calculator over `runtime` for [`ENTRY`], with the hub feeding it.
pub fn calculator(runtime: &Arc<TestRuntime>) -> (DeltaCalculator, Arc<ChangeHub>) {
    let (bundler_runtime, hub) = BundlerRuntime::with_hub(Arc::clone(runtime));
    (
        DeltaCalculator::new(DeltaOptions::new(ENTRY), bundler_runtime),
        hub,
    )
}

pub fn bundler(runtime: &Arc<TestRuntime>) -> (DeltaBundler, Arc<ChangeHub>) {
    let (bundler_runtime, hub) = BundlerRuntime::with_hub(Arc::clone(runtime));
    (DeltaBundler::new(bundler_runtime), hub)
}

/// Keys of an edge map as strings, in order.
pub fn keys(map: &EdgeMap) -> Vec<String> {
    map.keys().map(|p| p.display().to_string()).collect()
}

pub fn set(paths: &PathSet) -> Vec<String> {
    paths.iter().map(|p| p.display().to_string()).collect()
}

pub fn path(p: &str) -> PathBuf {
    PathBuf::from(p)
}

pub fn as_path(p: &str) -> &Path {
    Path::new(p)
}
