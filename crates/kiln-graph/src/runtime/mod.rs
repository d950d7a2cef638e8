//! Collaborator abstraction for graph traversal.
//!
//! The traversal engine does not know how a specifier maps to a file or how a
//! file becomes code. Hosts implement [`Resolver`] and [`Transformer`] to
//! provide that behavior; the engine calls them once per module per pass.

// Test utilities (available in test builds)
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{Result, TransformOutput};

/// Progress callback: `(processed, total)` modules of the current pass.
pub type ProgressFn = dyn Fn(usize, usize) + Send + Sync;

/// Options handed to every [`Transformer::transform`] call of one graph.
///
/// A delta calculator computes these once and reuses the same value for every
/// traversal, so transformers may use it as a cache key.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TransformOptions {
    pub dev: bool,
    pub hot: bool,
    pub minify: bool,
    pub platform: Option<String>,
    pub inline_requires: bool,
    pub project_root: PathBuf,
    /// Free-form options forwarded to the transformer untouched.
    pub custom: serde_json::Map<String, serde_json::Value>,
}

/// Maps a dependency specifier to an absolute module path.
pub trait Resolver: Send + Sync + std::fmt::Debug {
    /// Resolve `specifier` as imported from the module at `from`.
    ///
    /// Fails with [`GraphError::Resolution`](crate::GraphError::Resolution).
    fn resolve(&self, specifier: &str, from: &Path) -> Result<PathBuf>;
}

/// Turns a file into code plus its raw dependency list.
#[async_trait]
pub trait Transformer: Send + Sync + std::fmt::Debug {
    /// Transform the file at `path`.
    ///
    /// Fails with [`GraphError::Transform`](crate::GraphError::Transform).
    async fn transform(&self, path: &Path, options: &TransformOptions) -> Result<TransformOutput>;

    /// Finalise the options used for every module reachable from `entry`.
    ///
    /// Called at most once per delta calculator, before its first traversal.
    async fn customize_options(
        &self,
        _entry: &Path,
        base: TransformOptions,
    ) -> Result<TransformOptions> {
        Ok(base)
    }
}
