use std::path::{Path, PathBuf};

use indexmap::{IndexMap, IndexSet};
use rustc_hash::FxBuildHasher;
use serde::{Deserialize, Serialize};

use super::source_map::{FunctionMap, RawSourceMap};

/// How the output stage should treat a module's code.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModuleType {
    /// Wrapped in a define call; receives a numeric id.
    #[default]
    Module,
    /// Emitted verbatim (polyfills, prelude code).
    Script,
}

/// A raw dependency as reported by the transformer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Dependency {
    /// The specifier as written in source, e.g. `./utils`.
    pub specifier: String,
    /// Whether the dependency is loaded lazily (`import()`).
    #[serde(default)]
    pub is_async: bool,
}

impl Dependency {
    pub fn new(specifier: impl Into<String>) -> Self {
        Self {
            specifier: specifier.into(),
            is_async: false,
        }
    }

    pub fn lazy(specifier: impl Into<String>) -> Self {
        Self {
            specifier: specifier.into(),
            is_async: true,
        }
    }
}

/// Result of transforming a single file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransformOutput {
    pub code: String,
    pub map: Option<RawSourceMap>,
    /// Dependencies in the order the code references them. The N-th entry is
    /// what the code's dependency-map placeholder index N stands for.
    pub dependencies: Vec<Dependency>,
    pub module_type: ModuleType,
    /// Function-name map used by symbolication tooling.
    pub function_map: Option<FunctionMap>,
}

impl TransformOutput {
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            ..Self::default()
        }
    }

    pub fn with_dependencies(mut self, dependencies: Vec<Dependency>) -> Self {
        self.dependencies = dependencies;
        self
    }

    pub fn with_map(mut self, map: RawSourceMap) -> Self {
        self.map = Some(map);
        self
    }

    pub fn with_module_type(mut self, module_type: ModuleType) -> Self {
        self.module_type = module_type;
        self
    }

    pub fn with_function_map(mut self, function_map: FunctionMap) -> Self {
        self.function_map = Some(function_map);
        self
    }
}

/// One node of the dependency graph.
///
/// Edges are stored behind `Arc` in the graph, so handing snapshots to delta
/// consumers is cheap; the graph copies on write when it updates an edge that
/// is still shared.
#[derive(Debug, Clone, PartialEq)]
pub struct DependencyEdge {
    pub path: PathBuf,
    /// Specifier -> resolved absolute path, in first-seen order.
    pub dependencies: IndexMap<String, PathBuf, FxBuildHasher>,
    /// Modules that depend on this one.
    pub inverse_dependencies: IndexSet<PathBuf, FxBuildHasher>,
    pub output: TransformOutput,
}

impl DependencyEdge {
    /// Create an edge that has not been transformed yet.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            dependencies: IndexMap::default(),
            inverse_dependencies: IndexSet::default(),
            output: TransformOutput::default(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Resolved dependency paths in the order of the transformer's raw
    /// dependency list (one entry per raw dependency, duplicates included).
    ///
    /// Specifiers without a resolution are skipped.
    pub fn ordered_dependency_paths(&self) -> Vec<&Path> {
        self.output
            .dependencies
            .iter()
            .filter_map(|dep| self.dependencies.get(&dep.specifier))
            .map(PathBuf::as_path)
            .collect()
    }

    /// Iterate over distinct resolved dependency paths.
    pub fn dependency_paths(&self) -> impl Iterator<Item = &PathBuf> {
        self.dependencies.values()
    }

    pub fn is_module(&self) -> bool {
        self.output.module_type == ModuleType::Module
    }
}
