//! Borrowed view of a module as the output stage sees it.

use std::path::Path;

use kiln_graph::{DependencyEdge, FunctionMap, ModuleType, RawSourceMap};

/// Everything needed to emit one module.
#[derive(Debug, Clone)]
pub struct OutputModule<'a> {
    pub path: &'a Path,
    pub code: &'a str,
    pub map: Option<&'a RawSourceMap>,
    /// Resolved dependency paths, indexed the same way as the code's
    /// dependency-map placeholders.
    pub dependencies: Vec<&'a Path>,
    pub module_type: ModuleType,
    pub function_map: Option<&'a FunctionMap>,
}

impl<'a> OutputModule<'a> {
    pub fn new(path: &'a Path, code: &'a str) -> Self {
        Self {
            path,
            code,
            map: None,
            dependencies: Vec::new(),
            module_type: ModuleType::Module,
            function_map: None,
        }
    }

    pub fn from_edge(edge: &'a DependencyEdge) -> Self {
        Self {
            path: &edge.path,
            code: &edge.output.code,
            map: edge.output.map.as_ref(),
            dependencies: edge.ordered_dependency_paths(),
            module_type: edge.output.module_type,
            function_map: edge.output.function_map.as_ref(),
        }
    }

    pub fn with_dependencies(mut self, dependencies: Vec<&'a Path>) -> Self {
        self.dependencies = dependencies;
        self
    }

    pub fn with_map(mut self, map: &'a RawSourceMap) -> Self {
        self.map = Some(map);
        self
    }

    pub fn with_module_type(mut self, module_type: ModuleType) -> Self {
        self.module_type = module_type;
        self
    }

    pub fn with_function_map(mut self, function_map: &'a FunctionMap) -> Self {
        self.function_map = Some(function_map);
        self
    }
}

/// Final code and map for one module.
#[derive(Debug, Clone, PartialEq)]
pub struct Embedded {
    pub code: String,
    pub map: Option<RawSourceMap>,
}
