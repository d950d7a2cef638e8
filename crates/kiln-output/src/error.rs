//! Error types for module output

use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

/// Errors raised while embedding module ids.
///
/// All of these mean the transform stage and the output stage disagree about
/// the shape of the generated code. They stop the build; no partial code is
/// returned.
#[derive(Error, Debug, Clone, Diagnostic)]
pub enum OutputError {
    /// The module has dependencies but never mentions the reserved name
    #[error(
        "Module has dependencies but does not use the preconfigured dependency map name '{reserved_name}': {}",
        path.display()
    )]
    #[diagnostic(
        code(kiln::output::missing_dependency_map_reference),
        help("set `ignoreMissingDependencyMapReference` if this module is generated or mocked")
    )]
    MissingDependencyMapReference {
        path: PathBuf,
        reserved_name: String,
    },

    /// An id is wider than the placeholder it replaces
    #[error(
        "Module ID doesn't fit in available space in {}; add {additional} more characters to the reserved dependency map name",
        path.display()
    )]
    #[diagnostic(code(kiln::output::id_overflow))]
    IdOverflow { path: PathBuf, additional: usize },

    /// A placeholder refers past the end of the dependency list
    #[error(
        "Dependency index {index} out of range in {} (module has {len} dependencies)",
        path.display()
    )]
    #[diagnostic(code(kiln::output::dependency_index_out_of_range))]
    DependencyIndexOutOfRange {
        path: PathBuf,
        index: usize,
        len: usize,
    },

    /// Module code could not be parsed for rewriting
    #[error("Failed to parse {}: {reason}", path.display())]
    #[diagnostic(code(kiln::output::parse_failed))]
    Parse { path: PathBuf, reason: String },

    /// Source map could not be read or merged
    #[error("Source map error: {0}")]
    #[diagnostic(code(kiln::output::source_map))]
    SourceMap(String),
}

impl OutputError {
    /// Create a Parse error
    pub fn parse(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::Parse {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

impl From<serde_json::Error> for OutputError {
    fn from(err: serde_json::Error) -> Self {
        Self::SourceMap(err.to_string())
    }
}

/// Result type for output operations
pub type Result<T> = std::result::Result<T, OutputError>;
