//! Error types for kiln-bundler.
//!
//! Graph and output errors are wrapped unchanged so callers can match on the
//! underlying cause. [`DeltaError::NotFound`] means a caller passed a handle
//! that was never issued or has already been ended.

use std::path::PathBuf;

use kiln_graph::GraphError;
use kiln_output::OutputError;
use thiserror::Error;

use crate::bundler::GraphHandle;

/// Errors returned by delta calculation and the session manager.
#[derive(Debug, Error, miette::Diagnostic)]
pub enum DeltaError {
    /// Traversal failed while resolving or transforming a module.
    #[error(transparent)]
    #[diagnostic(code(kiln::delta::graph))]
    Graph(#[from] GraphError),

    /// The output stage could not emit a module.
    #[error(transparent)]
    #[diagnostic(transparent)]
    Output(#[from] OutputError),

    /// The handle does not name a live graph.
    #[error("Graph not found: {0}")]
    #[diagnostic(
        code(kiln::delta::not_found),
        help("The graph was never built or has already been ended")
    )]
    NotFound(GraphHandle),

    /// The client's session was ended before its creation finished.
    #[error("Session for client '{0}' was ended while it was being created")]
    #[diagnostic(code(kiln::delta::session_ended))]
    SessionEnded(String),

    /// Configuration could not be loaded.
    #[error(transparent)]
    #[diagnostic(code(kiln::delta::config))]
    Config(#[from] ConfigError),
}

/// Configuration loading and validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An explicitly requested config file does not exist.
    #[error("Config file not found: {}\n\nHint: Create a kiln.config.json file or pass its path", .0.display())]
    NotFound(PathBuf),

    /// Missing required configuration field
    #[error("Missing required field: {field}\n\nHint: {hint}")]
    MissingField { field: String, hint: String },

    /// Invalid value for a configuration option
    #[error("Invalid value for '{field}': {value}\n\nHint: {hint}")]
    InvalidValue {
        field: String,
        value: String,
        hint: String,
    },
}

/// Result type alias for bundler operations.
pub type Result<T> = std::result::Result<T, DeltaError>;
