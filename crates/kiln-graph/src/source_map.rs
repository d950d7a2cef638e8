//! Serializable source map model carried through the graph.
//!
//! Transformers hand back version-3 source maps. We keep them in their JSON
//! shape so extension fields such as `x_facebook_sources` survive untouched;
//! the output stage converts to `oxc_sourcemap` only when it needs to merge.

use serde::{Deserialize, Serialize};

/// A version-3 source map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawSourceMap {
    pub version: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    #[serde(default)]
    pub sources: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sources_content: Option<Vec<Option<String>>>,
    #[serde(default)]
    pub names: Vec<String>,
    pub mappings: String,
    /// Per-source function maps, one slot per entry in `sources`.
    #[serde(
        default,
        rename = "x_facebook_sources",
        skip_serializing_if = "Option::is_none"
    )]
    pub x_facebook_sources: Option<Vec<Option<Vec<FunctionMap>>>>,
}

impl RawSourceMap {
    pub fn new(sources: Vec<String>, names: Vec<String>, mappings: impl Into<String>) -> Self {
        Self {
            version: 3,
            file: None,
            sources,
            sources_content: None,
            names,
            mappings: mappings.into(),
            x_facebook_sources: None,
        }
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// Compact mapping from generated positions to enclosing function names.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FunctionMap {
    pub names: Vec<String>,
    pub mappings: String,
}
