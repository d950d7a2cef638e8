//! Id embedding strategies and output configuration.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::ids::ModuleIdAllocator;
use crate::inline::InlineIdEmbedder;
use crate::module::{Embedded, OutputModule};
use crate::wrapper::WrapperCallEmbedder;

/// Writes a module's own id and its dependency ids into its code.
///
/// Only called for [`ModuleType::Module`](kiln_graph::ModuleType::Module)
/// modules; scripts are emitted verbatim.
pub trait IdEmbedder: Send + Sync + std::fmt::Debug {
    fn embed(
        &self,
        module: &OutputModule<'_>,
        ids: &mut dyn ModuleIdAllocator,
    ) -> Result<Embedded>;
}

/// Which [`IdEmbedder`] to use.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "camelCase")]
pub enum IdEmbedding {
    /// Append ids as extra wrapper-call arguments.
    #[default]
    WrapperCall,
    /// Replace dependency-map references with literal ids.
    #[serde(rename_all = "camelCase")]
    Inline {
        /// Reserved placeholder name. Enables the text-splice fast path.
        #[serde(default)]
        reserved_name: Option<String>,
        /// Accept modules with dependencies that never mention the
        /// reserved name.
        #[serde(default)]
        ignore_missing_dependency_map_reference: bool,
    },
}

impl IdEmbedding {
    /// Build the embedder for this strategy.
    pub fn embedder(&self, global_prefix: &str) -> Box<dyn IdEmbedder> {
        match self {
            Self::WrapperCall => Box::new(WrapperCallEmbedder),
            Self::Inline {
                reserved_name,
                ignore_missing_dependency_map_reference,
            } => Box::new(InlineIdEmbedder {
                reserved_name: reserved_name.clone(),
                ignore_missing_dependency_map_reference: *ignore_missing_dependency_map_reference,
                global_prefix: global_prefix.to_string(),
            }),
        }
    }
}

/// Output stage configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OutputOptions {
    pub id_embedding: IdEmbedding,
    /// Prefix for the runtime globals (`__d`, `__r`).
    pub global_prefix: String,
    /// Emit a statement that runs the entry module.
    pub run_module: bool,
    /// Modules to run before the entry, if they are part of the graph.
    pub run_before_main_module: Vec<std::path::PathBuf>,
    /// Template for run statements; `{id}` is replaced by the module id.
    /// Defaults to `{global_prefix}__r({id});`.
    pub run_module_statement: Option<String>,
    /// Appended as a `//# sourceMappingURL=` comment when set.
    pub source_map_url: Option<String>,
}

impl Default for OutputOptions {
    fn default() -> Self {
        Self {
            id_embedding: IdEmbedding::default(),
            global_prefix: String::new(),
            run_module: true,
            run_before_main_module: Vec::new(),
            run_module_statement: None,
            source_map_url: None,
        }
    }
}

impl OutputOptions {
    pub fn embedder(&self) -> Box<dyn IdEmbedder> {
        self.id_embedding.embedder(&self.global_prefix)
    }

    /// Statement that runs module `id`.
    pub fn run_module_statement(&self, id: u32) -> String {
        match &self.run_module_statement {
            Some(template) => template.replace("{id}", &id.to_string()),
            None => format!("{}__r({id});", self.global_prefix),
        }
    }
}
