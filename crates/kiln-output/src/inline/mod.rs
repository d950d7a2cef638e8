//! Inline-reference id embedding.
//!
//! The transform stage emits `depMap[N]` wherever a module needs the id of its
//! N-th dependency. This embedder replaces those references with the literal
//! ids, either by splicing text ([`fast`]) when a reserved placeholder name is
//! configured, or by rewriting the AST ([`ast`]) otherwise. In both cases the
//! module's own id is then appended to the wrapper call.

mod ast;
mod fast;

use crate::embed::IdEmbedder;
use crate::error::{OutputError, Result};
use crate::ids::ModuleIdAllocator;
use crate::module::{Embedded, OutputModule};
use crate::source_map::merge_source_maps;
use crate::wrapper::{add_params_to_define_call, allocate_ids};

/// Embeds dependency ids in place of dependency-map references.
#[derive(Debug, Clone, Default)]
pub struct InlineIdEmbedder {
    /// Reserved placeholder name; `None` selects the AST rewrite.
    pub reserved_name: Option<String>,
    /// Tolerate modules with dependencies whose code never mentions
    /// `reserved_name`. Strict by default.
    pub ignore_missing_dependency_map_reference: bool,
    /// Prefix of the define call, used to find the factory on the AST path.
    pub global_prefix: String,
}

impl InlineIdEmbedder {
    /// Replace references without appending the module's own id.
    fn inline(&self, module: &OutputModule<'_>, dependency_ids: &[u32]) -> Result<Embedded> {
        let unchanged = || Embedded {
            code: module.code.to_string(),
            map: module.map.cloned(),
        };

        if dependency_ids.is_empty() {
            return Ok(unchanged());
        }

        if let Some(reserved_name) = &self.reserved_name {
            if !module.code.contains(reserved_name.as_str()) {
                if self.ignore_missing_dependency_map_reference {
                    return Ok(unchanged());
                }
                return Err(OutputError::MissingDependencyMapReference {
                    path: module.path.to_path_buf(),
                    reserved_name: reserved_name.clone(),
                });
            }

            let code = fast::inline_ids(module.path, module.code, reserved_name, dependency_ids)?;
            return Ok(Embedded {
                code,
                map: module.map.cloned(),
            });
        }

        let rewritten = ast::inline_ids(module.path, module.code, &self.global_prefix, dependency_ids)?;
        // No generated map means the code came back untouched.
        let map = match (module.map, rewritten.map.as_ref()) {
            (Some(original), Some(generated)) => Some(merge_source_maps(original, generated)?),
            (original, None) => original.cloned(),
            (None, Some(_)) => None,
        };
        Ok(Embedded {
            code: rewritten.code,
            map,
        })
    }
}

impl IdEmbedder for InlineIdEmbedder {
    fn embed(
        &self,
        module: &OutputModule<'_>,
        ids: &mut dyn ModuleIdAllocator,
    ) -> Result<Embedded> {
        let (own, dependency_ids) = allocate_ids(module, ids);
        let inlined = self.inline(module, &dependency_ids)?;

        Ok(Embedded {
            code: add_params_to_define_call(&inlined.code, &[own.into()]),
            map: inlined.map,
        })
    }
}
