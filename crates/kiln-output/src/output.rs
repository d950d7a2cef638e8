//! Per-module code and map.

use kiln_graph::ModuleType;

use crate::embed::IdEmbedder;
use crate::error::Result;
use crate::ids::ModuleIdAllocator;
use crate::module::{Embedded, OutputModule};
use crate::source_map::attach_function_map;

/// Produce the final code and source map for one module.
///
/// Scripts are passed through. Modules go through `embedder`. Afterwards any
/// map with a `sources` list gets the module's function map attached.
pub fn module_code_and_map(
    module: &OutputModule<'_>,
    ids: &mut dyn ModuleIdAllocator,
    embedder: &dyn IdEmbedder,
) -> Result<Embedded> {
    let mut embedded = match module.module_type {
        ModuleType::Script => Embedded {
            code: module.code.to_string(),
            map: module.map.cloned(),
        },
        ModuleType::Module => embedder.embed(module, ids)?,
    };

    if let Some(map) = embedded.map.as_mut() {
        attach_function_map(map, module.function_map);
    }

    Ok(embedded)
}
