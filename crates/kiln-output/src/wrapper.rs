//! Wrapper-call id embedding.
//!
//! Transformed modules look like
//!
//! ```text
//! __d(function (global, require, module, exports, _dependencyMap) {
//!   ...
//! });
//! ```
//!
//! and the runtime expects the module id, plus an array with the ids of its
//! dependencies, as trailing arguments of that call.

use crate::embed::IdEmbedder;
use crate::error::Result;
use crate::ids::ModuleIdAllocator;
use crate::module::{Embedded, OutputModule};

/// Insert `params` as extra arguments before the last `)` in `code`.
///
/// Each param is a JSON value (a number or an array of numbers here). Code
/// without any `)` gets the params appended at the end.
pub fn add_params_to_define_call(code: &str, params: &[serde_json::Value]) -> String {
    let index = code.rfind(')').unwrap_or(code.len());
    let mut out = String::with_capacity(code.len() + params.len() * 8);
    out.push_str(&code[..index]);
    for param in params {
        out.push(',');
        out.push_str(&param.to_string());
    }
    out.push_str(&code[index..]);
    out
}

/// Allocate the module's own id first, then one per dependency.
///
/// Allocating the module before its dependencies gives it the lower id,
/// which matches its position in the bundle.
pub(crate) fn allocate_ids(
    module: &OutputModule<'_>,
    ids: &mut dyn ModuleIdAllocator,
) -> (u32, Vec<u32>) {
    let own = ids.allocate(module.path);
    let dependencies = module
        .dependencies
        .iter()
        .map(|path| ids.allocate(path))
        .collect();
    (own, dependencies)
}

/// Appends ids to the wrapper call. Leaves the source map alone.
#[derive(Debug, Clone, Copy, Default)]
pub struct WrapperCallEmbedder;

impl IdEmbedder for WrapperCallEmbedder {
    fn embed(
        &self,
        module: &OutputModule<'_>,
        ids: &mut dyn ModuleIdAllocator,
    ) -> Result<Embedded> {
        let (own, dependencies) = allocate_ids(module, ids);

        let mut params = vec![serde_json::Value::from(own)];
        if !dependencies.is_empty() {
            params.push(serde_json::Value::from(dependencies));
        }

        Ok(Embedded {
            code: add_params_to_define_call(module.code, &params),
            map: module.map.cloned(),
        })
    }
}
