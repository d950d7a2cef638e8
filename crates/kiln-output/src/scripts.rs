//! Generated scripts that run modules.

use std::path::Path;

use kiln_graph::Graph;
use rustc_hash::FxHashSet;

use crate::embed::OutputOptions;
use crate::ids::ModuleIdAllocator;

/// A generated script with no backing file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VirtualScript {
    pub path: String,
    pub code: String,
}

/// Scripts appended after the modules of a bundle.
///
/// When `run_module` is set, one run statement per `run_before_main_module`
/// entry that is part of `graph`, then one for `entry`. A
/// `//# sourceMappingURL=` comment follows when a URL is configured.
pub fn append_scripts(
    entry: &Path,
    graph: &Graph,
    ids: &mut dyn ModuleIdAllocator,
    options: &OutputOptions,
) -> Vec<VirtualScript> {
    let mut scripts = Vec::new();

    if options.run_module {
        let paths = options
            .run_before_main_module
            .iter()
            .map(|p| p.as_path())
            .chain(std::iter::once(entry));
        for path in paths {
            if !graph.contains(path) {
                continue;
            }
            let id = ids.allocate(path);
            scripts.push(VirtualScript {
                path: format!("require-{}", path.display()),
                code: options.run_module_statement(id),
            });
        }
    }

    if let Some(url) = &options.source_map_url {
        scripts.push(VirtualScript {
            path: "source-map".to_string(),
            code: format!("//# sourceMappingURL={url}"),
        });
    }

    scripts
}

/// One virtual module per input that runs it.
pub fn require_calls_to<'p>(
    modules: impl IntoIterator<Item = &'p Path>,
    ids: &mut dyn ModuleIdAllocator,
    options: &OutputOptions,
) -> Vec<VirtualScript> {
    modules
        .into_iter()
        .map(|path| {
            let id = ids.allocate(path);
            VirtualScript {
                path: format!("/<generated>/require-{id}.js"),
                code: options.run_module_statement(id),
            }
        })
        .collect()
}

/// Split modules into those loaded at startup (`preloaded`) and the rest.
///
/// Relative order is kept on both sides.
pub fn partition<'p>(
    modules: impl IntoIterator<Item = &'p Path>,
    preloaded: &FxHashSet<&Path>,
) -> (Vec<&'p Path>, Vec<&'p Path>) {
    modules
        .into_iter()
        .partition(|path| preloaded.contains(path))
}
