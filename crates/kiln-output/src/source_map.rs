//! Source map helpers for module output.

use kiln_graph::{FunctionMap, RawSourceMap};
use oxc_sourcemap::{SourceMap, SourceMapBuilder};
use rustc_hash::FxHashMap;

use crate::error::{OutputError, Result};

pub(crate) fn to_oxc(map: &RawSourceMap) -> Result<SourceMap> {
    SourceMap::from_json_string(&map.to_json()?)
        .map_err(|err| OutputError::SourceMap(err.to_string()))
}

pub(crate) fn from_oxc(map: &SourceMap) -> Result<RawSourceMap> {
    Ok(RawSourceMap::from_json(&map.to_json_string())?)
}

/// Compose `generated` (rewritten code -> module code) with `original`
/// (module code -> original sources).
///
/// Every generated token is traced back through `original`; tokens that do
/// not land on a mapped position are dropped.
pub fn merge_source_maps(original: &RawSourceMap, generated: &SourceMap) -> Result<RawSourceMap> {
    let original = to_oxc(original)?;
    let lookup = original.generate_lookup_table();

    let mut builder = SourceMapBuilder::default();
    let mut sources: FxHashMap<u32, u32> = FxHashMap::default();
    let mut names: FxHashMap<u32, u32> = FxHashMap::default();

    for token in generated.get_tokens() {
        let Some(origin) = original.lookup_token(&lookup, token.get_src_line(), token.get_src_col())
        else {
            continue;
        };
        let Some(source_id) = origin.get_source_id() else {
            continue;
        };

        let source_id = *sources.entry(source_id).or_insert_with(|| {
            let source = original
                .get_source(source_id)
                .map(|s| s.to_string())
                .unwrap_or_default();
            let content = original
                .get_source_content(source_id)
                .map(|c| c.to_string())
                .unwrap_or_default();
            builder.add_source_and_content(&source, &content)
        });

        let name_id = origin.get_name_id().and_then(|name_id| {
            if let Some(id) = names.get(&name_id) {
                return Some(*id);
            }
            let name = original.get_name(name_id)?.to_string();
            let id = builder.add_name(&name);
            names.insert(name_id, id);
            Some(id)
        });

        builder.add_token(
            token.get_dst_line(),
            token.get_dst_col(),
            origin.get_src_line(),
            origin.get_src_col(),
            Some(source_id),
            name_id,
        );
    }

    let mut merged = from_oxc(&builder.into_sourcemap())?;
    merged.file = original.get_file().map(|f| f.to_string());
    Ok(merged)
}

/// Attach the per-source function map for symbolication tooling.
///
/// A map with at least one source gets `[[function_map]]`; a map without
/// sources gets an empty list.
pub fn attach_function_map(map: &mut RawSourceMap, function_map: Option<&FunctionMap>) {
    let sources = if map.sources.is_empty() {
        Vec::new()
    } else {
        vec![function_map.map(|f| vec![f.clone()])]
    };
    map.x_facebook_sources = Some(sources);
}
