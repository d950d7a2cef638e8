//! Output stage over graphs built by the traversal engine.

use std::path::{Path, PathBuf};

use kiln_graph::test_utils::TestRuntime;
use kiln_graph::{Graph, ModuleType, RawSourceMap, TransformOptions, TraversalContext};
use kiln_output::{
    IdEmbedder, IdEmbedding, InlineIdEmbedder, ModuleIdTable, OutputError, OutputModule,
    OutputOptions, WrapperCallEmbedder, append_scripts, module_code_and_map,
};
use rustc_hash::FxHashMap;

async fn build(runtime: &TestRuntime, entry: &str) -> Graph {
    let mut graph = Graph::new(entry);
    let options = TransformOptions::default();
    let ctx = TraversalContext::new(runtime, runtime, &options);
    graph.initial_traverse(&ctx).await.unwrap();
    graph
}

fn three_dependencies() -> TestRuntime {
    TestRuntime::new()
        .with_file(
            "/app/index.js",
            "var a = require('./a'), b = require('./b'), c = require('./c');",
        )
        .with_file("/app/a.js", "")
        .with_file("/app/b.js", "")
        .with_file("/app/c.js", "")
}

#[tokio::test]
async fn test_fast_path_inlines_fixed_ids_without_moving_code() {
    let runtime = three_dependencies();
    let graph = build(&runtime, "/app/index.js").await;
    let edge = graph.edge(Path::new("/app/index.js")).unwrap();

    let fixed: FxHashMap<PathBuf, u32> = [
        ("/app/index.js", 1),
        ("/app/a.js", 3),
        ("/app/b.js", 27),
        ("/app/c.js", 104),
    ]
    .into_iter()
    .map(|(p, id)| (PathBuf::from(p), id))
    .collect();
    let mut ids = |path: &Path| fixed[path];

    let map = RawSourceMap::new(vec!["index.js".into()], vec![], "AAAA");
    let module = OutputModule::from_edge(edge).with_map(&map);
    let embedder = InlineIdEmbedder {
        reserved_name: Some("_dependencyMap".into()),
        ..InlineIdEmbedder::default()
    };
    let embedded = embedder.embed(&module, &mut ids).unwrap();

    let pad = |id: &str| format!("{id:<17}");
    let expected_body = edge
        .output
        .code
        .replacen("_dependencyMap[0]", &pad("3"), 1)
        .replacen("_dependencyMap[1]", &pad("27"), 1)
        .replacen("_dependencyMap[2]", &pad("104"), 1);
    let expected = kiln_output::add_params_to_define_call(&expected_body, &[1.into()]);

    assert_eq!(embedded.code, expected);
    assert_eq!(expected_body.len(), edge.output.code.len());
    assert_eq!(embedded.map, Some(map));
}

#[tokio::test]
async fn test_fast_path_overflow_emits_nothing() {
    let runtime = three_dependencies();
    let graph = build(&runtime, "/app/index.js").await;
    let edge = graph.edge(Path::new("/app/index.js")).unwrap();

    let mut ids = |path: &Path| {
        if path == Path::new("/app/a.js") {
            123_456
        } else {
            0
        }
    };
    let module = OutputModule::new(edge.path(), "__d(function(g, r, m, e, d) { r(d[0]); });")
        .with_dependencies(vec![Path::new("/app/a.js")]);
    let embedder = InlineIdEmbedder {
        reserved_name: Some("d".into()),
        ..InlineIdEmbedder::default()
    };

    let err = embedder.embed(&module, &mut ids).unwrap_err();
    match err {
        OutputError::IdOverflow { path, additional } => {
            assert_eq!(path, Path::new("/app/index.js"));
            // "123456" is six characters wide, "d[0]" is four.
            assert_eq!(additional, 2);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_every_strategy_gives_entry_the_lowest_id() {
    let runtime = three_dependencies();
    let graph = build(&runtime, "/app/index.js").await;

    let strategies = [
        IdEmbedding::WrapperCall,
        IdEmbedding::Inline {
            reserved_name: Some("_dependencyMap".into()),
            ignore_missing_dependency_map_reference: false,
        },
        IdEmbedding::Inline {
            reserved_name: None,
            ignore_missing_dependency_map_reference: false,
        },
    ];

    for strategy in strategies {
        let embedder = strategy.embedder("");
        let mut ids = ModuleIdTable::new();
        for (_, edge) in graph.edges() {
            let module = OutputModule::from_edge(edge);
            module_code_and_map(&module, &mut ids, embedder.as_ref()).unwrap();
        }
        assert_eq!(ids.get(Path::new("/app/index.js")), Some(0), "{strategy:?}");
        assert_eq!(ids.len(), 4);
    }
}

#[tokio::test]
async fn test_wrapper_call_over_graph_edges() {
    let runtime = TestRuntime::new()
        .with_file("/app/index.js", "require('./a');")
        .with_file("/app/a.js", "// @script\nvar polyfill = true;");
    let graph = build(&runtime, "/app/index.js").await;

    let mut ids = ModuleIdTable::new();
    let index = OutputModule::from_edge(graph.edge(Path::new("/app/index.js")).unwrap());
    let out = module_code_and_map(&index, &mut ids, &WrapperCallEmbedder).unwrap();
    assert!(out.code.ends_with("},0,[1]);"), "{}", out.code);

    let script_edge = graph.edge(Path::new("/app/a.js")).unwrap();
    assert_eq!(script_edge.output.module_type, ModuleType::Script);
    let script = OutputModule::from_edge(script_edge);
    let out = module_code_and_map(&script, &mut ids, &WrapperCallEmbedder).unwrap();
    assert_eq!(out.code, "// @script\nvar polyfill = true;");
}

#[tokio::test]
async fn test_append_scripts_run_prelude_then_entry() {
    let runtime = TestRuntime::new()
        .with_file("/app/index.js", "require('./setup');")
        .with_file("/app/setup.js", "");
    let graph = build(&runtime, "/app/index.js").await;

    let options = OutputOptions {
        global_prefix: "__kiln".into(),
        run_before_main_module: vec![
            PathBuf::from("/app/setup.js"),
            PathBuf::from("/app/not-in-graph.js"),
        ],
        source_map_url: Some("index.map".into()),
        ..OutputOptions::default()
    };
    let mut ids = ModuleIdTable::new();
    ids.allocate(Path::new("/app/index.js"));

    let scripts = append_scripts(Path::new("/app/index.js"), &graph, &mut ids, &options);
    let codes: Vec<&str> = scripts.iter().map(|s| s.code.as_str()).collect();
    assert_eq!(
        codes,
        vec!["__kiln__r(1);", "__kiln__r(0);", "//# sourceMappingURL=index.map"]
    );
    assert_eq!(scripts[0].path, "require-/app/setup.js");
    assert_eq!(scripts[2].path, "source-map");

    let silent = OutputOptions {
        run_module: false,
        ..OutputOptions::default()
    };
    assert!(append_scripts(Path::new("/app/index.js"), &graph, &mut ids, &silent).is_empty());
}
