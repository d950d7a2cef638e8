//! Loading bundler configuration from an explicit file.

use std::path::PathBuf;

use kiln_bundler::{BundlerConfig, ConfigError, IdEmbedding};
use tempfile::TempDir;

#[test]
fn explicit_config_file_is_loaded() {
    let dir = TempDir::new().expect("temp dir");
    let path = dir.path().join("kiln.config.json");
    std::fs::write(
        &path,
        r#"{
            "delta": {
                "entryFile": "src/index.js",
                "transform": { "projectRoot": "/work/app", "minify": true }
            },
            "output": {
                "idEmbedding": { "strategy": "inline", "reservedName": "_$$_IMPORT" },
                "runModuleStatement": "require({id});"
            }
        }"#,
    )
    .expect("write config");

    let config = BundlerConfig::load(Some(&path)).expect("config should load");
    assert_eq!(
        config.delta.entry_path(),
        PathBuf::from("/work/app/src/index.js")
    );
    assert!(config.delta.transform.minify);
    assert_eq!(
        config.output.id_embedding,
        IdEmbedding::Inline {
            reserved_name: Some("_$$_IMPORT".to_string()),
            ignore_missing_dependency_map_reference: false,
        }
    );
    assert_eq!(config.output.run_module_statement(7), "require(7);");
    assert!(config.output.run_module);
}

#[test]
fn missing_explicit_file_is_an_error() {
    let dir = TempDir::new().expect("temp dir");
    let path = dir.path().join("nope.json");

    let err = BundlerConfig::load(Some(&path)).unwrap_err();
    assert!(matches!(err, ConfigError::NotFound(p) if p == path));
}

#[test]
fn run_statement_without_placeholder_is_rejected() {
    let dir = TempDir::new().expect("temp dir");
    let path = dir.path().join("kiln.config.json");
    std::fs::write(
        &path,
        r#"{ "delta": { "entryFile": "/app/index.js" }, "output": { "runModuleStatement": "start();" } }"#,
    )
    .expect("write config");

    let err = BundlerConfig::load(Some(&path)).unwrap_err();
    match err {
        ConfigError::InvalidValue { field, .. } => assert_eq!(field, "output.runModuleStatement"),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn malformed_json_is_reported() {
    let dir = TempDir::new().expect("temp dir");
    let path = dir.path().join("kiln.config.json");
    std::fs::write(&path, "{ not json").expect("write config");

    let err = BundlerConfig::load(Some(&path)).unwrap_err();
    assert!(matches!(err, ConfigError::InvalidValue { .. }), "{err}");
}
