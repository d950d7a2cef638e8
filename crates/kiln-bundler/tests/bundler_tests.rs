//! Graph registry of the delta bundler.

mod helpers;

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use helpers::*;
use kiln_bundler::{DeltaError, DeltaOptions, GraphError, WatchEvent};

#[tokio::test]
async fn build_graph_registers_a_fully_built_graph() {
    let runtime = diamond();
    let (bundler, _hub) = bundler(&runtime);

    let handle = bundler.build_graph(DeltaOptions::new(ENTRY)).await.unwrap();
    assert_eq!(bundler.graph_count(), 1);
    assert_eq!(runtime.transform_count(), 4);

    let calculator = bundler.calculator(handle).unwrap();
    assert_eq!(calculator.graph().await.len(), 4);

    // The build already consumed the first delta.
    let delta = bundler.get_delta(handle, false).await.unwrap();
    assert!(delta.is_empty());
}

#[tokio::test]
async fn failed_build_registers_nothing() {
    let runtime = diamond();
    let (bundler, hub) = bundler(&runtime);

    let err = bundler
        .build_graph(DeltaOptions::new("/app/missing.js"))
        .await
        .unwrap_err();
    assert!(
        matches!(err, DeltaError::Graph(GraphError::Transform { .. })),
        "{err}"
    );
    assert_eq!(bundler.graph_count(), 0);
    assert_eq!(hub.subscriber_count(), 0);
}

#[tokio::test]
async fn ended_handles_are_not_found() {
    let runtime = diamond();
    let (bundler, _hub) = bundler(&runtime);
    let handle = bundler.build_graph(DeltaOptions::new(ENTRY)).await.unwrap();

    bundler.end_graph(handle).await.unwrap();

    assert!(matches!(
        bundler.get_delta(handle, false).await,
        Err(DeltaError::NotFound(h)) if h == handle
    ));
    assert!(matches!(
        bundler.listen(handle, || {}),
        Err(DeltaError::NotFound(_))
    ));
    assert!(matches!(
        bundler.end_graph(handle).await,
        Err(DeltaError::NotFound(_))
    ));
    let message = bundler.calculator(handle).unwrap_err().to_string();
    assert!(message.contains(&handle.to_string()), "{message}");
}

#[tokio::test]
async fn graphs_track_changes_independently() {
    let runtime = diamond();
    let (bundler, hub) = bundler(&runtime);
    let whole = bundler.build_graph(DeltaOptions::new(ENTRY)).await.unwrap();
    let leaf = bundler
        .build_graph(DeltaOptions::new("/app/c.js"))
        .await
        .unwrap();
    assert_ne!(whole, leaf);

    runtime.write("/app/b.js", "require('./c');\n// edited");
    hub.emit(&[WatchEvent::modify("/app/b.js")]);

    let whole_delta = bundler.get_delta(whole, false).await.unwrap();
    let leaf_delta = bundler.get_delta(leaf, false).await.unwrap();
    assert_eq!(keys(&whole_delta.modified), vec!["/app/b.js"]);
    assert!(leaf_delta.is_empty());
}

#[tokio::test]
async fn listen_is_scoped_to_one_graph() {
    let runtime = diamond();
    let (bundler, hub) = bundler(&runtime);
    let first = bundler.build_graph(DeltaOptions::new(ENTRY)).await.unwrap();
    let second = bundler.build_graph(DeltaOptions::new(ENTRY)).await.unwrap();

    let hits = Arc::new(AtomicUsize::new(0));
    {
        let hits = Arc::clone(&hits);
        bundler
            .listen(first, move || {
                hits.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap();
    }

    hub.emit(&[WatchEvent::modify("/app/a.js")]);
    assert_eq!(hits.load(Ordering::SeqCst), 1);

    bundler.end_graph(first).await.unwrap();
    hub.emit(&[WatchEvent::modify("/app/a.js")]);
    assert_eq!(hits.load(Ordering::SeqCst), 1);

    let delta = bundler.get_delta(second, false).await.unwrap();
    assert_eq!(keys(&delta.modified), vec!["/app/a.js"]);
}

#[tokio::test]
async fn end_tears_everything_down() {
    let runtime = diamond();
    let (bundler, hub) = bundler(&runtime);
    let handle = bundler.build_graph(DeltaOptions::new(ENTRY)).await.unwrap();
    bundler
        .session("web", kiln_bundler::BundlerConfig::new(DeltaOptions::new(ENTRY)))
        .await
        .unwrap();
    assert_eq!(hub.subscriber_count(), 2);

    bundler.end().await;

    assert_eq!(bundler.graph_count(), 0);
    assert_eq!(bundler.session_count(), 0);
    assert_eq!(hub.subscriber_count(), 0);
    assert!(matches!(
        bundler.get_delta(handle, false).await,
        Err(DeltaError::NotFound(_))
    ));
}
