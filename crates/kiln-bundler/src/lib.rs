#![cfg_attr(docsrs, feature(doc_cfg))]

//! # kiln-bundler
//!
//! Incremental bundling on top of [`kiln_graph`] and [`kiln_output`].
//!
//! A [`DeltaCalculator`] keeps one dependency graph up to date with file
//! changes reported by a [`ChangeSource`], and answers "what changed since
//! last time" with a [`DeltaResult`]. A [`DeltaBundler`] manages many such
//! graphs side by side, and per-client [`Session`]s that turn deltas into
//! module code with stable numeric ids.
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use kiln_bundler::{BundlerConfig, BundlerRuntime, DeltaBundler, DeltaOptions, WatchEvent};
//! # use kiln_graph::{Resolver, Transformer};
//!
//! # async fn example<R: Resolver + Transformer + 'static>(host: Arc<R>) -> kiln_bundler::Result<()> {
//! let (runtime, hub) = BundlerRuntime::with_hub(host);
//! let bundler = DeltaBundler::new(runtime);
//!
//! let config = BundlerConfig::new(DeltaOptions::new("/app/index.js"));
//! let session = bundler.session("client-1", config).await?;
//!
//! let first = session.next_delta(false).await?;
//! assert!(first.reset);
//!
//! hub.emit(&[WatchEvent::modify("/app/index.js")]);
//! let update = session.next_delta(false).await?;
//! println!("{} modules changed", update.modified.len());
//!
//! bundler.end().await;
//! # Ok(()) }
//! ```
//!
//! ## Logging
//!
//! All crates emit `tracing` events. Enable the `logging` feature for
//! [`logging::init_logging`] if the host has no subscriber of its own.

pub mod bundler;
pub mod calculator;
pub mod changes;
pub mod config;
pub mod error;
pub mod listeners;
pub mod runtime;
pub mod session;
pub mod watcher;

#[cfg(feature = "logging")]
#[cfg_attr(docsrs, doc(cfg(feature = "logging")))]
pub mod logging;

pub use bundler::{DeltaBundler, GraphHandle};
pub use calculator::{DeltaCalculator, DeltaRequest, DeltaResult};
pub use changes::PendingChanges;
pub use config::{BundlerConfig, CONFIG_FILE_NAME, DeltaOptions};
pub use error::{ConfigError, DeltaError, Result};
pub use listeners::ListenerId;
pub use runtime::BundlerRuntime;
pub use session::{SerializedDelta, SerializedModule, Session};
pub use watcher::{ChangeHub, ChangeSource, SubscriptionId, WatchEvent, WatchEventKind};

#[cfg(feature = "watch")]
#[cfg_attr(docsrs, doc(cfg(feature = "watch")))]
pub use watcher::NotifyWatcher;

// Foundation types most hosts need alongside the bundler.
pub use kiln_graph::{
    DependencyEdge, EdgeMap, Graph, GraphError, PathSet, Resolver, TransformOptions, Transformer,
};
pub use kiln_output::{IdEmbedding, OutputError, OutputOptions};
