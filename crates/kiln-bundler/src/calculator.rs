//! Incremental delta calculation for one graph.
//!
//! A [`DeltaCalculator`] owns a [`Graph`] and the set of file changes reported
//! since its last successful computation. [`DeltaCalculator::get_delta`] turns
//! those changes into a [`DeltaResult`]:
//!
//! ```text
//!   watch events ──▶ PendingChanges ──take──▶ traversal ──▶ DeltaResult
//!                          ▲                     │
//!                          └──── restore ◀── on error
//! ```
//!
//! Computations are single-flight: concurrent callers queue on a FIFO lock and
//! run one after another, each seeing the changes recorded since the previous
//! one finished.

use std::sync::{Arc, Weak};
use std::time::Instant;

use kiln_graph::{EdgeMap, Graph, PathSet, ProgressFn, TransformOptions, Traversal};
use parking_lot::Mutex;
use tokio::sync::{OnceCell, RwLock, RwLockReadGuard};

use crate::changes::PendingChanges;
use crate::config::DeltaOptions;
use crate::error::Result;
use crate::listeners::{ListenerId, Listeners, notify_all};
use crate::runtime::BundlerRuntime;
use crate::watcher::{SubscriptionId, WatchEvent};

/// Parameters of one [`DeltaCalculator::get_delta`] call.
#[derive(Clone, Default)]
pub struct DeltaRequest {
    /// Return the whole graph, in canonical order, instead of only the
    /// changes.
    pub reset: bool,
    /// Called with `(processed, total)` while modules are transformed.
    pub on_progress: Option<Arc<ProgressFn>>,
}

impl DeltaRequest {
    pub fn new(reset: bool) -> Self {
        Self {
            reset,
            on_progress: None,
        }
    }

    pub fn with_progress(mut self, on_progress: Arc<ProgressFn>) -> Self {
        self.on_progress = Some(on_progress);
        self
    }
}

impl std::fmt::Debug for DeltaRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeltaRequest")
            .field("reset", &self.reset)
            .field("on_progress", &self.on_progress.is_some())
            .finish()
    }
}

/// Outcome of one computation.
///
/// Edges are shared snapshots: later updates of the graph never change a
/// result that was already returned.
#[derive(Debug, Clone, Default)]
pub struct DeltaResult {
    /// Added or modified modules. For a reset, the whole graph.
    pub modified: EdgeMap,
    /// Modules no longer part of the graph. Always empty for a reset.
    pub deleted: PathSet,
    /// The client should drop everything it has and apply `modified`.
    pub reset: bool,
}

impl DeltaResult {
    pub fn is_empty(&self) -> bool {
        !self.reset && self.modified.is_empty() && self.deleted.is_empty()
    }

    fn full(graph: &Graph) -> Self {
        Self {
            modified: graph.dependencies().clone(),
            deleted: PathSet::default(),
            reset: true,
        }
    }
}

struct CalculatorInner {
    options: DeltaOptions,
    runtime: BundlerRuntime,
    graph: RwLock<Graph>,
    pending: Mutex<PendingChanges>,
    /// Held for the whole of a computation. tokio's mutex is fair, so waiters
    /// run in arrival order.
    build_lock: tokio::sync::Mutex<()>,
    transform_options: OnceCell<Arc<TransformOptions>>,
    listeners: Mutex<Listeners>,
    subscription: Mutex<Option<SubscriptionId>>,
}

impl CalculatorInner {
    fn handle_changes(&self, events: &[WatchEvent]) {
        {
            let mut pending = self.pending.lock();
            for event in events {
                pending.record(event);
            }
        }
        tracing::debug!(events = events.len(), "recorded file changes");
        notify_all(&self.listeners);
    }

    fn unsubscribe(&self) {
        if let Some(id) = self.subscription.lock().take() {
            self.runtime.changes.unsubscribe(id);
        }
    }
}

impl Drop for CalculatorInner {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

/// Keeps one graph up to date and computes deltas against it.
pub struct DeltaCalculator {
    inner: Arc<CalculatorInner>,
}

impl DeltaCalculator {
    /// Create a calculator for `options.entry_file` and subscribe it to the
    /// runtime's change source.
    ///
    /// The graph stays empty until the first [`DeltaCalculator::get_delta`].
    pub fn new(options: DeltaOptions, runtime: BundlerRuntime) -> Self {
        let graph = Graph::new(options.entry_path());
        let inner = Arc::new(CalculatorInner {
            options,
            runtime,
            graph: RwLock::new(graph),
            pending: Mutex::new(PendingChanges::new()),
            build_lock: tokio::sync::Mutex::new(()),
            transform_options: OnceCell::new(),
            listeners: Mutex::new(Listeners::default()),
            subscription: Mutex::new(None),
        });

        let weak: Weak<CalculatorInner> = Arc::downgrade(&inner);
        let id = inner
            .runtime
            .changes
            .subscribe(Arc::new(move |events: &[WatchEvent]| {
                if let Some(inner) = weak.upgrade() {
                    inner.handle_changes(events);
                }
            }));
        *inner.subscription.lock() = Some(id);

        Self { inner }
    }

    pub fn options(&self) -> &DeltaOptions {
        &self.inner.options
    }

    /// Compute the changes since the previous call.
    ///
    /// The first call on an empty graph builds it and always returns a reset.
    /// If the computation fails, the changes it consumed are recorded again
    /// so the next call retries them, and a graph left half-updated is
    /// discarded so that the next call rebuilds it from scratch.
    pub async fn get_delta(&self, request: DeltaRequest) -> Result<DeltaResult> {
        let _build = self.inner.build_lock.lock().await;
        let started = Instant::now();

        let options = self.transform_options().await?;
        let mut graph = self.inner.graph.write().await;
        let changes = self.inner.pending.lock().take();
        let modules_before = graph.len();

        match self
            .compute(&mut graph, &changes, &request, &options)
            .await
        {
            Ok(delta) => {
                tracing::info!(
                    entry = %graph.entry_file().display(),
                    modified = delta.modified.len(),
                    deleted = delta.deleted.len(),
                    reset = delta.reset,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "delta computed"
                );
                Ok(delta)
            }
            Err(err) => {
                self.inner.pending.lock().restore(changes);
                let discarded = graph.len() != modules_before;
                if discarded {
                    graph.clear();
                }
                tracing::warn!(
                    entry = %graph.entry_file().display(),
                    error = %err,
                    graph_discarded = discarded,
                    "delta computation failed"
                );
                Err(err.into())
            }
        }
    }

    async fn compute(
        &self,
        graph: &mut Graph,
        changes: &PendingChanges,
        request: &DeltaRequest,
        options: &TransformOptions,
    ) -> kiln_graph::Result<DeltaResult> {
        let mut ctx = self.inner.runtime.context(options);
        if let Some(on_progress) = request.on_progress.as_deref() {
            ctx = ctx.with_progress(on_progress);
        }

        if graph.is_empty() {
            graph.initial_traverse(&ctx).await?;
            graph.reorder_in_place();
            return Ok(DeltaResult::full(graph));
        }

        let paths = changes.paths_to_traverse(graph);
        let traversal = if paths.is_empty() {
            Traversal::default()
        } else {
            graph.traverse(paths, &ctx).await?
        };

        if request.reset {
            graph.reorder_in_place();
            return Ok(DeltaResult::full(graph));
        }

        Ok(DeltaResult {
            modified: traversal.added,
            deleted: traversal.deleted,
            reset: false,
        })
    }

    /// Read access to the live graph.
    ///
    /// Waits while a computation is updating it. Holding the guard delays the
    /// next computation.
    pub async fn graph(&self) -> RwLockReadGuard<'_, Graph> {
        self.inner.graph.read().await
    }

    /// Transform options used for every module of this graph.
    ///
    /// Computed on first use by
    /// [`Transformer::customize_options`](kiln_graph::Transformer::customize_options)
    /// and cached for the calculator's lifetime.
    pub async fn transform_options(&self) -> Result<Arc<TransformOptions>> {
        let options = self
            .inner
            .transform_options
            .get_or_try_init(|| async {
                let base = self.inner.options.transform.clone();
                let entry = self.inner.options.entry_path();
                self.inner
                    .runtime
                    .transformer
                    .customize_options(&entry, base)
                    .await
                    .map(Arc::new)
            })
            .await?;
        Ok(Arc::clone(options))
    }

    /// Register a callback invoked after every batch of file changes.
    pub fn listen(&self, listener: impl Fn() + Send + Sync + 'static) -> ListenerId {
        self.inner.listeners.lock().add(Arc::new(listener))
    }

    /// Returns true if the listener was registered.
    pub fn unlisten(&self, id: ListenerId) -> bool {
        self.inner.listeners.lock().remove(id)
    }

    pub fn listener_count(&self) -> usize {
        self.inner.listeners.lock().len()
    }

    /// Changes recorded and not yet consumed by a computation.
    pub fn pending_changes(&self) -> PendingChanges {
        self.inner.pending.lock().clone()
    }

    /// Stop watching, drop listeners, and reset the graph and pending changes.
    ///
    /// A computation in flight is allowed to finish first.
    pub async fn end(&self) {
        self.inner.unsubscribe();
        self.inner.listeners.lock().clear();

        let _build = self.inner.build_lock.lock().await;
        self.inner.graph.write().await.clear();
        self.inner.pending.lock().take();
        tracing::debug!(
            entry = %self.inner.options.entry_path().display(),
            "delta calculator ended"
        );
    }
}

impl std::fmt::Debug for DeltaCalculator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeltaCalculator")
            .field("options", &self.inner.options)
            .field("listeners", &self.listener_count())
            .finish_non_exhaustive()
    }
}
