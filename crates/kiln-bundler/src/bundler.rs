//! Multi-graph, multi-client delta bundler.
//!
//! [`DeltaBundler`] owns any number of independent graphs, each kept up to
//! date by its own [`DeltaCalculator`]. Graphs are addressed by
//! [`GraphHandle`]s. Client sessions ([`Session`]) layer module ids and code
//! output on top of a graph of their own.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use tokio::sync::OnceCell;

use crate::calculator::{DeltaCalculator, DeltaRequest, DeltaResult};
use crate::config::{BundlerConfig, DeltaOptions};
use crate::error::{DeltaError, Result};
use crate::listeners::ListenerId;
use crate::runtime::BundlerRuntime;
use crate::session::Session;

/// Opaque identifier of a graph built by a [`DeltaBundler`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GraphHandle(u64);

impl std::fmt::Display for GraphHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "graph#{}", self.0)
    }
}

type SessionSlot = Arc<OnceCell<Arc<Session>>>;

#[derive(Debug)]
pub struct DeltaBundler {
    runtime: BundlerRuntime,
    next_handle: AtomicU64,
    graphs: DashMap<GraphHandle, Arc<DeltaCalculator>>,
    sessions: DashMap<String, SessionSlot>,
}

impl DeltaBundler {
    pub fn new(runtime: BundlerRuntime) -> Self {
        Self {
            runtime,
            next_handle: AtomicU64::new(1),
            graphs: DashMap::new(),
            sessions: DashMap::new(),
        }
    }

    pub fn runtime(&self) -> &BundlerRuntime {
        &self.runtime
    }

    /// Build a new graph from `options.entry_file`.
    ///
    /// Nothing is registered if the first build fails.
    pub async fn build_graph(&self, options: DeltaOptions) -> Result<GraphHandle> {
        let calculator = Arc::new(DeltaCalculator::new(options, self.runtime.clone()));
        if let Err(err) = calculator.get_delta(DeltaRequest::new(true)).await {
            calculator.end().await;
            return Err(err);
        }

        let handle = GraphHandle(self.next_handle.fetch_add(1, Ordering::Relaxed));
        self.graphs.insert(handle, calculator);
        tracing::debug!(%handle, graphs = self.graphs.len(), "graph built");
        Ok(handle)
    }

    /// The calculator behind `handle`.
    pub fn calculator(&self, handle: GraphHandle) -> Result<Arc<DeltaCalculator>> {
        self.graphs
            .get(&handle)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or(DeltaError::NotFound(handle))
    }

    pub async fn get_delta(&self, handle: GraphHandle, reset: bool) -> Result<DeltaResult> {
        let calculator = self.calculator(handle)?;
        calculator.get_delta(DeltaRequest::new(reset)).await
    }

    /// Register a callback invoked whenever files of interest change.
    pub fn listen(
        &self,
        handle: GraphHandle,
        listener: impl Fn() + Send + Sync + 'static,
    ) -> Result<ListenerId> {
        Ok(self.calculator(handle)?.listen(listener))
    }

    /// End one graph. The handle becomes invalid.
    pub async fn end_graph(&self, handle: GraphHandle) -> Result<()> {
        let (_, calculator) = self
            .graphs
            .remove(&handle)
            .ok_or(DeltaError::NotFound(handle))?;
        calculator.end().await;
        tracing::debug!(%handle, "graph ended");
        Ok(())
    }

    /// Get the session of `client_id`, creating it from `config` if needed.
    ///
    /// `config` is ignored if the session exists. Concurrent calls for the
    /// same client share one creation. A failed creation is not cached.
    ///
    /// If [`DeltaBundler::end_session`] or [`DeltaBundler::end`] removes the
    /// client while its session is being created, the new session is ended
    /// straight away and [`DeltaError::SessionEnded`] is returned.
    pub async fn session(&self, client_id: &str, config: BundlerConfig) -> Result<Arc<Session>> {
        let slot: SessionSlot = Arc::clone(
            self.sessions
                .entry(client_id.to_string())
                .or_default()
                .value(),
        );

        let session = slot
            .get_or_try_init(|| async move {
                Session::create(client_id.to_string(), config, self.runtime.clone())
                    .await
                    .map(Arc::new)
            })
            .await?;

        let registered = self
            .sessions
            .get(client_id)
            .is_some_and(|current| Arc::ptr_eq(current.value(), &slot));
        if !registered {
            session.end().await;
            tracing::debug!(client = %client_id, "session ended during creation");
            return Err(DeltaError::SessionEnded(client_id.to_string()));
        }
        Ok(Arc::clone(session))
    }

    /// Look up an existing session.
    pub fn existing_session(&self, client_id: &str) -> Option<Arc<Session>> {
        self.sessions
            .get(client_id)
            .and_then(|slot| slot.get().cloned())
    }

    /// End a client's session. Unknown clients are ignored.
    pub async fn end_session(&self, client_id: &str) {
        let Some((_, slot)) = self.sessions.remove(client_id) else {
            return;
        };
        if let Some(session) = slot.get() {
            session.end().await;
            tracing::debug!(client = %client_id, "session ended");
        }
    }

    pub fn graph_count(&self) -> usize {
        self.graphs.len()
    }

    pub fn session_count(&self) -> usize {
        self.sessions
            .iter()
            .filter(|slot| slot.value().initialized())
            .count()
    }

    /// End every graph and session.
    pub async fn end(&self) {
        let handles: Vec<GraphHandle> = self.graphs.iter().map(|entry| *entry.key()).collect();
        for handle in handles {
            if let Some((_, calculator)) = self.graphs.remove(&handle) {
                calculator.end().await;
            }
        }

        let clients: Vec<String> = self.sessions.iter().map(|entry| entry.key().clone()).collect();
        for client in clients {
            self.end_session(&client).await;
        }
        tracing::debug!("delta bundler ended");
    }
}
