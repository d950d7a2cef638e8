//! Per-client output pipelines.
//!
//! A [`Session`] pairs a delta calculator with the module id table and output
//! options of one client. Ids are allocated from the session's own table, so
//! two clients bundling the same files never observe each other's ids.

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use kiln_graph::RawSourceMap;
use kiln_output::{
    IdEmbedder, ModuleIdTable, OutputModule, OutputOptions, VirtualScript, append_scripts,
    module_code_and_map,
};
use parking_lot::Mutex;
use serde::Serialize;

use crate::calculator::{DeltaCalculator, DeltaRequest, DeltaResult};
use crate::config::BundlerConfig;
use crate::error::Result;
use crate::runtime::BundlerRuntime;

/// A module ready to be sent to a client.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SerializedModule {
    pub id: u32,
    pub path: PathBuf,
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub map: Option<RawSourceMap>,
}

/// A delta with every module run through the output stage.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SerializedDelta {
    pub modified: Vec<SerializedModule>,
    /// Ids of removed modules.
    pub deleted: Vec<u32>,
    pub reset: bool,
}

/// One client's bundling pipeline.
pub struct Session {
    client_id: String,
    calculator: Arc<DeltaCalculator>,
    ids: Mutex<ModuleIdTable>,
    output: OutputOptions,
    embedder: Box<dyn IdEmbedder>,
    /// Set once a delta has been handed to the client; cleared when one is
    /// lost on the way.
    delivered: AtomicBool,
}

impl Session {
    /// Create the session and build its graph.
    pub(crate) async fn create(
        client_id: String,
        config: BundlerConfig,
        runtime: BundlerRuntime,
    ) -> Result<Self> {
        let calculator = Arc::new(DeltaCalculator::new(config.delta, runtime));
        if let Err(err) = calculator.get_delta(DeltaRequest::new(true)).await {
            calculator.end().await;
            return Err(err);
        }

        tracing::debug!(client = %client_id, "session created");
        Ok(Self {
            client_id,
            calculator,
            ids: Mutex::new(ModuleIdTable::new()),
            embedder: config.output.embedder(),
            output: config.output,
            delivered: AtomicBool::new(false),
        })
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub fn calculator(&self) -> &Arc<DeltaCalculator> {
        &self.calculator
    }

    pub fn output_options(&self) -> &OutputOptions {
        &self.output
    }

    /// Id already assigned to `path` by this session, if any.
    pub fn module_id(&self, path: &std::path::Path) -> Option<u32> {
        self.ids.lock().get(path)
    }

    /// Fetch the next delta and emit code for every modified module.
    ///
    /// The first delta of a session is always a reset, since the client has
    /// nothing yet. The same holds after a delta was computed but could not be
    /// serialized: its changes are gone from the calculator, so the client
    /// gets the whole graph again.
    pub async fn next_delta(&self, reset: bool) -> Result<SerializedDelta> {
        let reset = reset || !self.delivered.load(Ordering::Acquire);
        let delta = self.calculator.get_delta(DeltaRequest::new(reset)).await?;

        match self.serialize(&delta) {
            Ok(serialized) => {
                self.delivered.store(true, Ordering::Release);
                Ok(serialized)
            }
            Err(err) => {
                tracing::warn!(
                    client = %self.client_id,
                    error = %err,
                    "delta dropped, next one is a reset"
                );
                self.delivered.store(false, Ordering::Release);
                Err(err)
            }
        }
    }

    fn serialize(&self, delta: &DeltaResult) -> Result<SerializedDelta> {
        let mut ids = self.ids.lock();

        let mut modified = Vec::with_capacity(delta.modified.len());
        for (path, edge) in &delta.modified {
            let module = OutputModule::from_edge(edge);
            let embedded = module_code_and_map(&module, &mut *ids, self.embedder.as_ref())?;
            modified.push(SerializedModule {
                id: ids.allocate(path),
                path: path.clone(),
                code: embedded.code,
                map: embedded.map,
            });
        }
        let deleted = delta.deleted.iter().map(|path| ids.allocate(path)).collect();

        Ok(SerializedDelta {
            modified,
            deleted,
            reset: delta.reset,
        })
    }

    /// Scripts that run the configured startup modules and the entry.
    pub async fn append_scripts(&self) -> Vec<VirtualScript> {
        let graph = self.calculator.graph().await;
        let mut ids = self.ids.lock();
        append_scripts(graph.entry_file(), &graph, &mut *ids, &self.output)
    }

    pub(crate) async fn end(&self) {
        self.calculator.end().await;
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("client_id", &self.client_id)
            .field("calculator", &self.calculator)
            .field("output", &self.output)
            .finish_non_exhaustive()
    }
}
