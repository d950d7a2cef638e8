//! Collaborators shared by every graph of a bundler.
//!
//! `BundlerRuntime` bundles the host-provided [`Resolver`] and [`Transformer`]
//! with the [`ChangeSource`] that reports file changes. It is cheap to clone;
//! each delta calculator keeps its own copy.

use std::sync::Arc;

use kiln_graph::{Resolver, TransformOptions, Transformer, TraversalContext};

use crate::watcher::{ChangeHub, ChangeSource};

#[derive(Debug, Clone)]
pub struct BundlerRuntime {
    pub resolver: Arc<dyn Resolver>,
    pub transformer: Arc<dyn Transformer>,
    pub changes: Arc<dyn ChangeSource>,
}

impl BundlerRuntime {
    pub fn new(
        resolver: Arc<dyn Resolver>,
        transformer: Arc<dyn Transformer>,
        changes: Arc<dyn ChangeSource>,
    ) -> Self {
        Self {
            resolver,
            transformer,
            changes,
        }
    }

    /// Use one value as both resolver and transformer.
    pub fn from_shared<R>(runtime: Arc<R>, changes: Arc<dyn ChangeSource>) -> Self
    where
        R: Resolver + Transformer + 'static,
    {
        let resolver: Arc<dyn Resolver> = runtime.clone();
        let transformer: Arc<dyn Transformer> = runtime;
        Self::new(resolver, transformer, changes)
    }

    /// Like [`BundlerRuntime::from_shared`], with a fresh [`ChangeHub`] that
    /// is returned for emitting events.
    pub fn with_hub<R>(runtime: Arc<R>) -> (Self, Arc<ChangeHub>)
    where
        R: Resolver + Transformer + 'static,
    {
        let hub = Arc::new(ChangeHub::new());
        let changes: Arc<dyn ChangeSource> = hub.clone();
        (Self::from_shared(runtime, changes), hub)
    }

    /// Traversal context over these collaborators.
    pub fn context<'a>(&'a self, options: &'a TransformOptions) -> TraversalContext<'a> {
        TraversalContext::new(self.resolver.as_ref(), self.transformer.as_ref(), options)
    }
}
