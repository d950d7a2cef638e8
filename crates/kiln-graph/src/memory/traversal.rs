//! Traversal methods for Graph.
//!
//! Both entry points share one work-queue loop: every queued module is
//! transformed, its dependencies are resolved, and the forward/inverse links
//! are diffed against what the graph held before. Targets seen for the first
//! time are queued in turn. A module is processed at most once per pass.
//!
//! Links that disappear during a pass may leave modules unreachable. Those are
//! garbage-collected once the queue drains, by walking the graph from the
//! entry. If the pass fails first, the graph remembers that a collection is
//! owed and the next successful pass performs it.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use indexmap::IndexMap;
use rustc_hash::{FxBuildHasher, FxHashSet};

use super::graph::{EdgeMap, Graph, PathSet};
use crate::{Resolver, Result, TransformOptions, Transformer};

/// Collaborators used by one traversal.
#[derive(Clone, Copy)]
pub struct TraversalContext<'a> {
    pub resolver: &'a dyn Resolver,
    pub transformer: &'a dyn Transformer,
    pub options: &'a TransformOptions,
    pub on_progress: Option<&'a (dyn Fn(usize, usize) + Send + Sync + 'a)>,
}

impl<'a> TraversalContext<'a> {
    pub fn new(
        resolver: &'a dyn Resolver,
        transformer: &'a dyn Transformer,
        options: &'a TransformOptions,
    ) -> Self {
        Self {
            resolver,
            transformer,
            options,
            on_progress: None,
        }
    }

    /// Report `(processed, total)` after every module.
    pub fn with_progress(mut self, on_progress: &'a (dyn Fn(usize, usize) + Send + Sync + 'a)) -> Self {
        self.on_progress = Some(on_progress);
        self
    }
}

impl std::fmt::Debug for TraversalContext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TraversalContext")
            .field("resolver", &self.resolver)
            .field("transformer", &self.transformer)
            .field("options", &self.options)
            .field("on_progress", &self.on_progress.is_some())
            .finish()
    }
}

/// What a traversal changed.
#[derive(Debug, Clone, Default)]
pub struct Traversal {
    /// Modules that were (re)transformed and are still in the graph, in
    /// processing order.
    pub added: EdgeMap,
    /// Modules removed from the graph.
    pub deleted: PathSet,
}

#[derive(Default)]
struct Pass {
    queue: VecDeque<PathBuf>,
    queued: FxHashSet<PathBuf>,
    touched: PathSet,
}

impl Pass {
    fn enqueue(&mut self, path: PathBuf) {
        if self.queued.insert(path.clone()) {
            self.queue.push_back(path);
        }
    }
}

impl Graph {
    /// Build the graph from its entry file.
    ///
    /// Expects an empty graph. On error the graph is left partially
    /// populated; callers should discard it.
    pub async fn initial_traverse(&mut self, ctx: &TraversalContext<'_>) -> Result<Traversal> {
        let mut pass = Pass::default();
        let entry = self.entry_file.clone();
        self.create_edge(entry.clone());
        pass.enqueue(entry);

        self.process_queue(&mut pass, ctx).await?;

        tracing::debug!(modules = self.len(), "initial traversal complete");
        Ok(self.finish(pass, PathSet::default()))
    }

    /// Re-process `paths` and everything that becomes newly reachable.
    ///
    /// Paths that are not in the graph are ignored. Modules that are no longer
    /// reachable from the entry afterwards are removed and reported in
    /// [`Traversal::deleted`].
    pub async fn traverse<I>(&mut self, paths: I, ctx: &TraversalContext<'_>) -> Result<Traversal>
    where
        I: IntoIterator<Item = PathBuf>,
    {
        let mut pass = Pass::default();
        for path in paths {
            if self.contains(&path) {
                pass.enqueue(path);
            }
        }

        self.process_queue(&mut pass, ctx).await?;

        let removed = if self.needs_collection {
            self.remove_unreachable()
        } else {
            PathSet::default()
        };

        tracing::debug!(
            processed = pass.touched.len(),
            removed = removed.len(),
            modules = self.len(),
            "incremental traversal complete"
        );
        Ok(self.finish(pass, removed))
    }

    async fn process_queue(&mut self, pass: &mut Pass, ctx: &TraversalContext<'_>) -> Result<()> {
        let mut processed = 0;
        while let Some(path) = pass.queue.pop_front() {
            // Removed by an earlier step of this pass.
            if !self.contains(&path) {
                continue;
            }

            self.process_module(&path, pass, ctx).await?;

            processed += 1;
            if let Some(on_progress) = ctx.on_progress {
                on_progress(processed, pass.queued.len());
            }
        }
        Ok(())
    }

    async fn process_module(
        &mut self,
        path: &Path,
        pass: &mut Pass,
        ctx: &TraversalContext<'_>,
    ) -> Result<()> {
        tracing::debug!(path = %path.display(), "processing module");
        let output = ctx.transformer.transform(path, ctx.options).await?;

        let mut resolved: IndexMap<String, PathBuf, FxBuildHasher> = IndexMap::default();
        for dependency in &output.dependencies {
            if resolved.contains_key(&dependency.specifier) {
                continue;
            }
            let target = ctx.resolver.resolve(&dependency.specifier, path)?;
            resolved.insert(dependency.specifier.clone(), target);
        }

        let previous: PathSet = self
            .edge(path)
            .map(|edge| edge.dependency_paths().cloned().collect())
            .unwrap_or_default();
        let next: PathSet = resolved.values().cloned().collect();

        for old in previous.difference(&next) {
            self.remove_inverse(old, path);
            self.needs_collection = true;
        }
        for new in next.difference(&previous) {
            if self.create_edge(new.clone()) {
                pass.enqueue(new.clone());
            }
            self.add_inverse(new, path);
        }

        if let Some(edge) = self.edge_mut(path) {
            edge.dependencies = resolved;
            edge.output = output;
        }
        pass.touched.insert(path.to_path_buf());
        Ok(())
    }

    /// Remove every module not reachable from the entry, unlinking it from
    /// the modules it depended on.
    fn remove_unreachable(&mut self) -> PathSet {
        let mut reachable: FxHashSet<&Path> = FxHashSet::default();
        let mut queue: VecDeque<&Path> = VecDeque::new();
        if self.contains(&self.entry_file) {
            queue.push_back(&self.entry_file);
        }
        while let Some(current) = queue.pop_front() {
            if !reachable.insert(current) {
                continue;
            }
            if let Some(edge) = self.dependencies.get(current) {
                queue.extend(edge.dependency_paths().map(PathBuf::as_path));
            }
        }

        let unreachable: PathSet = self
            .dependencies
            .keys()
            .filter(|path| !reachable.contains(path.as_path()))
            .cloned()
            .collect();

        for path in &unreachable {
            let Some(edge) = self.remove_edge(path) else {
                continue;
            };
            for target in edge.dependency_paths() {
                self.remove_inverse(target, path);
            }
            tracing::debug!(path = %path.display(), "removed unreachable module");
        }

        self.needs_collection = false;
        unreachable
    }

    fn finish(&self, pass: Pass, removed: PathSet) -> Traversal {
        let added: EdgeMap = pass
            .touched
            .into_iter()
            .filter_map(|path| {
                let edge = Arc::clone(self.edge(&path)?);
                Some((path, edge))
            })
            .collect();
        let deleted = removed
            .into_iter()
            .filter(|path| !added.contains_key(path))
            .collect();

        Traversal { added, deleted }
    }
}
