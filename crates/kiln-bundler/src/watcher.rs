//! Change notifications from the file system.
//!
//! Delta calculators do not watch files themselves. They subscribe to a
//! [`ChangeSource`] and receive batches of [`WatchEvent`]s. [`ChangeHub`] is the
//! in-process source: anything can push events into it, including the
//! notify-backed [`NotifyWatcher`] (feature `watch`) and tests.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;

/// What happened to a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WatchEventKind {
    /// Created or changed.
    Modify,
    Delete,
}

/// One file change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchEvent {
    pub kind: WatchEventKind,
    pub path: PathBuf,
}

impl WatchEvent {
    pub fn modify(path: impl Into<PathBuf>) -> Self {
        Self {
            kind: WatchEventKind::Modify,
            path: path.into(),
        }
    }

    pub fn delete(path: impl Into<PathBuf>) -> Self {
        Self {
            kind: WatchEventKind::Delete,
            path: path.into(),
        }
    }
}

/// Callback receiving one batch of events.
pub type ChangeCallback = Arc<dyn Fn(&[WatchEvent]) + Send + Sync>;

/// Identifies a subscription for [`ChangeSource::unsubscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// A stream of file change batches.
pub trait ChangeSource: Send + Sync + std::fmt::Debug {
    /// Register `callback` for every future batch.
    fn subscribe(&self, callback: ChangeCallback) -> SubscriptionId;

    /// Stop delivering batches to a subscription. Unknown ids are ignored.
    fn unsubscribe(&self, id: SubscriptionId);
}

/// In-process [`ChangeSource`] that fans batches out to its subscribers.
#[derive(Default)]
pub struct ChangeHub {
    next_id: AtomicU64,
    subscribers: Mutex<Vec<(SubscriptionId, ChangeCallback)>>,
}

impl ChangeHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver `events` to every subscriber, in subscription order.
    ///
    /// Callbacks run on the calling thread. Empty batches are dropped.
    pub fn emit(&self, events: &[WatchEvent]) {
        if events.is_empty() {
            return;
        }
        // Snapshot so callbacks may subscribe or unsubscribe.
        let subscribers: Vec<ChangeCallback> = self
            .subscribers
            .lock()
            .iter()
            .map(|(_, callback)| Arc::clone(callback))
            .collect();

        tracing::debug!(
            events = events.len(),
            subscribers = subscribers.len(),
            "dispatching file changes"
        );
        for callback in subscribers {
            callback(events);
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().len()
    }
}

impl ChangeSource for ChangeHub {
    fn subscribe(&self, callback: ChangeCallback) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.subscribers.lock().push((id, callback));
        id
    }

    fn unsubscribe(&self, id: SubscriptionId) {
        self.subscribers.lock().retain(|(existing, _)| *existing != id);
    }
}

impl std::fmt::Debug for ChangeHub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChangeHub")
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

/// Check if a watched path should be ignored.
///
/// Paths outside `root`, paths matching an ignore pattern (`*.ext` suffixes or
/// directory names) and hidden files or directories are ignored.
pub fn should_ignore(path: &Path, root: &Path, ignore_patterns: &[String]) -> bool {
    let Ok(relative) = path.strip_prefix(root) else {
        return true;
    };
    let relative_str = relative.to_string_lossy();

    for pattern in ignore_patterns {
        if let Some(suffix) = pattern.strip_prefix('*') {
            if relative_str.ends_with(suffix) {
                return true;
            }
        } else if relative_str.starts_with(pattern.as_str())
            || relative_str.contains(&format!("/{pattern}"))
        {
            return true;
        }
    }

    relative.components().any(|component| {
        component
            .as_os_str()
            .to_str()
            .is_some_and(|name| name.starts_with('.') && name != "." && name != "..")
    })
}

#[cfg(feature = "watch")]
pub use notify_watcher::NotifyWatcher;

#[cfg(feature = "watch")]
mod notify_watcher {
    use std::path::{Path, PathBuf};
    use std::sync::Arc;

    use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};

    use super::{
        ChangeCallback, ChangeHub, ChangeSource, SubscriptionId, WatchEvent, WatchEventKind,
        should_ignore,
    };

    /// Recursive notify watcher that feeds a [`ChangeHub`].
    ///
    /// Creates and modifications become [`WatchEventKind::Modify`], removals
    /// become [`WatchEventKind::Delete`].
    /// Each notify event is delivered as one batch.
    pub struct NotifyWatcher {
        _watcher: RecommendedWatcher,
        hub: Arc<ChangeHub>,
        root: PathBuf,
    }

    impl NotifyWatcher {
        /// Watch `root` recursively, skipping paths that match `ignore_patterns`.
        pub fn new(root: impl Into<PathBuf>, ignore_patterns: Vec<String>) -> notify::Result<Self> {
            let root: PathBuf = root.into();
            let root = root.canonicalize().unwrap_or(root);
            let hub = Arc::new(ChangeHub::new());

            let sink = Arc::clone(&hub);
            let filter_root = root.clone();
            let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
                let event = match res {
                    Ok(event) => event,
                    Err(err) => {
                        tracing::warn!(error = %err, "file watcher error");
                        return;
                    }
                };
                let kind = match event.kind {
                    EventKind::Create(_) | EventKind::Modify(_) => WatchEventKind::Modify,
                    EventKind::Remove(_) => WatchEventKind::Delete,
                    _ => return,
                };
                let batch: Vec<WatchEvent> = event
                    .paths
                    .into_iter()
                    .filter(|path| !should_ignore(path, &filter_root, &ignore_patterns))
                    .map(|path| WatchEvent { kind, path })
                    .collect();
                sink.emit(&batch);
            })?;

            watcher.watch(&root, RecursiveMode::Recursive)?;
            tracing::debug!(root = %root.display(), "watching for file changes");

            Ok(Self {
                _watcher: watcher,
                hub,
                root,
            })
        }

        /// Get the root directory being watched.
        pub fn root(&self) -> &Path {
            &self.root
        }

        /// The hub events are delivered through.
        pub fn hub(&self) -> &Arc<ChangeHub> {
            &self.hub
        }
    }

    impl ChangeSource for NotifyWatcher {
        fn subscribe(&self, callback: ChangeCallback) -> SubscriptionId {
            self.hub.subscribe(callback)
        }

        fn unsubscribe(&self, id: SubscriptionId) {
            self.hub.unsubscribe(id);
        }
    }

    impl std::fmt::Debug for NotifyWatcher {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.debug_struct("NotifyWatcher")
                .field("root", &self.root)
                .field("hub", &self.hub)
                .finish()
        }
    }
}
