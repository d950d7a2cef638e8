//! Change listeners of a delta calculator.

use std::sync::Arc;

use parking_lot::Mutex;

/// Callback invoked after every batch of file changes.
pub type Listener = Arc<dyn Fn() + Send + Sync>;

/// Identifies a registered listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Ordered list of listeners.
#[derive(Default)]
pub struct Listeners {
    next_id: u64,
    entries: Vec<(ListenerId, Listener)>,
}

impl Listeners {
    pub fn add(&mut self, listener: Listener) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.entries.push((id, listener));
        id
    }

    /// Returns true if the listener was registered.
    pub fn remove(&mut self, id: ListenerId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(existing, _)| *existing != id);
        self.entries.len() != before
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn snapshot(&self) -> Vec<Listener> {
        self.entries
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect()
    }
}

/// Call every listener once, in registration order.
///
/// The lock is released before any listener runs, so listeners may register
/// or remove listeners themselves.
pub(crate) fn notify_all(listeners: &Mutex<Listeners>) {
    let snapshot = listeners.lock().snapshot();
    for listener in snapshot {
        listener();
    }
}

impl std::fmt::Debug for Listeners {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Listeners")
            .field("len", &self.entries.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notify_in_registration_order() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let listeners = Mutex::new(Listeners::default());

        let mut ids = Vec::new();
        for name in ["a", "b", "c"] {
            let calls = Arc::clone(&calls);
            ids.push(
                listeners
                    .lock()
                    .add(Arc::new(move || calls.lock().push(name))),
            );
        }

        notify_all(&listeners);
        assert!(listeners.lock().remove(ids[1]));
        assert!(!listeners.lock().remove(ids[1]));
        notify_all(&listeners);

        assert_eq!(*calls.lock(), vec!["a", "b", "c", "a", "c"]);
    }
}
