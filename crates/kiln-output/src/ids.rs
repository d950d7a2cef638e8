//! Module id allocation.

use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use rustc_hash::FxBuildHasher;

/// Anything that can hand out a numeric id for a module path.
///
/// Implementations must be idempotent: the same path always yields the same
/// id for the allocator's lifetime.
pub trait ModuleIdAllocator {
    fn allocate(&mut self, path: &Path) -> u32;
}

impl<F> ModuleIdAllocator for F
where
    F: FnMut(&Path) -> u32,
{
    fn allocate(&mut self, path: &Path) -> u32 {
        self(path)
    }
}

/// First-seen-order id table.
///
/// Ids start at 0 and increase by one for every new path. They are never
/// reused or reassigned.
#[derive(Debug, Clone, Default)]
pub struct ModuleIdTable {
    ids: IndexMap<PathBuf, u32, FxBuildHasher>,
}

impl ModuleIdTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the id for `path`, assigning the next free one if needed.
    pub fn allocate(&mut self, path: &Path) -> u32 {
        if let Some(id) = self.ids.get(path) {
            return *id;
        }
        // A table never realistically reaches u32::MAX entries.
        let id = self.ids.len() as u32;
        self.ids.insert(path.to_path_buf(), id);
        id
    }

    /// Look up an id without assigning one.
    pub fn get(&self, path: &Path) -> Option<u32> {
        self.ids.get(path).copied()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Iterate `(path, id)` pairs in allocation order.
    pub fn iter(&self) -> impl Iterator<Item = (&Path, u32)> {
        self.ids.iter().map(|(path, id)| (path.as_path(), *id))
    }
}

impl ModuleIdAllocator for ModuleIdTable {
    fn allocate(&mut self, path: &Path) -> u32 {
        ModuleIdTable::allocate(self, path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_first_seen_order() {
        let mut table = ModuleIdTable::new();
        assert_eq!(table.allocate(Path::new("/a.js")), 0);
        assert_eq!(table.allocate(Path::new("/b.js")), 1);
        assert_eq!(table.allocate(Path::new("/a.js")), 0);
        assert_eq!(table.allocate(Path::new("/c.js")), 2);
        assert_eq!(table.get(Path::new("/b.js")), Some(1));
        assert_eq!(table.get(Path::new("/missing.js")), None);
        assert_eq!(table.len(), 3);
    }

    #[test]
    fn test_closure_allocator() {
        let mut calls = 0;
        let mut allocator = |_: &Path| {
            calls += 1;
            7
        };
        assert_eq!(ModuleIdAllocator::allocate(&mut allocator, Path::new("/a.js")), 7);
        assert_eq!(calls, 1);
    }

    proptest! {
        /// Ids are dense, stable and assigned in first-seen order.
        #[test]
        fn prop_ids_are_dense_and_stable(names in prop::collection::vec("[a-e]{1,3}", 0..64)) {
            let mut table = ModuleIdTable::new();
            let mut first_seen: Vec<String> = Vec::new();

            for name in &names {
                let path = PathBuf::from(format!("/src/{name}.js"));
                let id = table.allocate(&path);
                if !first_seen.contains(name) {
                    first_seen.push(name.clone());
                }
                let expected = first_seen.iter().position(|n| n == name).unwrap();
                prop_assert_eq!(id as usize, expected);
            }

            prop_assert_eq!(table.len(), first_seen.len());
            for (index, (_, id)) in table.iter().enumerate() {
                prop_assert_eq!(id as usize, index);
            }
        }
    }
}
