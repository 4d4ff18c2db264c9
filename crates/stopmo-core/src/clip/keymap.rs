//! Key → frame reverse index
//!
//! One keymap per control surface. The owning [`FrameStore`](super::FrameStore)
//! keeps it consistent with the per-frame key fields.

use std::collections::BTreeMap;

/// Reverse index from a control-surface key to a display index
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Keymap<K: Ord + Copy> {
    entries: BTreeMap<K, usize>,
}

impl<K: Ord + Copy> Keymap<K> {
    pub fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// Frame bound to `key`, if any
    pub fn resolve(&self, key: K) -> Option<usize> {
        self.entries.get(&key).copied()
    }

    /// Bind `key` to `index`, returning the frame it previously resolved to
    pub fn insert(&mut self, key: K, index: usize) -> Option<usize> {
        self.entries.insert(key, index)
    }

    pub fn remove(&mut self, key: K) -> Option<usize> {
        self.entries.remove(&key)
    }

    /// Drop every entry that targets a frame in `first..last`, then pull
    /// entries above the range down by its width
    pub fn remove_range(&mut self, first: usize, last: usize) {
        let width = last - first;
        self.entries.retain(|_, idx| !(first..last).contains(idx));
        for idx in self.entries.values_mut() {
            if *idx >= last {
                *idx -= width;
            }
        }
    }

    /// Remove all entries, returning how many there were
    pub fn clear(&mut self) -> usize {
        let n = self.entries.len();
        self.entries.clear();
        n
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate `(key, index)` pairs in key order
    pub fn iter(&self) -> impl Iterator<Item = (K, usize)> + '_ {
        self.entries.iter().map(|(k, i)| (*k, *i))
    }
}

impl<K: Ord + Copy> Default for Keymap<K> {
    fn default() -> Self {
        Self::new()
    }
}
