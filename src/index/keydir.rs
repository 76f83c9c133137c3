//! Index implementation
//!
//! HashMap-based key directory.

use std::collections::HashMap;

/// Key → offset of the most recent record for that key
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Index {
    entries: HashMap<Vec<u8>, u64>,
}

impl Index {
    /// Create a new empty index
    pub fn new() -> Self {
        Self::default()
    }

    /// Point `key` at `offset`, returning the previous offset if any
    pub fn insert(&mut self, key: Vec<u8>, offset: u64) -> Option<u64> {
        self.entries.insert(key, offset)
    }

    /// Get the offset for a key
    pub fn get(&self, key: &[u8]) -> Option<u64> {
        self.entries.get(key).copied()
    }

    /// Drop a key from the index
    pub fn remove(&mut self, key: &[u8]) -> Option<u64> {
        self.entries.remove(key)
    }

    pub fn contains_key(&self, key: &[u8]) -> bool {
        self.entries.contains_key(key)
    }

    /// True if `offset` is the live record for `key`
    pub fn is_live(&self, key: &[u8], offset: u64) -> bool {
        self.get(key) == Some(offset)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over indexed keys (unordered)
    pub fn keys(&self) -> impl Iterator<Item = &[u8]> {
        self.entries.keys().map(|k| k.as_slice())
    }
}
