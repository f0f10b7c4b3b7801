//! Insertion-ordered dictionary storage.

use rustc_hash::FxHashMap;

use super::Value;

/// Dictionary entries in insertion order with O(1) key lookup.
///
/// Keys hash by value for primitives and by identity for objects.
#[derive(Clone, Debug, Default)]
pub struct MapData {
    index: FxHashMap<Value, usize>,
    entries: Vec<(Value, Value)>,
}

impl MapData {
    /// Insert or overwrite; an overwritten key keeps its original position.
    pub fn insert(&mut self, key: Value, value: Value) {
        if let Some(&pos) = self.index.get(&key) {
            self.entries[pos].1 = value;
            return;
        }
        self.index.insert(key.clone(), self.entries.len());
        self.entries.push((key, value));
    }

    pub fn get(&self, key: &Value) -> Option<&Value> {
        self.index.get(key).map(|&pos| &self.entries[pos].1)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.index.clear();
        self.entries.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Value, &Value)> + '_ {
        self.entries.iter().map(|(k, v)| (k, v))
    }
}
