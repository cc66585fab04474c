use std::collections::HashMap;
use std::sync::RwLock;

use crate::context::WriteSet;
use crate::error::{StoreError, StoreResult};
use crate::traits::StateStore;

/// In-memory, HashMap-based world state.
///
/// Intended for tests and embedding. Values are held behind a `RwLock` for
/// safe concurrent access and cloned on read.
pub struct InMemoryStateStore {
    entries: RwLock<HashMap<String, Vec<u8>>>,
}

impl InMemoryStateStore {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Number of keys currently stored.
    pub fn len(&self) -> usize {
        self.entries.read().expect("lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().expect("lock poisoned").is_empty()
    }

    /// Sorted list of all stored keys.
    pub fn keys(&self) -> Vec<String> {
        let map = self.entries.read().expect("lock poisoned");
        let mut keys: Vec<String> = map.keys().cloned().collect();
        keys.sort();
        keys
    }
}

impl Default for InMemoryStateStore {
    fn default() -> Self {
        Self::new()
    }
}

impl StateStore for InMemoryStateStore {
    fn get(&self, key: &str) -> StoreResult<Option<Vec<u8>>> {
        if key.is_empty() {
            return Err(StoreError::EmptyKey);
        }
        let map = self.entries.read().expect("lock poisoned");
        Ok(map.get(key).cloned())
    }

    fn put(&self, key: &str, value: &[u8]) -> StoreResult<()> {
        if key.is_empty() {
            return Err(StoreError::EmptyKey);
        }
        let mut map = self.entries.write().expect("lock poisoned");
        map.insert(key.to_string(), value.to_vec());
        Ok(())
    }

    fn apply(&self, writes: &WriteSet) -> StoreResult<()> {
        if writes.keys().any(str::is_empty) {
            return Err(StoreError::EmptyKey);
        }
        let mut map = self.entries.write().expect("lock poisoned");
        for (key, value) in writes.iter() {
            map.insert(key.to_string(), value.to_vec());
        }
        tracing::trace!(keys = writes.len(), "applied write set");
        Ok(())
    }
}

impl std::fmt::Debug for InMemoryStateStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryStateStore")
            .field("key_count", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_key_reads_none() {
        let store = InMemoryStateStore::new();
        assert_eq!(store.get("absent").unwrap(), None);
    }

    #[test]
    fn put_replaces_previous_value() {
        let store = InMemoryStateStore::new();
        store.put("k", b"one").unwrap();
        store.put("k", b"two").unwrap();
        assert_eq!(store.get("k").unwrap(), Some(b"two".to_vec()));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn apply_writes_everything() {
        let store = InMemoryStateStore::new();
        let mut writes = WriteSet::new();
        writes.insert("b", vec![2]);
        writes.insert("a", vec![1]);
        store.apply(&writes).unwrap();
        assert_eq!(store.keys(), vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn apply_with_empty_key_writes_nothing() {
        let store = InMemoryStateStore::new();
        let mut writes = WriteSet::new();
        writes.insert("a", vec![1]);
        writes.insert("", vec![2]);
        assert_eq!(store.apply(&writes), Err(StoreError::EmptyKey));
        assert!(store.is_empty());
    }
}
