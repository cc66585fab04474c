use std::collections::BTreeMap;

use crate::error::{StoreError, StoreResult};
use crate::traits::StateStore;

/// Pending writes of one transaction, ordered by key.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WriteSet {
    writes: BTreeMap<String, Vec<u8>>,
}

impl WriteSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Vec<u8>) {
        self.writes.insert(key.into(), value);
    }

    pub fn get(&self, key: &str) -> Option<&[u8]> {
        self.writes.get(key).map(Vec::as_slice)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[u8])> {
        self.writes.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.writes.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.writes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }

    /// BLAKE3 digest over the ordered `(key, value)` pairs.
    ///
    /// Lengths are hashed before contents, so two different write sets never
    /// feed the hasher the same byte stream.
    pub fn digest(&self) -> [u8; 32] {
        let mut hasher = blake3::Hasher::new();
        hasher.update(b"vchain-writeset-v1:");
        hasher.update(&(self.writes.len() as u64).to_le_bytes());
        for (key, value) in &self.writes {
            hasher.update(&(key.len() as u64).to_le_bytes());
            hasher.update(key.as_bytes());
            hasher.update(&(value.len() as u64).to_le_bytes());
            hasher.update(value);
        }
        *hasher.finalize().as_bytes()
    }
}

/// World-state view for one transaction.
///
/// Reads fall through to the store unless the transaction already wrote the
/// key. Writes are buffered; the caller decides whether to apply them.
pub struct TxContext<'a> {
    store: &'a dyn StateStore,
    writes: WriteSet,
    read_only: bool,
}

impl<'a> TxContext<'a> {
    /// A context for a state-changing transaction.
    pub fn new(store: &'a dyn StateStore) -> Self {
        Self {
            store,
            writes: WriteSet::new(),
            read_only: false,
        }
    }

    /// A context for a query: every write fails with [`StoreError::ReadOnly`].
    pub fn read_only(store: &'a dyn StateStore) -> Self {
        Self {
            read_only: true,
            ..Self::new(store)
        }
    }

    pub fn get_state(&self, key: &str) -> StoreResult<Option<Vec<u8>>> {
        if key.is_empty() {
            return Err(StoreError::EmptyKey);
        }
        if let Some(pending) = self.writes.get(key) {
            return Ok(Some(pending.to_vec()));
        }
        self.store.get(key)
    }

    pub fn put_state(&mut self, key: &str, value: Vec<u8>) -> StoreResult<()> {
        if key.is_empty() {
            return Err(StoreError::EmptyKey);
        }
        if self.read_only {
            return Err(StoreError::ReadOnly);
        }
        self.writes.insert(key, value);
        Ok(())
    }

    pub fn write_set(&self) -> &WriteSet {
        &self.writes
    }

    pub fn into_write_set(self) -> WriteSet {
        self.writes
    }
}
