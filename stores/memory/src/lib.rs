use bytes::Bytes;
use dashmap::DashMap;
use plainkv_core::store::{Store, StoreError, StoreResult};

#[derive(Debug)]
pub struct MemoryStore {
    entries: DashMap<String, Bytes>,
}

impl MemoryStore {
    /// Creates a new, empty `MemoryStore`.
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl Store for MemoryStore {
    /// Stores an envelope under the given key, replacing any previous entry.
    async fn put(&self, key: &str, envelope: Bytes) -> StoreResult<()> {
        self.entries.insert(key.to_owned(), envelope);
        Ok(())
    }

    /// Returns the envelope stored under the given key.
    async fn get(&self, key: &str) -> StoreResult<Bytes> {
        self.entries
            .get(key)
            .map(|entry| entry.value().clone())
            .ok_or(StoreError::NotFound)
    }

    /// Checks whether an entry exists under the given key.
    async fn exists(&self, key: &str) -> StoreResult<bool> {
        Ok(self.entries.contains_key(key))
    }

    /// Removes the entry under the given key.
    async fn delete(&self, key: &str) -> StoreResult<()> {
        self.entries.remove(key).ok_or(StoreError::NotFound)?;
        Ok(())
    }

    /// Returns all keys currently present in the store.
    async fn list(&self) -> StoreResult<Vec<String>> {
        Ok(self
            .entries
            .iter()
            .map(|entry| entry.key().clone())
            .collect())
    }
}
