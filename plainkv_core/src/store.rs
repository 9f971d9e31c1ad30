use async_trait::async_trait;
use bytes::Bytes;

pub type StoreResult<T, E = StoreError> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("key not found")]
    NotFound,
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Backend that persists envelope text keyed by caller-supplied identifiers.
///
/// Implementations must return stored payloads byte-for-byte; the envelope
/// codec assumes exact passthrough.
#[async_trait]
pub trait Store: std::fmt::Debug + Send + Sync + 'static {
    /// Stores `envelope` under `key`, replacing any previous entry.
    async fn put(&self, key: &str, envelope: Bytes) -> StoreResult<()>;

    /// Returns the envelope stored under `key`.
    async fn get(&self, key: &str) -> StoreResult<Bytes>;

    async fn exists(&self, key: &str) -> StoreResult<bool>;

    /// Removes the entry under `key`. Fails with `NotFound` if absent.
    async fn delete(&self, key: &str) -> StoreResult<()>;

    /// Returns all keys currently present in the store.
    async fn list(&self) -> StoreResult<Vec<String>>;
}
