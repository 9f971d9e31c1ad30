use std::sync::Arc;

use bytes::Bytes;

use crate::envelope::{self, EnvelopeError};
use crate::store::{Store, StoreError};
use crate::value::{Metadata, Value};

#[derive(Debug, thiserror::Error)]
pub enum KvError {
    #[error(transparent)]
    Envelope(#[from] EnvelopeError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("envelope stored under '{0}' is not valid UTF-8")]
    CorruptEnvelope(String),
}

/// High-level key-value API built on top of a generic `Store`.
///
/// `KvStore` serializes values and their metadata into envelopes before
/// handing them to the backend and reconstructs them on the way out. The
/// backend only ever sees opaque envelope bytes.
#[derive(Debug, Clone)]
pub struct KvStore {
    store: Arc<dyn Store>,
}

impl KvStore {
    pub fn new<S>(store: S) -> Self
    where
        S: Store + 'static,
    {
        Self {
            store: Arc::new(store),
        }
    }

    /// Create a `KvStore` from a boxed `Store`.
    pub fn new_boxed(store: Box<dyn Store + 'static>) -> Self {
        Self {
            store: Arc::from(store),
        }
    }

    /// Encodes `value` and `metadata` into an envelope and stores it under
    /// `key`, replacing any previous entry.
    pub async fn put(&self, key: &str, value: &Value, metadata: &Metadata) -> Result<(), KvError> {
        let envelope = envelope::encode(value, metadata)?;
        self.store.put(key, Bytes::from(envelope)).await?;
        Ok(())
    }

    /// Loads the envelope stored under `key` and reconstructs the value and
    /// metadata it carries.
    pub async fn get(&self, key: &str) -> Result<(Value, Metadata), KvError> {
        let bytes = self.store.get(key).await?;
        let text = std::str::from_utf8(&bytes)
            .map_err(|_| KvError::CorruptEnvelope(key.to_owned()))?;
        match envelope::decode(text) {
            Ok(pair) => Ok(pair),
            Err(err) => {
                tracing::warn!("kvstore: envelope stored under '{key}' failed to decode: {err}");
                Err(err.into())
            }
        }
    }

    pub async fn exists(&self, key: &str) -> Result<bool, KvError> {
        Ok(self.store.exists(key).await?)
    }

    pub async fn delete(&self, key: &str) -> Result<(), KvError> {
        Ok(self.store.delete(key).await?)
    }

    pub async fn list(&self) -> Result<Vec<String>, KvError> {
        Ok(self.store.list().await?)
    }
}
