//! Test utilities for `Store` implementations.
//!
//! This module provides a conformance suite that can be run against any
//! `Store` implementation to verify the passthrough contract the envelope
//! codec relies on.
//!
//! # Usage
//!
//! In your store crate's `Cargo.toml`:
//!
//! ```toml
//! [dev-dependencies]
//! plainkv_core = { workspace = true, features = ["testutil"] }
//! ```
//!
//! In your test file:
//!
//! ```ignore
//! use plainkv_core::testutil::StoreTests;
//!
//! #[tokio::test]
//! async fn test_my_store() {
//!     let store = MyStore::new(...);
//!     StoreTests::new(&store).run_all().await.unwrap();
//! }
//! ```

use crate::store::{Store, StoreError, StoreResult};
use bytes::Bytes;
use rand::Rng;

/// Returns `len` random bytes guaranteed to fail UTF-8 validation.
///
/// Useful for exercising binary envelope payloads without shipping fixture
/// files.
pub fn invalid_utf8(len: usize) -> Bytes {
    let mut bytes = vec![0u8; len.max(1)];
    rand::rng().fill(&mut bytes[..]);
    // 0xff can never appear in well-formed UTF-8.
    bytes[0] = 0xff;
    Bytes::from(bytes)
}

/// Conformance suite for `Store` implementations.
pub struct StoreTests<'a, S> {
    store: &'a S,
    /// Prefix for test keys to avoid conflicts
    prefix: String,
}

impl<'a, S: Store> StoreTests<'a, S> {
    /// Create a new test suite for the given store.
    pub fn new(store: &'a S) -> Self {
        let prefix = format!("_test_{}/", rand::rng().random::<u32>());
        Self { store, prefix }
    }

    /// Create a new test suite with a custom key prefix.
    pub fn with_prefix(store: &'a S, prefix: impl Into<String>) -> Self {
        Self {
            store,
            prefix: prefix.into(),
        }
    }

    fn key(&self, name: &str) -> String {
        format!("{}{}", self.prefix, name)
    }

    /// Run all tests.
    pub async fn run_all(&self) -> StoreResult<()> {
        self.test_put_get().await?;
        self.test_binary_passthrough().await?;
        self.test_overwrite().await?;
        self.test_exists().await?;
        self.test_missing_key().await?;
        self.test_delete().await?;
        self.test_list().await?;
        self.cleanup().await?;
        Ok(())
    }

    /// Test that stored payloads come back byte-for-byte.
    pub async fn test_put_get(&self) -> StoreResult<()> {
        let key = self.key("envelope");
        let payload = Bytes::from_static(br#"{"value":true,"metadata":{}}"#);

        self.store.put(&key, payload.clone()).await?;
        let retrieved = self.store.get(&key).await?;
        assert_eq!(retrieved, payload, "retrieved payload should match");
        Ok(())
    }

    /// Test passthrough of payloads that are not valid text.
    pub async fn test_binary_passthrough(&self) -> StoreResult<()> {
        let key = self.key("binary");
        let payload = invalid_utf8(4096);

        self.store.put(&key, payload.clone()).await?;
        let retrieved = self.store.get(&key).await?;
        assert_eq!(retrieved, payload, "binary payload should pass through");
        Ok(())
    }

    /// Test that put replaces an existing entry.
    pub async fn test_overwrite(&self) -> StoreResult<()> {
        let key = self.key("overwrite");
        self.store.put(&key, Bytes::from_static(b"first")).await?;
        self.store.put(&key, Bytes::from_static(b"second")).await?;

        let retrieved = self.store.get(&key).await?;
        assert_eq!(retrieved, Bytes::from_static(b"second"));
        Ok(())
    }

    pub async fn test_exists(&self) -> StoreResult<()> {
        let key = self.key("exists");
        assert!(!self.store.exists(&key).await?);
        self.store.put(&key, Bytes::from_static(b"x")).await?;
        assert!(self.store.exists(&key).await?);
        Ok(())
    }

    /// Test that a missing key reports `NotFound`.
    pub async fn test_missing_key(&self) -> StoreResult<()> {
        let key = self.key("never_written");
        let result = self.store.get(&key).await;
        assert!(
            matches!(result, Err(StoreError::NotFound)),
            "get of a missing key should be NotFound"
        );
        let result = self.store.delete(&key).await;
        assert!(
            matches!(result, Err(StoreError::NotFound)),
            "delete of a missing key should be NotFound"
        );
        Ok(())
    }

    pub async fn test_delete(&self) -> StoreResult<()> {
        let key = self.key("delete");
        self.store.put(&key, Bytes::from_static(b"x")).await?;
        self.store.delete(&key).await?;
        assert!(!self.store.exists(&key).await?);
        Ok(())
    }

    /// Test that list returns every key written under the test prefix.
    pub async fn test_list(&self) -> StoreResult<()> {
        let keys = [self.key("list_a"), self.key("list_b"), self.key("list_c")];
        for key in &keys {
            self.store.put(key, Bytes::from_static(b"x")).await?;
        }

        let listed = self.store.list().await?;
        for key in &keys {
            assert!(listed.contains(key), "list should contain {key}");
        }
        Ok(())
    }

    /// Remove everything written under the test prefix.
    async fn cleanup(&self) -> StoreResult<()> {
        for key in self.store.list().await? {
            if key.starts_with(&self.prefix) {
                self.store.delete(&key).await?;
            }
        }
        Ok(())
    }
}
