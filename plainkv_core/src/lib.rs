//! Core plainkv types: the value model, the envelope codec and the store
//! abstraction shared by all plainkv crates.
//!
//! ## Wire format (stable)
//!
//! Every stored entry is a single compact JSON object pairing a value with
//! its metadata:
//!
//! ```json
//! {"value": <json-value>, "metadata": <json-object>}
//! ```
//!
//! A top-level binary value (bytes that are not well-formed UTF-8) travels
//! as base64 with two extra markers:
//!
//! ```json
//! {"value": "<base64>", "encoding": "base64", "original_encoding": "<name>", "metadata": <json-object>}
//! ```
//!
//! The codec (`envelope::encode` / `envelope::decode`) is a pure,
//! synchronous transform with no shared state; calls may run concurrently
//! without coordination.
//!
//! ## Known limitations (wire-stable behavior)
//!
//! - Binary values nested inside lists or maps have no defined wire
//!   encoding yet; encoding such a value fails with
//!   [`EnvelopeError::UnsupportedShape`] rather than producing a lossy
//!   envelope.
//! - `original_encoding` is recorded on encode but not restored on decode;
//!   decoded binary always carries the default source-encoding tag. The
//!   payload bytes are restored exactly.
//!
//! ## Store surface
//!
//! Backends implement the async [`Store`] trait (byte-for-byte passthrough
//! keyed by caller-supplied identifiers); [`KvStore`] composes the codec
//! with a backend. The in-memory reference backend lives in
//! `plainkv_store_memory`.

pub mod encoding;
pub mod envelope;
pub mod kv;
pub mod store;
pub mod value;

// Test utilities (behind feature flag)
#[cfg(feature = "testutil")]
pub mod testutil;

// --- Core Public Surface ---

pub use envelope::{EnvelopeError, decode, encode};
pub use kv::{KvError, KvStore};
pub use store::{Store, StoreError, StoreResult};
pub use value::{Binary, Metadata, Value};
