//! Coordination-store adapter.
//!
//! The whole platform coordinates through a hierarchical key/value service with
//! watch capability. The core only depends on the minimal [Store] interface;
//! two backends implement it:
//!
//! - [etcd::EtcdStore] speaks the etcd v2 keys API over HTTP and is the
//!   production backend.
//! - [mem::MemStore] keeps everything in-process and backs the test suite and
//!   store URL `mem://`.

/// etcd v2 backend
pub mod etcd;

/// In-process backend for tests and single-process fleets
pub mod mem;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

/// Errors surfaced by the coordination-store adapter.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Transport-level failure talking to the store
    #[error("store request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The store answered with an HTTP status the adapter did not expect
    #[error("unexpected store response status: {code}")]
    Status {
        /// The offending HTTP status code
        code: u16,
    },

    /// The store's response could not be decoded
    #[error("could not decode store response: {0}")]
    Decode(String),

    /// The watch stream ended and will deliver no further events
    #[error("watch stream closed")]
    Closed,
}

/// One key/value node read from the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreNode {
    /// Full key of the node
    pub key: String,
    /// Value held by the node
    pub value: String,
}

/// One write observed by a watch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreEvent {
    /// Key that was written
    pub key: String,
    /// Value that was written
    pub value: String,
}

/// A long-lived watch on a key prefix.
///
/// Delivers every write under the prefix in store arrival order. Any error is
/// terminal for this handle; callers re-establish the watch through
/// [Store::watch].
#[async_trait]
pub trait Watch: Send {
    /// Blocks until the next write under the watched prefix.
    async fn next(&mut self) -> Result<StoreEvent, StoreError>;
}

/// Minimal interface the core depends on.
///
/// The store is assumed thread-safe; one handle is shared between the
/// controller and the HTTP entry of an agent.
#[async_trait]
pub trait Store: Send + Sync {
    /// Reads a single key. `Ok(None)` means the key does not exist.
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Writes a single key, with an optional TTL after which the store
    /// expires the key on its own.
    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<(), StoreError>;

    /// Lists every node under a key prefix.
    async fn list(&self, prefix: &str) -> Result<Vec<StoreNode>, StoreError>;

    /// Opens a watch delivering every subsequent write under `prefix`.
    async fn watch(&self, prefix: &str) -> Result<Box<dyn Watch>, StoreError>;
}

/// Connects to the coordination store named by `url`.
///
/// `mem://` yields the process-wide in-memory store, everything else is
/// treated as the base URL of an etcd v2 cluster.
pub fn connect(url: &str) -> Result<Arc<dyn Store>, StoreError> {
    if url.starts_with("mem") {
        Ok(mem::shared())
    } else {
        Ok(Arc::new(etcd::EtcdStore::new(url)?))
    }
}
