//! In-process backend for the [Store] trait.
//!
//! Keys live in a plain map with lazy TTL expiry; watches are unbounded
//! channels fed on every write. Selected with store URL `mem://`, which lets a
//! whole fleet run in one process without an etcd cluster, and carries the
//! test suite.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use tokio::sync::mpsc;
use tokio::time::Instant;

use crate::store::{Store, StoreError, StoreEvent, StoreNode, Watch};

/// Process-wide store instance backing `mem://`. Every agent in the process
/// connects to the same map, mirroring a shared cluster.
static SHARED: Lazy<Arc<MemStore>> = Lazy::new(|| Arc::new(MemStore::new()));

/// Returns the process-wide shared instance.
pub fn shared() -> Arc<dyn Store> {
    SHARED.clone()
}

struct Entry {
    value: String,
    expires_at: Option<Instant>,
}

impl Entry {
    fn expired(&self, now: Instant) -> bool {
        matches!(self.expires_at, Some(deadline) if deadline <= now)
    }
}

/// In-memory key/value store with prefix watches.
#[derive(Default)]
pub struct MemStore {
    entries: Mutex<HashMap<String, Entry>>,
    watchers: Mutex<Vec<(String, mpsc::UnboundedSender<StoreEvent>)>>,
}

impl MemStore {
    /// Creates an empty store. Tests use private instances; production code
    /// goes through [shared].
    pub fn new() -> Self {
        Self::default()
    }

    fn notify(&self, key: &str, value: &str) {
        let mut watchers = self.watchers.lock().unwrap();
        // Dropped receivers are pruned on the way past.
        watchers.retain(|(prefix, tx)| {
            if !key.starts_with(prefix.as_str()) {
                return true;
            }
            tx.send(StoreEvent { key: key.to_string(), value: value.to_string() })
                .is_ok()
        });
    }
}

#[async_trait]
impl Store for MemStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let now = Instant::now();
        let mut entries = self.entries.lock().unwrap();

        if entries.get(key).is_some_and(|e| e.expired(now)) {
            entries.remove(key);
        }
        Ok(entries.get(key).map(|e| e.value.clone()))
    }

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<(), StoreError> {
        {
            let mut entries = self.entries.lock().unwrap();
            entries.insert(
                key.to_string(),
                Entry {
                    value: value.to_string(),
                    expires_at: ttl.map(|ttl| Instant::now() + ttl),
                },
            );
        }
        self.notify(key, value);
        Ok(())
    }

    async fn list(&self, prefix: &str) -> Result<Vec<StoreNode>, StoreError> {
        let now = Instant::now();
        let mut entries = self.entries.lock().unwrap();

        entries.retain(|_, e| !e.expired(now));

        let mut nodes: Vec<StoreNode> = entries
            .iter()
            .filter(|(key, _)| key.starts_with(prefix))
            .map(|(key, e)| StoreNode { key: key.clone(), value: e.value.clone() })
            .collect();
        nodes.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(nodes)
    }

    async fn watch(&self, prefix: &str) -> Result<Box<dyn Watch>, StoreError> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.watchers.lock().unwrap().push((prefix.to_string(), tx));
        Ok(Box::new(MemWatch { rx }))
    }
}

struct MemWatch {
    rx: mpsc::UnboundedReceiver<StoreEvent>,
}

#[async_trait]
impl Watch for MemWatch {
    async fn next(&mut self) -> Result<StoreEvent, StoreError> {
        self.rx.recv().await.ok_or(StoreError::Closed)
    }
}
