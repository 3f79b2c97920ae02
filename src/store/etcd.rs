//! etcd v2 backend for the [Store] trait.
//!
//! Talks plain HTTP against the `/v2/keys` API: GET for reads and listings,
//! PUT with form-encoded `value`/`ttl` for writes, and long-polling GETs with
//! `wait=true` for watches. The watch client deliberately carries no request
//! timeout; a watch request parks server-side until something changes.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use crate::config;
use crate::store::{Store, StoreError, StoreEvent, StoreNode, Watch};

/// Store backend speaking the etcd v2 keys API.
pub struct EtcdStore {
    base: String,
    client: reqwest::Client,
    watch_client: reqwest::Client,
}

/// Response envelope of the v2 keys API.
#[derive(Debug, Deserialize)]
struct KeysResponse {
    node: Option<Node>,
}

/// One node of the v2 keys API. Directories carry `nodes`, leaves carry `value`.
#[derive(Debug, Deserialize)]
struct Node {
    key: Option<String>,
    value: Option<String>,
    nodes: Option<Vec<Node>>,
    #[serde(rename = "modifiedIndex")]
    modified_index: Option<u64>,
}

impl EtcdStore {
    /// Creates a store handle for the cluster at `url` (e.g. `http://localhost:2379`).
    pub fn new(url: &str) -> Result<Self, StoreError> {
        let client = reqwest::Client::builder()
            .timeout(config::STORE_REQUEST_TIMEOUT)
            .build()?;
        let watch_client = reqwest::Client::builder().build()?;

        Ok(Self {
            base: url.trim_end_matches('/').to_string(),
            client,
            watch_client,
        })
    }

    /// Builds the request URL for a key. Keys are used with and without a
    /// leading slash throughout the system; both map to the same etcd node.
    fn key_url(&self, key: &str) -> String {
        format!("{}/v2/keys/{}", self.base, key.trim_start_matches('/'))
    }

    async fn decode(response: reqwest::Response) -> Result<KeysResponse, StoreError> {
        let status = response.status();
        if !status.is_success() {
            return Err(StoreError::Status { code: status.as_u16() });
        }
        response
            .json::<KeysResponse>()
            .await
            .map_err(|e| StoreError::Decode(e.to_string()))
    }
}

#[async_trait]
impl Store for EtcdStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let response = self.client.get(self.key_url(key)).send().await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let decoded = Self::decode(response).await?;
        Ok(decoded.node.and_then(|n| n.value))
    }

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<(), StoreError> {
        let mut params: Vec<(&str, String)> = vec![("value", value.to_string())];
        if let Some(ttl) = ttl {
            params.push(("ttl", ttl.as_secs().max(1).to_string()));
        }

        let response = self.client.put(self.key_url(key)).form(&params).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(StoreError::Status { code: status.as_u16() });
        }
        Ok(())
    }

    async fn list(&self, prefix: &str) -> Result<Vec<StoreNode>, StoreError> {
        let url = self.key_url(prefix.trim_end_matches('/'));
        let response = self
            .client
            .get(url)
            .query(&[("recursive", "true")])
            .send()
            .await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            // Prefix has never been written to. Same as an empty directory.
            return Ok(Vec::new());
        }

        let decoded = Self::decode(response).await?;
        let mut nodes = Vec::new();
        if let Some(root) = decoded.node {
            collect_leaves(&root, &mut nodes);
        }
        Ok(nodes)
    }

    async fn watch(&self, prefix: &str) -> Result<Box<dyn Watch>, StoreError> {
        Ok(Box::new(EtcdWatch {
            url: self.key_url(prefix.trim_end_matches('/')),
            client: self.watch_client.clone(),
            next_index: None,
        }))
    }
}

/// Flattens an etcd directory tree into its leaf nodes.
fn collect_leaves(node: &Node, out: &mut Vec<StoreNode>) {
    if let (Some(key), Some(value)) = (&node.key, &node.value) {
        out.push(StoreNode { key: key.clone(), value: value.clone() });
    }
    if let Some(children) = &node.nodes {
        for child in children {
            collect_leaves(child, out);
        }
    }
}

/// Long-polling watch on one key prefix.
///
/// Tracks the last delivered `modifiedIndex` so no write between two polls is
/// missed; etcd replays from `waitIndex` onwards.
struct EtcdWatch {
    url: String,
    client: reqwest::Client,
    next_index: Option<u64>,
}

#[async_trait]
impl Watch for EtcdWatch {
    async fn next(&mut self) -> Result<StoreEvent, StoreError> {
        let mut query: Vec<(&str, String)> = vec![
            ("wait", "true".to_string()),
            ("recursive", "true".to_string()),
        ];
        if let Some(index) = self.next_index {
            query.push(("waitIndex", index.to_string()));
        }

        let response = self.client.get(&self.url).query(&query).send().await?;
        let decoded = EtcdStore::decode(response).await?;

        let node = decoded.node.ok_or(StoreError::Closed)?;
        if let Some(index) = node.modified_index {
            self.next_index = Some(index + 1);
        }

        match (node.key, node.value) {
            (Some(key), Some(value)) => Ok(StoreEvent { key, value }),
            _ => Err(StoreError::Decode("watch event without key/value".to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_url_normalizes_leading_slash() {
        let store = EtcdStore::new("http://localhost:2379/").unwrap();
        assert_eq!(
            store.key_url("/wait/0-1"),
            "http://localhost:2379/v2/keys/wait/0-1"
        );
        assert_eq!(
            store.key_url("wait/0-1"),
            "http://localhost:2379/v2/keys/wait/0-1"
        );
    }
}
