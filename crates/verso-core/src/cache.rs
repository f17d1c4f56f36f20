//! Content cache for fetched file data.
//!
//! Blobs identified by a stable content id (e.g. blob hash) are checked in
//! the cache before every fetch and written through after. Keys are
//! namespaced per backend so multiple sessions can share one store.

use std::collections::HashMap;

use bytes::Bytes;
use tokio::sync::RwLock;

/// Builds the namespaced cache key for a backend.
pub fn cache_key(backend: &str, key: &str) -> String {
    format!("{backend}.{key}")
}

/// Pluggable content cache.
#[async_trait::async_trait]
pub trait CacheStore: Send + Sync {
    /// Looks up a previously stored value.
    async fn get(&self, key: &str) -> Option<Bytes>;

    /// Stores a value, replacing any previous one.
    async fn set(&self, key: &str, value: Bytes);
}

/// In-memory cache, the default store for tests and embedders without
/// persistent storage.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: RwLock<HashMap<String, Bytes>>,
}

impl MemoryCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl CacheStore for MemoryCache {
    async fn get(&self, key: &str) -> Option<Bytes> {
        self.entries.read().await.get(key).cloned()
    }

    async fn set(&self, key: &str, value: Bytes) {
        self.entries.write().await.insert(key.to_owned(), value);
    }
}
