//! In-memory partitions.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::hash::CacheKey;
use super::store::CacheStorage;
use crate::{Error, Response};

type Partition = HashMap<String, Response>;

/// Process-local cache storage.
///
/// Uses a HashMap of HashMaps behind a tokio RwLock. Cloning shares the
/// underlying map.
#[derive(Clone, Default)]
pub struct MemoryStorage {
    partitions: Arc<RwLock<HashMap<String, Partition>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty partition, e.g. to simulate caches left by an older
    /// version.
    pub async fn create_partition(&self, name: &str) {
        self.partitions.write().await.entry(name.to_string()).or_default();
    }

    /// Number of entries in a partition, or `None` if it does not exist.
    pub async fn entry_count(&self, partition: &str) -> Option<usize> {
        self.partitions.read().await.get(partition).map(HashMap::len)
    }
}

#[async_trait]
impl CacheStorage for MemoryStorage {
    async fn get(&self, partition: &str, key: &CacheKey) -> Result<Option<Response>, Error> {
        let partitions = self.partitions.read().await;
        Ok(partitions.get(partition).and_then(|p| p.get(&key.hash)).cloned())
    }

    async fn put(&self, partition: &str, key: &CacheKey, response: &Response) -> Result<(), Error> {
        let mut partitions = self.partitions.write().await;
        partitions
            .entry(partition.to_string())
            .or_default()
            .insert(key.hash.clone(), response.clone());
        Ok(())
    }

    async fn put_all(&self, partition: &str, entries: Vec<(CacheKey, Response)>) -> Result<(), Error> {
        let mut partitions = self.partitions.write().await;
        let target = partitions.entry(partition.to_string()).or_default();
        for (key, response) in entries {
            target.insert(key.hash, response);
        }
        Ok(())
    }

    async fn partitions(&self) -> Result<Vec<String>, Error> {
        let mut names: Vec<String> = self.partitions.read().await.keys().cloned().collect();
        names.sort();
        Ok(names)
    }

    async fn delete_partition(&self, name: &str) -> Result<bool, Error> {
        Ok(self.partitions.write().await.remove(name).is_some())
    }
}
