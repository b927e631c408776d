//! The storage seam between the engine and whatever holds the partitions.

use async_trait::async_trait;

use super::hash::CacheKey;
use crate::{Error, Response};

/// Named partitions of request-identity → response entries.
///
/// Implementations must make each individual call atomic; the engine never
/// needs read-modify-write across calls. Overlapping `put`s to the same key
/// are last-write-wins.
#[async_trait]
pub trait CacheStorage: Send + Sync {
    /// Look up an entry. A missing partition is a miss, not an error.
    async fn get(&self, partition: &str, key: &CacheKey) -> Result<Option<Response>, Error>;

    /// Store an entry, creating the partition if needed.
    async fn put(&self, partition: &str, key: &CacheKey, response: &Response) -> Result<(), Error>;

    /// Store all entries or none of them. An empty batch still succeeds.
    async fn put_all(&self, partition: &str, entries: Vec<(CacheKey, Response)>) -> Result<(), Error>;

    /// Names of every existing partition.
    async fn partitions(&self) -> Result<Vec<String>, Error>;

    /// Drop a partition and its entries. Returns whether it existed.
    async fn delete_partition(&self, name: &str) -> Result<bool, Error>;

    /// Drop every partition not named in `keep`. Returns the dropped names.
    async fn delete_all_except(&self, keep: &[String]) -> Result<Vec<String>, Error> {
        let mut deleted = Vec::new();
        for name in self.partitions().await? {
            if keep.contains(&name) {
                continue;
            }
            if self.delete_partition(&name).await? {
                deleted.push(name);
            }
        }
        Ok(deleted)
    }
}
