//! Scripted fetcher and storage doubles for engine tests.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Notify;

use crate::cache::{CacheKey, CacheStorage, MemoryStorage};
use crate::config::{AppConfig, EngineConfig};
use crate::{Error, Fetcher, Request, Response};

pub const ORIGIN: &str = "https://blog.test";

pub fn config_with(f: impl FnOnce(&mut AppConfig)) -> EngineConfig {
    let mut app = AppConfig { origin: ORIGIN.into(), ..Default::default() };
    f(&mut app);
    app.engine_config().unwrap()
}

pub fn config() -> EngineConfig {
    config_with(|_| {})
}

/// Serves registered URLs, 404s everything else, and can be switched
/// offline.
#[derive(Default)]
pub struct MockFetcher {
    routes: Mutex<HashMap<String, Response>>,
    failing: Mutex<Vec<String>>,
    offline: AtomicBool,
    delay: Mutex<Option<Duration>>,
    calls: AtomicUsize,
}

impl MockFetcher {
    /// A fetcher that serves every path of the default manifest.
    pub fn serving_manifest(config: &EngineConfig) -> Self {
        let fetcher = Self::default();
        for path in &config.static_assets {
            fetcher.route(path, Response::new(200, format!("asset {path}")));
        }
        fetcher
    }

    pub fn route(&self, path: &str, response: Response) {
        let url = format!("{ORIGIN}{path}");
        self.routes.lock().unwrap().insert(url, response);
    }

    /// Make a single path fail at the network level.
    pub fn fail(&self, path: &str) {
        self.failing.lock().unwrap().push(format!("{ORIGIN}{path}"));
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = Some(delay);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn reset_calls(&self) {
        self.calls.store(0, Ordering::SeqCst);
    }
}

#[async_trait]
impl Fetcher for MockFetcher {
    async fn fetch(&self, request: &Request) -> Result<Response, Error> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let url = request.url.to_string();
        if self.offline.load(Ordering::SeqCst) || self.failing.lock().unwrap().contains(&url) {
            return Err(Error::Network(format!("offline: {url}")));
        }

        let routes = self.routes.lock().unwrap();
        Ok(routes.get(&url).cloned().unwrap_or_else(|| Response::new(404, "not found")))
    }
}

/// [`MemoryStorage`] that fails chosen operations on demand.
#[derive(Default)]
pub struct FlakyStorage {
    pub inner: MemoryStorage,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
    fail_deletes: AtomicBool,
}

impl FlakyStorage {
    pub fn fail_reads(&self, on: bool) {
        self.fail_reads.store(on, Ordering::SeqCst);
    }

    pub fn fail_writes(&self, on: bool) {
        self.fail_writes.store(on, Ordering::SeqCst);
    }

    pub fn fail_deletes(&self, on: bool) {
        self.fail_deletes.store(on, Ordering::SeqCst);
    }

    fn check(flag: &AtomicBool, op: &str) -> Result<(), Error> {
        if flag.load(Ordering::SeqCst) {
            return Err(Error::CorruptEntry(format!("{op} failed")));
        }
        Ok(())
    }
}

#[async_trait]
impl CacheStorage for FlakyStorage {
    async fn get(&self, partition: &str, key: &CacheKey) -> Result<Option<Response>, Error> {
        Self::check(&self.fail_reads, "read")?;
        self.inner.get(partition, key).await
    }

    async fn put(&self, partition: &str, key: &CacheKey, response: &Response) -> Result<(), Error> {
        Self::check(&self.fail_writes, "write")?;
        self.inner.put(partition, key, response).await
    }

    async fn put_all(&self, partition: &str, entries: Vec<(CacheKey, Response)>) -> Result<(), Error> {
        Self::check(&self.fail_writes, "write")?;
        self.inner.put_all(partition, entries).await
    }

    async fn partitions(&self) -> Result<Vec<String>, Error> {
        self.inner.partitions().await
    }

    async fn delete_partition(&self, name: &str) -> Result<bool, Error> {
        Self::check(&self.fail_deletes, "delete")?;
        self.inner.delete_partition(name).await
    }
}

/// [`MemoryStorage`] whose eviction pauses until released.
#[derive(Default)]
pub struct GatedStorage {
    pub inner: MemoryStorage,
    pub evicting: Notify,
    pub release: Notify,
}

#[async_trait]
impl CacheStorage for GatedStorage {
    async fn get(&self, partition: &str, key: &CacheKey) -> Result<Option<Response>, Error> {
        self.inner.get(partition, key).await
    }

    async fn put(&self, partition: &str, key: &CacheKey, response: &Response) -> Result<(), Error> {
        self.inner.put(partition, key, response).await
    }

    async fn put_all(&self, partition: &str, entries: Vec<(CacheKey, Response)>) -> Result<(), Error> {
        self.inner.put_all(partition, entries).await
    }

    async fn partitions(&self) -> Result<Vec<String>, Error> {
        self.inner.partitions().await
    }

    async fn delete_partition(&self, name: &str) -> Result<bool, Error> {
        self.inner.delete_partition(name).await
    }

    async fn delete_all_except(&self, keep: &[String]) -> Result<Vec<String>, Error> {
        self.evicting.notify_one();
        self.release.notified().await;
        self.inner.delete_all_except(keep).await
    }
}
