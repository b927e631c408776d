//! The cache strategy engine.
//!
//! One [`CacheEngine`] is one deployed version: an immutable
//! [`EngineConfig`], the shared partitions, and the network. It installs
//! (pre-caches the manifest), activates (evicts other versions' partitions),
//! and then answers requests:
//!
//! - cache-first: partition hit, else network with write-through, else a
//!   placeholder SVG for images
//! - network-first: network with write-through, else the dynamic partition,
//!   else an offline page for documents
//!
//! Cache writes are best-effort and never fail the request that caused them.

pub mod classify;
pub mod lifecycle;
pub mod registration;

#[cfg(test)]
pub(crate) mod testing;

use std::sync::Arc;

use futures::future::try_join_all;
use serde::{Deserialize, Serialize};

use crate::cache::{CacheKey, CacheStorage};
use crate::config::EngineConfig;
use crate::{Destination, Error, Fetcher, Request, Response, fallback};

pub use classify::{PartitionKind, Policy, Route, Rule, classify};
pub use lifecycle::{Lifecycle, LifecycleState};
pub use registration::{DeployOutcome, Registration, RegistrationStatus, VersionStatus};

/// Where a served response came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    Cache,
    Network,
    OfflinePage,
    PlaceholderImage,
}

/// A response the engine produced for an intercepted request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Served {
    pub response: Response,
    pub source: Source,
    pub route: Route,
}

/// Outcome of handing a request to the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intercept {
    /// Not ours; the host should perform the request normally.
    Passthrough,
    Respond(Served),
}

impl Intercept {
    pub fn served(&self) -> Option<&Served> {
        match self {
            Intercept::Passthrough => None,
            Intercept::Respond(served) => Some(served),
        }
    }
}

/// One engine version.
pub struct CacheEngine {
    config: Arc<EngineConfig>,
    storage: Arc<dyn CacheStorage>,
    fetcher: Arc<dyn Fetcher>,
    lifecycle: Lifecycle,
}

impl CacheEngine {
    pub fn new(config: EngineConfig, storage: Arc<dyn CacheStorage>, fetcher: Arc<dyn Fetcher>) -> Self {
        Self { config: Arc::new(config), storage, fetcher, lifecycle: Lifecycle::default() }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub async fn state(&self) -> LifecycleState {
        self.lifecycle.get().await
    }

    pub fn partition_name(&self, kind: PartitionKind) -> &str {
        match kind {
            PartitionKind::Static => &self.config.static_cache,
            PartitionKind::Dynamic => &self.config.dynamic_cache,
        }
    }

    /// Pre-cache the whole manifest into the static partition.
    ///
    /// Every asset is fetched before anything is written, and the write is a
    /// single atomic batch, so a failure leaves the partition untouched. On
    /// failure the version becomes redundant.
    pub async fn install(&self) -> Result<(), Error> {
        self.lifecycle
            .advance(LifecycleState::Parsed, LifecycleState::Installing)
            .await?;

        match self.precache().await {
            Ok(count) => {
                self.lifecycle
                    .advance(LifecycleState::Installing, LifecycleState::Installed)
                    .await?;
                tracing::info!(
                    version = %self.config.version,
                    cache = %self.config.static_cache,
                    assets = count,
                    "installed"
                );
                Ok(())
            }
            Err(e) => {
                self.lifecycle.retire().await;
                tracing::error!(version = %self.config.version, error = %e, "install failed");
                Err(e)
            }
        }
    }

    async fn precache(&self) -> Result<usize, Error> {
        let requests = self
            .config
            .static_assets
            .iter()
            .map(|path| {
                self.config
                    .resolve(path)
                    .map(|url| Request::get(url, Destination::Other))
                    .map_err(|e| Error::InvalidUrl(format!("{path}: {e}")))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let entries = try_join_all(requests.iter().map(|request| async move {
            match self.fetch_network(request).await {
                Ok(response) if response.is_success() => Ok((CacheKey::for_request(request), response)),
                Ok(response) => Err(Error::InstallFailed {
                    url: request.url.to_string(),
                    reason: format!("status {}", response.status),
                }),
                Err(e) => Err(Error::InstallFailed { url: request.url.to_string(), reason: e.to_string() }),
            }
        }))
        .await?;

        let count = entries.len();
        self.storage.put_all(&self.config.static_cache, entries).await?;
        Ok(count)
    }

    /// Evict every partition this version does not own, then take control.
    ///
    /// Returns the names of the evicted partitions. An eviction failure is
    /// logged and does not prevent activation.
    pub async fn activate(&self) -> Result<Vec<String>, Error> {
        self.lifecycle
            .advance(LifecycleState::Installed, LifecycleState::Activating)
            .await?;

        let keep = self.config.current_caches();
        let evicted = match self.storage.delete_all_except(&keep).await {
            Ok(evicted) => evicted,
            Err(e) => {
                tracing::warn!(version = %self.config.version, error = %e, "cache eviction failed");
                Vec::new()
            }
        };
        for name in &evicted {
            tracing::info!(cache = %name, "deleted old cache");
        }

        self.lifecycle
            .advance(LifecycleState::Activating, LifecycleState::Activated)
            .await?;
        tracing::info!(version = %self.config.version, "activated; claimed clients");

        Ok(evicted)
    }

    /// Mark this version superseded.
    pub async fn retire(&self) {
        self.lifecycle.retire().await;
        tracing::info!(version = %self.config.version, "retired");
    }

    /// Handle one intercepted request.
    ///
    /// Returns `Passthrough` for cross-origin requests and when this version
    /// is not activated. Returns `Err` only when neither network, cache nor a
    /// synthetic fallback can answer.
    pub async fn handle(&self, request: &Request) -> Result<Intercept, Error> {
        let Some(route) = classify(&self.config, request) else {
            tracing::trace!(url = %request.url, "cross-origin, not intercepted");
            return Ok(Intercept::Passthrough);
        };

        let state = self.state().await;
        if state != LifecycleState::Activated {
            tracing::debug!(url = %request.url, %state, "version not active, not intercepted");
            return Ok(Intercept::Passthrough);
        }

        tracing::debug!(
            url = %request.url,
            destination = %request.destination,
            policy = ?route.policy,
            rule = ?route.rule,
            "intercepted"
        );

        let served = match route.policy {
            Policy::CacheFirst => self.cache_first(request, route).await?,
            Policy::NetworkFirst => self.network_first(request, route).await?,
        };

        Ok(Intercept::Respond(served))
    }

    async fn cache_first(&self, request: &Request, route: Route) -> Result<Served, Error> {
        let partition = self.partition_name(route.partition);
        let key = CacheKey::for_request(request);

        if let Some(response) = self.lookup(partition, &key).await {
            tracing::debug!(url = %request.url, cache = %partition, "cache hit");
            return Ok(Served { response, source: Source::Cache, route });
        }

        match self.fetch_network(request).await {
            Ok(response) => {
                if response.is_success() && route.writes_through(&self.config) {
                    self.write_through(partition, request, &key, &response).await;
                }
                Ok(Served { response, source: Source::Network, route })
            }
            Err(e) if e.is_network() && request.destination == Destination::Image => {
                tracing::warn!(url = %request.url, error = %e, "image unavailable, serving placeholder");
                let response = fallback::placeholder_image(&self.config.placeholder_caption);
                Ok(Served { response, source: Source::PlaceholderImage, route })
            }
            Err(e) => Err(e),
        }
    }

    async fn network_first(&self, request: &Request, route: Route) -> Result<Served, Error> {
        let partition = self.partition_name(route.partition);
        let key = CacheKey::for_request(request);

        let err = match self.fetch_network(request).await {
            Ok(response) => {
                if response.is_success() && route.writes_through(&self.config) {
                    self.write_through(partition, request, &key, &response).await;
                }
                return Ok(Served { response, source: Source::Network, route });
            }
            Err(e) if !e.is_network() => return Err(e),
            Err(e) => e,
        };

        tracing::debug!(url = %request.url, error = %err, "network failed, trying cache");

        if let Some(response) = self.lookup(partition, &key).await {
            return Ok(Served { response, source: Source::Cache, route });
        }

        if request.destination != Destination::Document {
            return Err(err);
        }

        let response = match self.cached_offline_page().await {
            Some(page) => page,
            None => fallback::offline_page(&self.config.offline_page),
        };
        tracing::warn!(url = %request.url, "serving offline page");
        Ok(Served { response, source: Source::OfflinePage, route })
    }

    /// A previously cached offline page in the dynamic partition, if any.
    async fn cached_offline_page(&self) -> Option<Response> {
        let url = self.config.resolve(&self.config.offline_page_path).ok()?;
        let key = CacheKey::new("GET", &url);
        self.lookup(&self.config.dynamic_cache, &key).await
    }

    /// Partition read; a storage error counts as a miss.
    async fn lookup(&self, partition: &str, key: &CacheKey) -> Option<Response> {
        match self.storage.get(partition, key).await {
            Ok(hit) => hit,
            Err(e) => {
                tracing::warn!(cache = %partition, url = %key.url, error = %e, "cache read failed");
                None
            }
        }
    }

    async fn write_through(&self, partition: &str, request: &Request, key: &CacheKey, response: &Response) {
        if !request.is_get() {
            tracing::debug!(url = %request.url, method = %request.method, "only GET responses are cached");
            return;
        }
        if self.state().await != LifecycleState::Activated {
            tracing::debug!(url = %request.url, cache = %partition, "version retired mid-request, not storing");
            return;
        }
        if let Err(e) = self.storage.put(partition, key, response).await {
            tracing::warn!(cache = %partition, url = %request.url, error = %e, "cache write failed");
        }
    }

    async fn fetch_network(&self, request: &Request) -> Result<Response, Error> {
        let fetch = self.fetcher.fetch(request);
        match self.config.fetch_timeout {
            Some(limit) => tokio::time::timeout(limit, fetch).await.map_err(|_| {
                Error::FetchTimeout(format!("{} after {}ms", request.url, limit.as_millis()))
            })?,
            None => fetch.await,
        }
    }
}
