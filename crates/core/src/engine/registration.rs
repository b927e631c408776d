//! The set of engine versions deployed for one origin.
//!
//! At most one version is active and at most one is waiting. A new version
//! only replaces the active one after its install succeeded, so a failed
//! deploy never interrupts service.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use super::{CacheEngine, Intercept, LifecycleState};
use crate::cache::CacheStorage;
use crate::config::EngineConfig;
use crate::{Error, Fetcher, Request};

/// Result of a deploy or promotion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct DeployOutcome {
    pub version: String,
    pub state: LifecycleState,
    /// Partitions deleted during activation.
    pub evicted: Vec<String>,
    /// Version that was active before and has now been retired.
    pub replaced: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct VersionStatus {
    pub version: String,
    pub state: LifecycleState,
    pub static_cache: String,
    pub dynamic_cache: String,
}

impl VersionStatus {
    async fn of(engine: &CacheEngine) -> Self {
        let config = engine.config();
        Self {
            version: config.version.clone(),
            state: engine.state().await,
            static_cache: config.static_cache.clone(),
            dynamic_cache: config.dynamic_cache.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct RegistrationStatus {
    pub active: Option<VersionStatus>,
    pub waiting: Option<VersionStatus>,
}

#[derive(Default)]
struct Slots {
    active: Option<Arc<CacheEngine>>,
    waiting: Option<Arc<CacheEngine>>,
}

pub struct Registration {
    storage: Arc<dyn CacheStorage>,
    fetcher: Arc<dyn Fetcher>,
    slots: RwLock<Slots>,
}

impl Registration {
    pub fn new(storage: Arc<dyn CacheStorage>, fetcher: Arc<dyn Fetcher>) -> Self {
        Self { storage, fetcher, slots: RwLock::new(Slots::default()) }
    }

    pub fn storage(&self) -> &Arc<dyn CacheStorage> {
        &self.storage
    }

    /// The active version, if any.
    pub async fn active(&self) -> Option<Arc<CacheEngine>> {
        self.slots.read().await.active.clone()
    }

    /// Install a new version and, with skip-waiting, activate it.
    ///
    /// # Errors
    ///
    /// Returns the install error; the previously active version stays in
    /// place and keeps serving.
    pub async fn deploy(&self, config: EngineConfig) -> Result<DeployOutcome, Error> {
        let skip_waiting = config.skip_waiting;
        let engine = Arc::new(CacheEngine::new(config, self.storage.clone(), self.fetcher.clone()));

        if let Err(e) = engine.install().await {
            if let Some(active) = self.active().await {
                tracing::warn!(
                    active = %active.config().version,
                    failed = %engine.config().version,
                    "deploy failed, keeping active version"
                );
            }
            return Err(e);
        }

        if skip_waiting {
            let mut slots = self.slots.write().await;
            return Self::activate(&mut slots, engine).await;
        }

        let previous = self.slots.write().await.waiting.replace(engine.clone());
        if let Some(previous) = previous {
            previous.retire().await;
        }
        tracing::info!(version = %engine.config().version, "installed, waiting for activation");

        Ok(DeployOutcome {
            version: engine.config().version.clone(),
            state: engine.state().await,
            evicted: Vec::new(),
            replaced: None,
        })
    }

    /// Activate the waiting version.
    ///
    /// # Errors
    ///
    /// Returns `Error::NotActive` if nothing is waiting.
    pub async fn promote_waiting(&self) -> Result<DeployOutcome, Error> {
        let mut slots = self.slots.write().await;
        match slots.waiting.take() {
            Some(engine) => Self::activate(&mut slots, engine).await,
            None => Err(Error::NotActive("no version is waiting".into())),
        }
    }

    /// Make `engine` the active version.
    ///
    /// Any waiting version is older than `engine` and is retired with the
    /// outgoing active one. Both stop intercepting before eviction starts, so
    /// neither can write a partition back after it was deleted.
    async fn activate(slots: &mut Slots, engine: Arc<CacheEngine>) -> Result<DeployOutcome, Error> {
        if let Some(stale) = slots.waiting.take() {
            stale.retire().await;
        }

        let replaced = match slots.active.take() {
            Some(previous) => {
                previous.retire().await;
                Some(previous.config().version.clone())
            }
            None => None,
        };

        let evicted = engine.activate().await?;
        slots.active = Some(engine.clone());

        Ok(DeployOutcome {
            version: engine.config().version.clone(),
            state: engine.state().await,
            evicted,
            replaced,
        })
    }

    /// Route a request to the active version, or pass it through.
    pub async fn handle(&self, request: &Request) -> Result<Intercept, Error> {
        match self.active().await {
            Some(engine) => engine.handle(request).await,
            None => Ok(Intercept::Passthrough),
        }
    }

    pub async fn status(&self) -> RegistrationStatus {
        let (active, waiting) = {
            let slots = self.slots.read().await;
            (slots.active.clone(), slots.waiting.clone())
        };
        RegistrationStatus {
            active: match active {
                Some(engine) => Some(VersionStatus::of(&engine).await),
                None => None,
            },
            waiting: match waiting {
                Some(engine) => Some(VersionStatus::of(&engine).await),
                None => None,
            },
        }
    }
}
