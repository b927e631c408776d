//! Shared server state.

use std::sync::Arc;

use offcache_core::{AppConfig, CacheDb, Fetcher, Registration};

/// Everything a tool call needs.
pub struct AppState {
    /// Configuration loaded at startup; deploys derive from it.
    pub config: AppConfig,
    pub db: CacheDb,
    pub fetcher: Arc<dyn Fetcher>,
    pub registration: Registration,
}

impl AppState {
    pub fn new(config: AppConfig, db: CacheDb, fetcher: Arc<dyn Fetcher>) -> Self {
        let registration = Registration::new(Arc::new(db.clone()), fetcher.clone());
        Self { config, db, fetcher, registration }
    }

    /// Origin of the active version, falling back to the configured one.
    pub async fn origin(&self) -> Result<url::Url, offcache_core::Error> {
        if let Some(engine) = self.registration.active().await {
            return Ok(engine.config().origin.clone());
        }
        url::Url::parse(&self.config.origin).map_err(|e| offcache_core::Error::InvalidUrl(e.to_string()))
    }
}
