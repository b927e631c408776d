//! Immutable per-version engine configuration.

use std::time::Duration;

use url::Url;

use super::validation::parse_origin;
use super::{AppConfig, ConfigError, OfflinePageText};

/// Everything one engine version needs, frozen at construction.
///
/// Two engines with different `EngineConfig`s can live in the same process,
/// which is how a redeploy is modelled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    pub origin: Url,
    pub version: String,
    pub static_cache: String,
    pub dynamic_cache: String,
    pub static_assets: Vec<String>,
    pub network_first_paths: Vec<String>,
    pub offline_page_path: String,
    pub cache_unclassified: bool,
    pub skip_waiting: bool,
    pub fetch_timeout: Option<Duration>,
    pub offline_page: OfflinePageText,
    pub placeholder_caption: String,
}

impl EngineConfig {
    pub(crate) fn from_app(app: &AppConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            origin: parse_origin(&app.origin)?,
            version: app.version.clone(),
            static_cache: app.static_cache_name(),
            dynamic_cache: app.dynamic_cache_name(),
            static_assets: app.static_assets.clone(),
            network_first_paths: app.network_first_paths.clone(),
            offline_page_path: app.offline_page_path.clone(),
            cache_unclassified: app.cache_unclassified,
            skip_waiting: app.skip_waiting,
            fetch_timeout: app.fetch_timeout(),
            offline_page: app.offline_page.clone(),
            placeholder_caption: app.placeholder_caption.clone(),
        })
    }

    /// Names of the partitions this version owns. Everything else is evicted
    /// on activation.
    pub fn current_caches(&self) -> [String; 2] {
        [self.static_cache.clone(), self.dynamic_cache.clone()]
    }

    /// Resolve a root-relative path against the origin.
    pub fn resolve(&self, path: &str) -> Result<Url, url::ParseError> {
        self.origin.join(path)
    }

    pub fn is_manifest_path(&self, path: &str) -> bool {
        self.static_assets.iter().any(|p| p == path)
    }

    pub fn is_network_first_path(&self, path: &str) -> bool {
        self.network_first_paths.iter().any(|p| path.contains(p.as_str()))
    }
}
