//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (OFFCACHE_*)
//! 2. TOML config file (if OFFCACHE_CONFIG_FILE set)
//! 3. Built-in defaults
//!
//! [`AppConfig`] is the loaded, mutable-at-startup view. The engine never sees
//! it directly; it receives an immutable [`EngineConfig`] derived from it.

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

mod engine;
mod validation;

pub use engine::EngineConfig;
pub use validation::ConfigError;

/// Text shown on the synthesized offline page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OfflinePageText {
    /// Value of the `lang` attribute on the `<html>` element.
    #[serde(default = "default_lang")]
    pub lang: String,

    /// Document title and heading.
    #[serde(default = "default_offline_title")]
    pub title: String,

    /// Paragraph under the heading.
    #[serde(default = "default_offline_message")]
    pub message: String,

    /// Label of the reload button.
    #[serde(default = "default_reload_label")]
    pub reload_label: String,
}

fn default_lang() -> String {
    "en".into()
}

fn default_offline_title() -> String {
    "You are offline".into()
}

fn default_offline_message() -> String {
    "This page is not available offline. Check your connection and try again.".into()
}

fn default_reload_label() -> String {
    "Reload".into()
}

impl Default for OfflinePageText {
    fn default() -> Self {
        Self {
            lang: default_lang(),
            title: default_offline_title(),
            message: default_offline_message(),
            reload_label: default_reload_label(),
        }
    }
}

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (OFFCACHE_*)
/// 2. TOML config file (if OFFCACHE_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Origin of the site being served, e.g. `https://blog.example.com`.
    ///
    /// Set via OFFCACHE_ORIGIN environment variable.
    #[serde(default = "default_origin")]
    pub origin: String,

    /// Cache version suffix (`vX.Y.Z`). Changing it is the only way to force
    /// invalidation on redeploy.
    ///
    /// Set via OFFCACHE_VERSION environment variable.
    #[serde(default = "default_version")]
    pub version: String,

    /// Name prefix of the static partition.
    #[serde(default = "default_static_prefix")]
    pub static_prefix: String,

    /// Name prefix of the dynamic partition.
    #[serde(default = "default_dynamic_prefix")]
    pub dynamic_prefix: String,

    /// Root-relative paths pre-cached on install.
    ///
    /// Set via OFFCACHE_STATIC_ASSETS as a TOML array, e.g. `["/","/favicon.png"]`.
    #[serde(default = "default_static_assets")]
    pub static_assets: Vec<String>,

    /// Path substrings that are always served network-first.
    #[serde(default = "default_network_first_paths")]
    pub network_first_paths: Vec<String>,

    /// Cached page preferred over the synthesized offline page.
    #[serde(default = "default_offline_page_path")]
    pub offline_page_path: String,

    /// Whether unclassified (non-document, non-static) responses are written
    /// to the dynamic partition.
    #[serde(default = "default_true")]
    pub cache_unclassified: bool,

    /// Activate a freshly installed version without waiting for old clients.
    #[serde(default = "default_true")]
    pub skip_waiting: bool,

    /// Optional upper bound on each network fetch, in milliseconds.
    ///
    /// Set via OFFCACHE_FETCH_TIMEOUT_MS environment variable. Unset means no
    /// timeout.
    #[serde(default)]
    pub fetch_timeout_ms: Option<u64>,

    /// Path to SQLite cache database.
    ///
    /// Set via OFFCACHE_DB_PATH environment variable.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// User-Agent string for HTTP requests.
    ///
    /// Set via OFFCACHE_USER_AGENT environment variable.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Maximum bytes to fetch per request.
    ///
    /// Set via OFFCACHE_MAX_BYTES environment variable.
    #[serde(default = "default_max_bytes")]
    pub max_bytes: usize,

    /// Offline page text.
    #[serde(default)]
    pub offline_page: OfflinePageText,

    /// Caption of the placeholder image.
    #[serde(default = "default_placeholder_caption")]
    pub placeholder_caption: String,
}

fn default_origin() -> String {
    "http://localhost:4000".into()
}

fn default_version() -> String {
    "v1.0.0".into()
}

fn default_static_prefix() -> String {
    "static".into()
}

fn default_dynamic_prefix() -> String {
    "dynamic".into()
}

fn default_static_assets() -> Vec<String> {
    [
        "/",
        "/css/matery.css",
        "/css/performance-optimization.css",
        "/js/matery.js",
        "/js/performance-optimization.js",
        "/libs/jquery/jquery-3.6.0.min.js",
        "/libs/materialize/materialize.min.js",
        "/medias/logo.png",
        "/favicon.png",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_network_first_paths() -> Vec<String> {
    ["/search.xml", "/atom.xml", "/sitemap.xml"].into_iter().map(String::from).collect()
}

fn default_offline_page_path() -> String {
    "/offline.html".into()
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./offcache.sqlite")
}

fn default_user_agent() -> String {
    "offcache/0.1".into()
}

fn default_max_bytes() -> usize {
    5_242_880 // 5MB
}

fn default_placeholder_caption() -> String {
    "Image failed to load".into()
}

fn default_true() -> bool {
    true
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            origin: default_origin(),
            version: default_version(),
            static_prefix: default_static_prefix(),
            dynamic_prefix: default_dynamic_prefix(),
            static_assets: default_static_assets(),
            network_first_paths: default_network_first_paths(),
            offline_page_path: default_offline_page_path(),
            cache_unclassified: true,
            skip_waiting: true,
            fetch_timeout_ms: None,
            db_path: default_db_path(),
            user_agent: default_user_agent(),
            max_bytes: default_max_bytes(),
            offline_page: OfflinePageText::default(),
            placeholder_caption: default_placeholder_caption(),
        }
    }
}

impl AppConfig {
    /// Fetch timeout as Duration, if one is configured.
    pub fn fetch_timeout(&self) -> Option<Duration> {
        self.fetch_timeout_ms.map(Duration::from_millis)
    }

    /// Current static partition name, e.g. `static-v1.0.0`.
    pub fn static_cache_name(&self) -> String {
        format!("{}-{}", self.static_prefix, self.version)
    }

    /// Current dynamic partition name, e.g. `dynamic-v1.0.0`.
    pub fn dynamic_cache_name(&self) -> String {
        format!("{}-{}", self.dynamic_prefix, self.version)
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `OFFCACHE_`
    /// 2. TOML file from `OFFCACHE_CONFIG_FILE` (if set)
    /// 3. Built-in defaults via `Default::default()`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("OFFCACHE_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("OFFCACHE_")
                .ignore(&["CONFIG_FILE"])
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }

    /// Validate and freeze this configuration for an engine version.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if validation fails.
    pub fn engine_config(&self) -> Result<EngineConfig, ConfigError> {
        self.validate()?;
        EngineConfig::from_app(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.origin, "http://localhost:4000");
        assert_eq!(config.version, "v1.0.0");
        assert_eq!(config.db_path, PathBuf::from("./offcache.sqlite"));
        assert_eq!(config.user_agent, "offcache/0.1");
        assert_eq!(config.max_bytes, 5_242_880);
        assert_eq!(config.static_assets.len(), 9);
        assert_eq!(config.static_assets[0], "/");
        assert_eq!(config.network_first_paths, vec!["/search.xml", "/atom.xml", "/sitemap.xml"]);
        assert!(config.cache_unclassified);
        assert!(config.skip_waiting);
        assert!(config.fetch_timeout().is_none());
    }

    #[test]
    fn test_cache_names() {
        let config = AppConfig { version: "v2.3.4".into(), ..Default::default() };
        assert_eq!(config.static_cache_name(), "static-v2.3.4");
        assert_eq!(config.dynamic_cache_name(), "dynamic-v2.3.4");
    }

    #[test]
    fn test_fetch_timeout_duration() {
        let config = AppConfig { fetch_timeout_ms: Some(1500), ..Default::default() };
        assert_eq!(config.fetch_timeout(), Some(Duration::from_millis(1500)));
    }

    #[test]
    fn test_load_from_env() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("OFFCACHE_ORIGIN", "https://blog.test");
            jail.set_env("OFFCACHE_VERSION", "v2.0.0");
            jail.set_env("OFFCACHE_FETCH_TIMEOUT_MS", "2500");
            jail.set_env("OFFCACHE_OFFLINE_PAGE__TITLE", "Offline");

            let config = AppConfig::load().map_err(|e| e.to_string())?;
            assert_eq!(config.origin, "https://blog.test");
            assert_eq!(config.version, "v2.0.0");
            assert_eq!(config.fetch_timeout_ms, Some(2500));
            assert_eq!(config.offline_page.title, "Offline");
            assert_eq!(config.offline_page.reload_label, "Reload");
            Ok(())
        });
    }

    #[test]
    fn test_load_from_toml_file() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                "offcache.toml",
                r#"
                origin = "https://toml.test"
                static_assets = ["/", "/app.css"]
                skip_waiting = false
                "#,
            )?;
            jail.set_env("OFFCACHE_CONFIG_FILE", "offcache.toml");
            jail.set_env("OFFCACHE_ORIGIN", "https://env.test");

            let config = AppConfig::load().map_err(|e| e.to_string())?;
            assert_eq!(config.origin, "https://env.test");
            assert_eq!(config.static_assets, vec!["/", "/app.css"]);
            assert!(!config.skip_waiting);
            Ok(())
        });
    }

    #[test]
    fn test_load_rejects_invalid_version() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("OFFCACHE_VERSION", "latest");
            let result = AppConfig::load();
            assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "version"));
            Ok(())
        });
    }
}
