//! Configuration validation rules.
//!
//! This module provides validation logic for `AppConfig` values
//! after they have been loaded from environment, files, or defaults.

use crate::config::AppConfig;
use thiserror::Error;
use url::Url;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },
}

fn invalid(field: &str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid { field: field.into(), reason: reason.into() }
}

/// Root-relative on the site itself; `//host/...` is protocol-relative.
fn is_site_path(path: &str) -> bool {
    path.starts_with('/') && !path.starts_with("//")
}

/// `vX.Y.Z` with numeric components.
pub(crate) fn is_semver_tag(version: &str) -> bool {
    let Some(rest) = version.strip_prefix('v') else {
        return false;
    };
    let parts: Vec<&str> = rest.split('.').collect();
    parts.len() == 3 && parts.iter().all(|p| !p.is_empty() && p.chars().all(|c| c.is_ascii_digit()))
}

/// Parse and check the site origin.
pub(crate) fn parse_origin(origin: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(origin).map_err(|e| invalid("origin", e.to_string()))?;

    match url.scheme() {
        "http" | "https" => {}
        scheme => return Err(invalid("origin", format!("unsupported scheme: {scheme}"))),
    }
    if url.host_str().is_none() {
        return Err(invalid("origin", "must include a host"));
    }
    if url.path() != "/" || url.query().is_some() {
        return Err(invalid("origin", "must not include a path or query"));
    }

    Ok(url)
}

impl AppConfig {
    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if:
    /// - `origin` is not a bare http(s) origin
    /// - `version` is not of the form `vX.Y.Z`
    /// - a cache prefix is empty, or both prefixes are equal
    /// - a manifest path or `offline_page_path` does not start with `/`, or
    ///   starts with `//`
    /// - `fetch_timeout_ms` is set and below 100ms or above 5 minutes
    /// - `max_bytes` is 0 or exceeds 50MB
    /// - `user_agent` is empty
    pub fn validate(&self) -> Result<(), ConfigError> {
        parse_origin(&self.origin)?;

        if !is_semver_tag(&self.version) {
            return Err(invalid("version", format!("expected vX.Y.Z, got {:?}", self.version)));
        }

        if self.static_prefix.is_empty() {
            return Err(invalid("static_prefix", "must not be empty"));
        }
        if self.dynamic_prefix.is_empty() {
            return Err(invalid("dynamic_prefix", "must not be empty"));
        }
        if self.static_prefix == self.dynamic_prefix {
            return Err(invalid("dynamic_prefix", "must differ from static_prefix"));
        }

        if let Some(path) = self.static_assets.iter().find(|p| !is_site_path(p)) {
            return Err(invalid("static_assets", format!("path must be root-relative: {path}")));
        }
        if !is_site_path(&self.offline_page_path) {
            return Err(invalid("offline_page_path", "must be root-relative"));
        }
        if self.network_first_paths.iter().any(String::is_empty) {
            return Err(invalid("network_first_paths", "entries must not be empty"));
        }

        if let Some(timeout_ms) = self.fetch_timeout_ms {
            if timeout_ms < 100 {
                return Err(invalid("fetch_timeout_ms", "must be at least 100ms"));
            }
            if timeout_ms > 300_000 {
                return Err(invalid("fetch_timeout_ms", "must not exceed 5 minutes (300000ms)"));
            }
        }

        if self.max_bytes == 0 {
            return Err(invalid("max_bytes", "must be greater than 0"));
        }
        if self.max_bytes > 50 * 1024 * 1024 {
            return Err(invalid("max_bytes", "must not exceed 50MB"));
        }

        if self.user_agent.is_empty() {
            return Err(invalid("user_agent", "must not be empty"));
        }

        if self.static_assets.is_empty() {
            tracing::warn!("static_assets is empty; install will not pre-cache anything");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field_of(result: Result<(), ConfigError>) -> Option<String> {
        match result {
            Err(ConfigError::Invalid { field, .. }) => Some(field),
            _ => None,
        }
    }

    #[test]
    fn test_validate_default_config() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_semver_tag() {
        assert!(is_semver_tag("v1.0.0"));
        assert!(is_semver_tag("v10.20.30"));
        assert!(!is_semver_tag("1.0.0"));
        assert!(!is_semver_tag("v1.0"));
        assert!(!is_semver_tag("v1.0.x"));
        assert!(!is_semver_tag("v1..0"));
    }

    #[test]
    fn test_validate_origin() {
        for origin in ["not a url", "ftp://blog.test", "https://blog.test/posts/", "https://blog.test/?a=1"] {
            let config = AppConfig { origin: origin.into(), ..Default::default() };
            assert_eq!(field_of(config.validate()).as_deref(), Some("origin"), "{origin}");
        }
        let config = AppConfig { origin: "https://blog.test:8443".into(), ..Default::default() };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_version() {
        let config = AppConfig { version: "1.0.0".into(), ..Default::default() };
        assert_eq!(field_of(config.validate()).as_deref(), Some("version"));
    }

    #[test]
    fn test_validate_prefixes() {
        let config = AppConfig { static_prefix: String::new(), ..Default::default() };
        assert_eq!(field_of(config.validate()).as_deref(), Some("static_prefix"));

        let config = AppConfig { dynamic_prefix: "static".into(), ..Default::default() };
        assert_eq!(field_of(config.validate()).as_deref(), Some("dynamic_prefix"));
    }

    #[test]
    fn test_validate_relative_asset_path() {
        let config = AppConfig { static_assets: vec!["/".into(), "css/app.css".into()], ..Default::default() };
        assert_eq!(field_of(config.validate()).as_deref(), Some("static_assets"));
    }

    #[test]
    fn test_validate_protocol_relative_asset_path() {
        let config = AppConfig { static_assets: vec!["/".into(), "//cdn.example/x.js".into()], ..Default::default() };
        assert_eq!(field_of(config.validate()).as_deref(), Some("static_assets"));

        let config = AppConfig { offline_page_path: "//cdn.example/offline.html".into(), ..Default::default() };
        assert_eq!(field_of(config.validate()).as_deref(), Some("offline_page_path"));
    }

    #[test]
    fn test_validate_empty_manifest_allowed() {
        let config = AppConfig { static_assets: Vec::new(), ..Default::default() };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_offline_page_path() {
        let config = AppConfig { offline_page_path: "offline.html".into(), ..Default::default() };
        assert_eq!(field_of(config.validate()).as_deref(), Some("offline_page_path"));
    }

    #[test]
    fn test_validate_timeout_bounds() {
        let config = AppConfig { fetch_timeout_ms: Some(50), ..Default::default() };
        assert_eq!(field_of(config.validate()).as_deref(), Some("fetch_timeout_ms"));

        let config = AppConfig { fetch_timeout_ms: Some(301_000), ..Default::default() };
        assert_eq!(field_of(config.validate()).as_deref(), Some("fetch_timeout_ms"));

        let config = AppConfig { fetch_timeout_ms: Some(100), ..Default::default() };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_max_bytes() {
        let config = AppConfig { max_bytes: 0, ..Default::default() };
        assert_eq!(field_of(config.validate()).as_deref(), Some("max_bytes"));

        let config = AppConfig { max_bytes: 51 * 1024 * 1024, ..Default::default() }; // 51MB
        assert_eq!(field_of(config.validate()).as_deref(), Some("max_bytes"));

        let config = AppConfig { max_bytes: 50 * 1024 * 1024, ..Default::default() }; // exactly 50MB
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_empty_user_agent() {
        let config = AppConfig { user_agent: String::new(), ..Default::default() };
        assert_eq!(field_of(config.validate()).as_deref(), Some("user_agent"));
    }
}
