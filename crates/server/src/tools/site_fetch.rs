//! site_fetch tool implementation.
//!
//! Runs one request through the active engine version, exactly as an
//! intercepted page request would be handled. Requests the engine does not
//! intercept are fetched directly from the network.

use offcache_core::engine::{Policy, Rule};
use offcache_core::{Destination, Error, Intercept, Request, Response, Source};
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::json_result;
use crate::state::AppState;

/// Input parameters for site_fetch tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SiteFetchParams {
    /// Absolute URL, or a root-relative path on the site (e.g. `/posts/hello/`).
    pub url: String,

    /// Declared resource type: style, script, image, document or other.
    /// Inferred from the path when omitted.
    #[serde(default)]
    pub destination: Option<String>,

    /// HTTP method (default: GET).
    #[serde(default)]
    pub method: Option<String>,

    /// Include the response body as text in the output.
    #[serde(default)]
    pub include_body: bool,
}

/// Output structure for site_fetch tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SiteFetchOutput {
    /// The resolved request URL.
    pub url: String,
    /// Destination the request was classified with.
    pub destination: Destination,
    /// Whether the engine handled the request (false for cross-origin or
    /// when no version is active).
    pub intercepted: bool,
    pub policy: Option<Policy>,
    pub rule: Option<Rule>,
    /// Where the response came from; `network` for pass-through requests.
    pub source: Source,
    pub status: u16,
    pub content_type: Option<String>,
    pub bytes: usize,
    /// Body as (lossy) UTF-8 text, if requested.
    pub body: Option<String>,
}

impl SiteFetchOutput {
    fn new(request: &Request, response: &Response, source: Source, include_body: bool) -> Self {
        Self {
            url: request.url.to_string(),
            destination: request.destination,
            intercepted: false,
            policy: None,
            rule: None,
            source,
            status: response.status,
            content_type: response.content_type().map(str::to_string),
            bytes: response.body.len(),
            body: include_body.then(|| String::from_utf8_lossy(&response.body).to_string()),
        }
    }
}

/// Implementation of the site_fetch tool.
pub async fn fetch_impl(state: &AppState, params: SiteFetchParams) -> Result<CallToolResult, McpError> {
    if params.url.trim().is_empty() {
        return Err(Error::InvalidInput("url cannot be empty".into()).into());
    }

    let origin = state.origin().await?;
    let url = offcache_client::resolve(&origin, &params.url).map_err(|e| Error::InvalidUrl(e.to_string()))?;

    let destination = match params.destination.as_deref() {
        Some(d) => d.parse::<Destination>()?,
        None => Destination::infer_from_path(url.path()),
    };

    let mut request = Request::get(url, destination);
    if let Some(method) = params.method {
        request = request.with_method(method);
    }

    let output = match state.registration.handle(&request).await? {
        Intercept::Respond(served) => {
            tracing::debug!(url = %request.url, source = ?served.source, "served by engine");
            SiteFetchOutput {
                intercepted: true,
                policy: Some(served.route.policy),
                rule: Some(served.route.rule),
                ..SiteFetchOutput::new(&request, &served.response, served.source, params.include_body)
            }
        }
        Intercept::Passthrough => {
            let response = state.fetcher.fetch(&request).await?;
            SiteFetchOutput::new(&request, &response, Source::Network, params.include_body)
        }
    };

    json_result(&output)
}

#[cfg(test)]
mod tests {
    use super::super::testing::{deployed_state, output, state};
    use super::*;

    fn params(url: &str) -> SiteFetchParams {
        SiteFetchParams { url: url.into(), destination: None, method: None, include_body: true }
    }

    #[tokio::test]
    async fn test_fetch_empty_url() {
        let (state, _) = deployed_state().await;
        assert!(fetch_impl(&state, params("  ")).await.is_err());
    }

    #[tokio::test]
    async fn test_fetch_manifest_from_cache() {
        let (state, fetcher) = deployed_state().await;
        fetcher.set_offline(true);

        let result = fetch_impl(&state, params("/")).await.unwrap();
        let out: SiteFetchOutput = output(&result);
        assert!(out.intercepted);
        assert_eq!(out.source, Source::Cache);
        assert_eq!(out.policy, Some(Policy::CacheFirst));
        assert_eq!(out.body.as_deref(), Some("<h1>home</h1>"));
    }

    #[tokio::test]
    async fn test_fetch_offline_document() {
        let (state, fetcher) = deployed_state().await;
        fetcher.set_offline(true);

        let result = fetch_impl(&state, params("/2024/01/01/hello/")).await.unwrap();
        let out: SiteFetchOutput = output(&result);
        assert_eq!(out.destination, Destination::Document);
        assert_eq!(out.source, Source::OfflinePage);
        assert_eq!(out.status, 200);
        assert_eq!(out.content_type.as_deref(), Some("text/html; charset=utf-8"));
    }

    #[tokio::test]
    async fn test_fetch_explicit_destination() {
        let (state, fetcher) = deployed_state().await;
        fetcher.set_offline(true);

        let p = SiteFetchParams { destination: Some("image".into()), ..params("/medias/cover") };
        let out: SiteFetchOutput = output(&fetch_impl(&state, p).await.unwrap());
        assert_eq!(out.source, Source::PlaceholderImage);
        assert_eq!(out.content_type.as_deref(), Some("image/svg+xml"));
    }

    #[tokio::test]
    async fn test_fetch_unknown_destination() {
        let (state, _) = deployed_state().await;
        let p = SiteFetchParams { destination: Some("font".into()), ..params("/a.woff") };
        assert!(fetch_impl(&state, p).await.is_err());
    }

    #[tokio::test]
    async fn test_fetch_offline_miss_is_error() {
        let (state, fetcher) = deployed_state().await;
        fetcher.set_offline(true);
        assert!(fetch_impl(&state, params("/api/views.json")).await.is_err());
    }

    #[tokio::test]
    async fn test_fetch_without_deploy_passes_through() {
        let (state, _) = state().await;

        let out: SiteFetchOutput = output(&fetch_impl(&state, params("/")).await.unwrap());
        assert!(!out.intercepted);
        assert_eq!(out.source, Source::Network);
        assert_eq!(out.status, 200);
    }
}
