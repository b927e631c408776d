//! HTTP fetch pipeline backing the cache engine.
//!
//! ### Behaviour
//! - Any HTTP status is returned as a response; only transport failures
//!   (DNS, connect, reset, timeout) are errors
//! - Max redirects: 5
//! - Max body bytes: 5MB (configurable)
//! - Optional per-request timeout (none by default)
//! - `Accept` and `Sec-Fetch-Dest` follow the request's destination

pub mod url;

use async_trait::async_trait;
use reqwest::{Client, Method, header};
use std::time::{Duration, Instant};

pub use self::url::{UrlError, canonicalize, resolve};

use offcache_core::{AppConfig, Destination, Error, Fetcher, Request, Response};

/// Configuration for the fetch client.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// User agent string (default: "offcache/0.1")
    pub user_agent: String,

    /// Maximum response body size in bytes (default: 5MB)
    pub max_bytes: usize,

    /// Request timeout (default: none)
    pub timeout: Option<Duration>,

    /// Maximum number of redirects to follow (default: 5)
    pub max_redirects: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self { user_agent: "offcache/0.1".to_string(), max_bytes: 5 * 1024 * 1024, timeout: None, max_redirects: 5 }
    }
}

impl FetchConfig {
    pub fn from_app(app: &AppConfig) -> Self {
        Self {
            user_agent: app.user_agent.clone(),
            max_bytes: app.max_bytes,
            timeout: app.fetch_timeout(),
            ..Default::default()
        }
    }
}

fn accept_for(destination: Destination) -> &'static str {
    match destination {
        Destination::Document => "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
        Destination::Style => "text/css,*/*;q=0.1",
        Destination::Image => "image/avif,image/webp,image/apng,image/svg+xml,image/*,*/*;q=0.8",
        Destination::Script | Destination::Other => "*/*",
    }
}

fn fetch_dest(destination: Destination) -> &'static str {
    match destination {
        Destination::Other => "empty",
        other => other.as_str(),
    }
}

/// Network fetcher for the cache engine.
pub struct HttpFetcher {
    http: Client,
    config: FetchConfig,
}

impl HttpFetcher {
    /// Create a new fetcher with the given configuration.
    pub fn new(config: FetchConfig) -> Result<Self, Error> {
        let mut builder = Client::builder()
            .user_agent(&config.user_agent)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .use_rustls_tls()
            .gzip(true)
            .brotli(true)
            .deflate(true);

        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }

        let http = builder
            .build()
            .map_err(|e| Error::Network(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { http, config })
    }

    /// Get reference to the configuration.
    pub fn config(&self) -> &FetchConfig {
        &self.config
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, request: &Request) -> Result<Response, Error> {
        let start = Instant::now();

        let method = Method::from_bytes(request.method.as_bytes())
            .map_err(|_| Error::InvalidInput(format!("invalid method: {}", request.method)))?;

        let response = self
            .http
            .request(method, request.url.as_str())
            .header(header::ACCEPT, accept_for(request.destination))
            .header("Sec-Fetch-Dest", fetch_dest(request.destination))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    Error::FetchTimeout(format!("{}: {}", request.url, e))
                } else {
                    Error::Network(format!("{}: {}", request.url, e))
                }
            })?;

        let status = response.status();

        if let Some(len) = response.content_length()
            && len as usize > self.config.max_bytes
        {
            return Err(Error::FetchTooLarge(format!("{} bytes exceeds {}", len, self.config.max_bytes)));
        }

        let headers: Vec<(String, String)> = response
            .headers()
            .iter()
            .filter_map(|(name, value)| value.to_str().ok().map(|v| (name.as_str().to_string(), v.to_string())))
            .collect();

        let bytes = response.bytes().await.map_err(|e| {
            if e.is_timeout() {
                Error::FetchTimeout(format!("{}: {}", request.url, e))
            } else {
                Error::Network(format!("failed to read response: {}", e))
            }
        })?;

        if bytes.len() > self.config.max_bytes {
            return Err(Error::FetchTooLarge(format!("{} bytes exceeds {}", bytes.len(), self.config.max_bytes)));
        }

        let fetch_ms = start.elapsed().as_millis() as u64;

        tracing::debug!(
            "fetched {} {} -> {} in {}ms ({} bytes)",
            request.method,
            request.url,
            status.as_u16(),
            fetch_ms,
            bytes.len()
        );

        Ok(Response { status: status.as_u16(), headers, body: bytes })
    }
}
