//! In-memory server state for tool tests.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use offcache_core::{AppConfig, CacheDb, Error, Fetcher, Request, Response};
use rmcp::model::CallToolResult;
use serde::de::DeserializeOwned;

use crate::state::AppState;

pub const ORIGIN: &str = "https://blog.test";

#[derive(Default)]
pub struct StubFetcher {
    routes: Mutex<HashMap<String, Response>>,
    offline: AtomicBool,
}

impl StubFetcher {
    pub fn route(&self, path: &str, response: Response) {
        self.routes.lock().unwrap().insert(format!("{ORIGIN}{path}"), response);
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }
}

#[async_trait]
impl Fetcher for StubFetcher {
    async fn fetch(&self, request: &Request) -> Result<Response, Error> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(Error::Network("offline".into()));
        }
        let routes = self.routes.lock().unwrap();
        Ok(routes
            .get(request.url.as_str())
            .cloned()
            .unwrap_or_else(|| Response::new(404, "not found")))
    }
}

pub fn test_config() -> AppConfig {
    AppConfig {
        origin: ORIGIN.into(),
        static_assets: vec!["/".into(), "/favicon.png".into()],
        ..Default::default()
    }
}

/// State with an in-memory database and a stub network serving the
/// manifest. Nothing is deployed yet.
pub async fn state() -> (Arc<AppState>, Arc<StubFetcher>) {
    let fetcher = Arc::new(StubFetcher::default());
    fetcher.route("/", Response::new(200, "<h1>home</h1>").with_header("Content-Type", "text/html"));
    fetcher.route("/favicon.png", Response::new(200, vec![0x89u8, b'P', b'N', b'G']));

    let db = CacheDb::open_in_memory().await.unwrap();
    let state = Arc::new(AppState::new(test_config(), db, fetcher.clone()));
    (state, fetcher)
}

/// Same as [`state`], with the configured version deployed.
pub async fn deployed_state() -> (Arc<AppState>, Arc<StubFetcher>) {
    let (state, fetcher) = state().await;
    let config = state.config.engine_config().unwrap();
    state.registration.deploy(config).await.unwrap();
    (state, fetcher)
}

/// Decode the JSON text content of a tool result.
pub fn output<T: DeserializeOwned>(result: &CallToolResult) -> T {
    let content_val = serde_json::to_value(&result.content[0]).unwrap();
    let text = content_val
        .get("text")
        .and_then(|v| v.as_str())
        .expect("Expected text field in content");
    serde_json::from_str(text).unwrap()
}
