//! cache_get tool implementation.
//!
//! Reads one stored entry by URL.

use offcache_core::cache::StoredEntry;
use offcache_core::{CacheKey, Error};
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::super::json_result;
use crate::state::AppState;

/// Parameters for the cache_get tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheGetParams {
    /// Absolute URL or root-relative path of the entry.
    pub url: String,

    /// Partition name. Defaults to the active version's static partition,
    /// then its dynamic partition.
    #[serde(default)]
    pub partition: Option<String>,

    /// Method of the stored request (default: GET).
    #[serde(default)]
    pub method: Option<String>,
}

/// Output from the cache_get tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheGetOutput {
    /// The stored entry's metadata.
    pub entry: StoredEntry,
    /// Body as (lossy) UTF-8 text.
    pub body: String,
}

/// Implementation of the cache_get tool.
pub async fn get_impl(state: &AppState, params: CacheGetParams) -> Result<CallToolResult, McpError> {
    let origin = state.origin().await?;
    let url = offcache_client::resolve(&origin, &params.url).map_err(|e| Error::InvalidUrl(e.to_string()))?;
    let key = CacheKey::new(params.method.as_deref().unwrap_or("GET"), &url);

    let partitions = match params.partition {
        Some(name) => vec![name],
        None => match state.registration.active().await {
            Some(engine) => engine.config().current_caches().to_vec(),
            None => return Err(Error::NotActive("no active version; pass a partition name".into()).into()),
        },
    };

    let mut found = None;
    for partition in &partitions {
        if let Some(entry) = state.db.get_entry(partition, &key).await? {
            found = Some(entry);
            break;
        }
    }
    let entry = found.ok_or_else(|| Error::CacheMiss(key.url.clone()))?;

    let body = String::from_utf8_lossy(&entry.body).into_owned();
    json_result(&CacheGetOutput { entry, body })
}
