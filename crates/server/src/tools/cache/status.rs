//! cache_status tool implementation.

use offcache_core::cache::PartitionStats;
use offcache_core::engine::RegistrationStatus;
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::super::json_result;
use crate::state::AppState;

/// Parameters for the cache_status tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct CacheStatusParams {
    /// Skip the per-partition entry counts.
    #[serde(default)]
    pub skip_stats: bool,
}

/// Output from the cache_status tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheStatusOutput {
    #[serde(flatten)]
    pub registration: RegistrationStatus,
    pub partitions: Vec<PartitionStats>,
}

/// Implementation of the cache_status tool.
pub async fn status_impl(state: &AppState, params: CacheStatusParams) -> Result<CallToolResult, McpError> {
    let registration = state.registration.status().await;
    let partitions = if params.skip_stats { Vec::new() } else { state.db.partition_stats().await? };

    json_result(&CacheStatusOutput { registration, partitions })
}
