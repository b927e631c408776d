//! cache_purge tool implementation.
//!
//! Deletes one partition by name, or every partition.

use offcache_core::CacheStorage;
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::super::json_result;
use crate::error::ToolError;
use crate::state::AppState;

/// Parameters for the cache_purge tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct CachePurgeParams {
    /// Name of the partition to delete.
    #[serde(default)]
    pub partition: Option<String>,

    /// Delete every partition.
    #[serde(default)]
    pub all: bool,
}

/// Output from the cache_purge tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CachePurgeOutput {
    /// Names of the deleted partitions.
    pub deleted: Vec<String>,
}

/// Implementation of the cache_purge tool.
pub async fn purge_impl(state: &AppState, params: CachePurgeParams) -> Result<CallToolResult, McpError> {
    let deleted = match (params.partition, params.all) {
        (None, false) => {
            return Err(ToolError::InvalidInput("One of partition or all must be specified".to_string()).into());
        }
        (Some(_), true) => {
            return Err(ToolError::InvalidInput("partition and all are mutually exclusive".to_string()).into());
        }
        (Some(name), false) => {
            if state.db.delete_partition(&name).await? {
                vec![name]
            } else {
                Vec::new()
            }
        }
        (None, true) => state.db.delete_all_except(&[]).await?,
    };

    tracing::info!(count = deleted.len(), "purged cache partitions");
    json_result(&CachePurgeOutput { deleted })
}
