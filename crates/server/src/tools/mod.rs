//! MCP tool implementations.
//!
//! This module contains all tools exposed by the offcache server.

pub mod cache;
pub mod site_fetch;

#[cfg(test)]
pub(crate) mod testing;

use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use serde::Serialize;

use crate::error::ToolError;

pub use cache::{CacheDeployParams, CacheGetParams, CachePurgeParams, CacheStatusParams};
pub use site_fetch::{SiteFetchOutput, SiteFetchParams};

/// Serialize a tool output as pretty JSON text content.
pub(crate) fn json_result<T: Serialize>(output: &T) -> Result<CallToolResult, McpError> {
    let json = serde_json::to_string_pretty(output).map_err(ToolError::from)?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}
