//! Structured errors for the offcache server.
//!
//! Engine errors convert through `offcache_core::Error`; these cover what
//! only the tool layer can get wrong.

use offcache_core::config::ConfigError;
use rmcp::model::{ErrorCode, ErrorData as McpError};

/// Structured errors for the offcache server.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    /// Invalid input parameters (e.g., no purge target).
    #[error("INVALID_INPUT: {0}")]
    InvalidInput(String),

    /// A deploy produced an invalid configuration.
    #[error("INVALID_CONFIG: {0}")]
    InvalidConfig(#[from] ConfigError),

    /// Tool output could not be serialized.
    #[error("OUTPUT_FAILED: {0}")]
    Output(#[from] serde_json::Error),
}

impl From<ToolError> for McpError {
    fn from(err: ToolError) -> Self {
        let code = match &err {
            ToolError::InvalidInput(_) | ToolError::InvalidConfig(_) => -32602,
            ToolError::Output(_) => -32603,
        };

        McpError { code: ErrorCode(code), message: err.to_string().into(), data: None }
    }
}
