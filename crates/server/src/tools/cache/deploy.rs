//! cache_deploy tool implementation.
//!
//! Installs a new engine version from the loaded configuration, or promotes
//! the version that is waiting.

use offcache_core::engine::DeployOutcome;
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::super::json_result;
use crate::error::ToolError;
use crate::state::AppState;

/// Parameters for the cache_deploy tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct CacheDeployParams {
    /// Version to deploy (`vX.Y.Z`). Defaults to the configured version.
    #[serde(default)]
    pub version: Option<String>,

    /// Override skip-waiting for this deploy.
    #[serde(default)]
    pub skip_waiting: Option<bool>,

    /// Activate the waiting version instead of deploying a new one.
    #[serde(default)]
    pub promote: bool,
}

/// Implementation of the cache_deploy tool.
pub async fn deploy_impl(state: &AppState, params: CacheDeployParams) -> Result<CallToolResult, McpError> {
    let outcome: DeployOutcome = if params.promote {
        if params.version.is_some() || params.skip_waiting.is_some() {
            return Err(ToolError::InvalidInput("promote cannot be combined with version or skip_waiting".into()).into());
        }
        state.registration.promote_waiting().await?
    } else {
        let mut config = state.config.clone();
        if let Some(version) = params.version {
            config.version = version;
        }
        if let Some(skip_waiting) = params.skip_waiting {
            config.skip_waiting = skip_waiting;
        }
        let engine_config = config.engine_config().map_err(ToolError::from)?;

        tracing::info!(version = %engine_config.version, "deploying");
        state.registration.deploy(engine_config).await?
    };

    json_result(&outcome)
}
