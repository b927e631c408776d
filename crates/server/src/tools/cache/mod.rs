//! Cache-related MCP tools.
//!
//! This module provides tools for deploying versions and inspecting or
//! purging the partitions.

pub mod deploy;
pub mod get;
pub mod purge;
pub mod status;

pub use deploy::{CacheDeployParams, deploy_impl};
pub use get::{CacheGetParams, get_impl};
pub use purge::{CachePurgeParams, purge_impl};
pub use status::{CacheStatusParams, status_impl};
