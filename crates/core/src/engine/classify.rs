//! Request classification.
//!
//! The rules form a priority chain: the first one that matches decides the
//! policy, so a feed requested as a stylesheet is still network-first.

use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::{Destination, Request};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Policy {
    CacheFirst,
    NetworkFirst,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum PartitionKind {
    Static,
    Dynamic,
}

/// Which rule of the chain matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Rule {
    NetworkFirstPath,
    StaticDestination,
    ManifestPath,
    Document,
    Default,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct Route {
    pub policy: Policy,
    pub partition: PartitionKind,
    pub rule: Rule,
}

impl Route {
    const fn new(policy: Policy, partition: PartitionKind, rule: Rule) -> Self {
        Self { policy, partition, rule }
    }

    /// Whether a successful network response on this route is stored.
    pub fn writes_through(&self, config: &EngineConfig) -> bool {
        self.rule != Rule::Default || config.cache_unclassified
    }
}

/// Classify a request, or return `None` if it must not be intercepted.
pub fn classify(config: &EngineConfig, request: &Request) -> Option<Route> {
    if request.url.origin() != config.origin.origin() {
        return None;
    }

    let path = request.path();

    let route = if config.is_network_first_path(path) {
        Route::new(Policy::NetworkFirst, PartitionKind::Dynamic, Rule::NetworkFirstPath)
    } else if request.destination.is_static() {
        Route::new(Policy::CacheFirst, PartitionKind::Static, Rule::StaticDestination)
    } else if config.is_manifest_path(path) {
        Route::new(Policy::CacheFirst, PartitionKind::Static, Rule::ManifestPath)
    } else if request.destination == Destination::Document {
        Route::new(Policy::NetworkFirst, PartitionKind::Dynamic, Rule::Document)
    } else {
        Route::new(Policy::NetworkFirst, PartitionKind::Dynamic, Rule::Default)
    };

    Some(route)
}
