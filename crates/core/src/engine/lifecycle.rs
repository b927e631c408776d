//! Version lifecycle: parsed → installing → installed → activating →
//! activated → redundant.

use std::fmt;

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleState {
    Parsed,
    Installing,
    /// Installed and waiting for activation.
    Installed,
    Activating,
    Activated,
    /// Failed to install, or superseded by a newer version.
    Redundant,
}

impl LifecycleState {
    pub fn as_str(&self) -> &'static str {
        match self {
            LifecycleState::Parsed => "parsed",
            LifecycleState::Installing => "installing",
            LifecycleState::Installed => "installed",
            LifecycleState::Activating => "activating",
            LifecycleState::Activated => "activated",
            LifecycleState::Redundant => "redundant",
        }
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Current state of one engine version.
#[derive(Debug)]
pub struct Lifecycle {
    state: RwLock<LifecycleState>,
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self { state: RwLock::new(LifecycleState::Parsed) }
    }
}

impl Lifecycle {
    pub async fn get(&self) -> LifecycleState {
        *self.state.read().await
    }

    /// Move from `from` to `to`, failing if the current state is not `from`.
    pub async fn advance(&self, from: LifecycleState, to: LifecycleState) -> Result<(), Error> {
        let mut state = self.state.write().await;
        if *state != from {
            return Err(Error::InvalidState(format!("cannot move to {to} from {}, expected {from}", *state)));
        }
        tracing::debug!(%from, %to, "lifecycle transition");
        *state = to;
        Ok(())
    }

    /// Unconditionally mark the version redundant.
    pub async fn retire(&self) {
        let mut state = self.state.write().await;
        let current = *state;
        if current != LifecycleState::Redundant {
            tracing::debug!(from = %current, "lifecycle retired");
            *state = LifecycleState::Redundant;
        }
    }
}
