//! The network side of the engine.

use async_trait::async_trait;

use crate::{Error, Request, Response};

/// Performs the actual network request for the engine.
///
/// Any HTTP status is a successful fetch. `Err` means the network call
/// itself failed; that is the only thing that triggers cache and synthetic
/// fallbacks.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, request: &Request) -> Result<Response, Error>;
}
