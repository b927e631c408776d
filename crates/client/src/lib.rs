//! Client code for offcache.
//!
//! This crate provides the reqwest-backed network fetcher the engine runs
//! on, plus URL helpers shared by the server.

pub mod fetch;

pub use fetch::{FetchConfig, HttpFetcher, UrlError, canonicalize, resolve};
