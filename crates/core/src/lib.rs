//! Core types and shared functionality for offcache.
//!
//! This crate provides:
//! - The cache strategy engine and its version lifecycle
//! - Cache partitions with in-memory and SQLite backends
//! - Offline fallback responses
//! - Unified error types
//! - Configuration structures

pub mod cache;
pub mod config;
pub mod engine;
pub mod error;
pub mod fallback;
pub mod fetch;
pub mod message;

pub use cache::{CacheDb, CacheKey, CacheStorage, MemoryStorage};
pub use config::{AppConfig, EngineConfig};
pub use engine::{CacheEngine, Intercept, Registration, Served, Source};
pub use error::Error;
pub use fetch::Fetcher;
pub use message::{Destination, Request, Response};
