//! Versioned cache partitions.
//!
//! [`CacheStorage`] is the seam the engine talks to. Two backends are
//! provided:
//!
//! - [`MemoryStorage`] for tests and embedders that do not need persistence
//! - [`CacheDb`], SQLite via tokio-rusqlite with WAL mode and migrations

pub mod connection;
pub mod entries;
pub mod hash;
pub mod memory;
pub mod migrations;
pub mod store;

pub use crate::Error;

pub use connection::CacheDb;
pub use entries::{PartitionStats, StoredEntry};
pub use hash::CacheKey;
pub use memory::MemoryStorage;
pub use store::CacheStorage;
