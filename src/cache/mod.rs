//! Cache
//!
//! Este módulo contiene el cache local de snapshots de la flota.

pub mod cache_config;
pub mod snapshot_cache;

pub use cache_config::{CacheConfig, CacheOperations};
pub use snapshot_cache::SnapshotCache;
