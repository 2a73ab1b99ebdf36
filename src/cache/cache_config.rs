//! Configuración de cache
//!
//! Este módulo contiene la configuración y las operaciones del cache local.

use anyhow::Result;
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::config::DEFAULT_SNAPSHOT_TTL_SECS;

/// Configuración del cache
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    pub key_prefix: String,
    pub default_ttl: u64,
    pub max_entries: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            key_prefix: "brick_fleet".to_string(),
            default_ttl: DEFAULT_SNAPSHOT_TTL_SECS, // 24 horas
            max_entries: 32,
        }
    }
}

/// Operaciones de cache
#[async_trait::async_trait]
pub trait CacheOperations {
    async fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>>;
    async fn set<T: Serialize + Send + Sync>(&self, key: &str, value: &T, ttl: u64) -> Result<()>;
    async fn delete(&self, key: &str) -> Result<()>;
    async fn exists(&self, key: &str) -> Result<bool>;
}
