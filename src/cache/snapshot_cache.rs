use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use serde::{de::DeserializeOwned, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use super::{CacheConfig, CacheOperations};
use crate::models::{FleetScope, VehicleRecord};
use crate::utils::errors::{FleetError, FleetResult};

#[derive(Debug, Clone)]
struct CachedValue {
    payload: String,
    stored_at: DateTime<Utc>,
    ttl: u64,
}

impl CachedValue {
    /// Un TTL que no cabe en un `Duration` no expira nunca
    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        match i64::try_from(self.ttl).ok().and_then(Duration::try_seconds) {
            Some(ttl) => now - self.stored_at > ttl,
            None => false,
        }
    }
}

/// Cache en memoria del último listado de vehículos por alcance.
/// Solo sirve de respaldo al refrescar; no es almacenamiento duradero.
#[derive(Clone)]
pub struct SnapshotCache {
    entries: Arc<RwLock<HashMap<String, CachedValue>>>,
    config: CacheConfig,
}

impl SnapshotCache {
    pub fn new(config: CacheConfig) -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            config,
        }
    }

    /// Generar clave de cache con prefijo
    fn make_key(&self, prefix: &str, identifier: &str) -> String {
        format!("{}:{}:{}", self.config.key_prefix, prefix, identifier)
    }

    /// Generar clave del listado de vehículos
    pub fn vehicles_key(&self, scope: &FleetScope) -> String {
        self.make_key("vehicles", &scope.cache_id())
    }

    pub async fn store_vehicles(
        &self,
        scope: &FleetScope,
        vehicles: &[VehicleRecord],
    ) -> FleetResult<()> {
        self.cleanup_expired().await;
        let key = self.vehicles_key(scope);
        self.set(&key, &vehicles, self.config.default_ttl)
            .await
            .map_err(|e| FleetError::Cache(e.to_string()))
    }

    pub async fn load_vehicles(
        &self,
        scope: &FleetScope,
    ) -> FleetResult<Option<Vec<VehicleRecord>>> {
        let key = self.vehicles_key(scope);
        self.get(&key).await.map_err(|e| FleetError::Cache(e.to_string()))
    }

    /// Eliminar entradas expiradas
    pub async fn cleanup_expired(&self) -> usize {
        let now = Utc::now();
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, value| !value.is_expired(now));
        let removed = before - entries.len();
        if removed > 0 {
            info!("🧹 {} snapshots expirados eliminados del cache", removed);
        }
        removed
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait::async_trait]
impl CacheOperations for SnapshotCache {
    async fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let entries = self.entries.read().await;

        match entries.get(key) {
            Some(value) if !value.is_expired(Utc::now()) => {
                debug!("📥 Cache HIT para clave: {}", key);
                let deserialized: T = serde_json::from_str(&value.payload)?;
                Ok(Some(deserialized))
            }
            Some(_) => {
                debug!("⏰ Cache expirado para clave: {}", key);
                Ok(None)
            }
            None => {
                debug!("❌ Cache MISS para clave: {}", key);
                Ok(None)
            }
        }
    }

    async fn set<T: Serialize + Send + Sync>(&self, key: &str, value: &T, ttl: u64) -> Result<()> {
        let payload = serde_json::to_string(value)?;
        let mut entries = self.entries.write().await;

        if !entries.contains_key(key) && entries.len() >= self.config.max_entries {
            // Se descarta la entrada más antigua
            let oldest = entries
                .iter()
                .min_by_key(|(_, value)| value.stored_at)
                .map(|(k, _)| k.clone());
            if let Some(oldest) = oldest {
                warn!("⚠️ Cache lleno, descartando clave: {}", oldest);
                entries.remove(&oldest);
            }
        }

        entries.insert(
            key.to_string(),
            CachedValue {
                payload,
                stored_at: Utc::now(),
                ttl,
            },
        );
        debug!("💾 Cache SET para clave: {} (TTL: {}s)", key, ttl);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let removed = self.entries.write().await.remove(key).is_some();
        debug!("🗑️ Cache DELETE para clave: {} (eliminado: {})", key, removed);
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        let entries = self.entries.read().await;
        Ok(entries
            .get(key)
            .map(|value| !value.is_expired(Utc::now()))
            .unwrap_or(false))
    }
}
