//! Clients - HTTP Clients for External APIs
//!
//! This module contains the HTTP client for the fleet backend and the
//! `VehicleDirectory` seam the sync service depends on.

use async_trait::async_trait;

use crate::models::{DamageEntry, FleetScope, RefuelEntry, VehicleRecord};
use crate::utils::errors::FleetResult;

pub mod fleet_api_client;

pub use fleet_api_client::FleetApiClient;

/// Backend store of vehicles
#[async_trait]
pub trait VehicleDirectory: Send + Sync {
    async fn list_vehicles(&self, scope: &FleetScope) -> FleetResult<Vec<VehicleRecord>>;

    /// Returns the server-issued id of the new entry, when the backend sends one
    async fn post_damage(
        &self,
        vehicle_id: &str,
        entry: &DamageEntry,
    ) -> FleetResult<Option<String>>;

    async fn post_refuel(
        &self,
        vehicle_id: &str,
        entry: &RefuelEntry,
    ) -> FleetResult<Option<String>>;

    async fn assign_driver(&self, vehicle_id: &str, driver_id: Option<&str>) -> FleetResult<()>;
}
