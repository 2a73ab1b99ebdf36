//! Sincronización de la flota
//!
//! Pipeline de obtener → decodificar → clasificar, con cancelación,
//! respaldo en el cache de snapshots y escritura optimista en dos fases
//! para daños y repostajes.

use chrono::Utc;
use futures::future::join_all;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use uuid::Uuid;
use validator::Validate;

use crate::cache::SnapshotCache;
use crate::clients::VehicleDirectory;
use crate::config::DEFAULT_DUE_SOON_DAYS;
use crate::dto::{NewDamage, NewRefuel};
use crate::models::{
    DamageEntry, FleetScope, FleetSummary, HistoryEntry, HistoryItem, RankedVehicle, RefuelEntry,
    SyncState, VehicleRecord,
};
use crate::services::fleet_status_engine::FleetStatusEngine;
use crate::state::{AppState, SnapshotOrigin};
use crate::utils::errors::{vehicle_not_found, FleetError, FleetResult};

/// Resultado de un refresco de flota
#[derive(Debug, Clone, PartialEq)]
pub struct RefreshOutcome {
    pub origin: SnapshotOrigin,
    pub vehicle_count: usize,
    /// Entradas locales sin confirmar que se conservaron sobre el listado nuevo
    pub carried_local: usize,
    /// Error de red que obligó a usar el cache
    pub fallback_reason: Option<String>,
}

/// Resultado de una escritura optimista
#[derive(Debug, Clone, PartialEq)]
pub struct WriteOutcome {
    /// Id final de la entrada (el del servidor si lo devolvió)
    pub entry_id: String,
    pub sync: SyncState,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RetryReport {
    pub attempted: usize,
    pub synced: usize,
}

pub struct FleetSyncService {
    directory: Arc<dyn VehicleDirectory>,
    state: AppState,
    cache: SnapshotCache,
    due_soon_days: i64,
}

impl FleetSyncService {
    pub fn new(
        directory: Arc<dyn VehicleDirectory>,
        state: AppState,
        cache: SnapshotCache,
    ) -> Self {
        Self {
            directory,
            state,
            cache,
            due_soon_days: DEFAULT_DUE_SOON_DAYS,
        }
    }

    pub fn with_due_soon_days(mut self, days: i64) -> Self {
        self.due_soon_days = days;
        self
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    fn engine(&self) -> FleetStatusEngine {
        FleetStatusEngine::at(Utc::now()).with_due_soon_days(self.due_soon_days)
    }

    /// Refrescar la flota del alcance indicado.
    ///
    /// Si el token se cancela antes de confirmar el resultado, el estado no
    /// cambia. Si la red falla y hay snapshot en cache, se usa el cache.
    pub async fn refresh(
        &self,
        scope: &FleetScope,
        cancel: &CancellationToken,
    ) -> FleetResult<RefreshOutcome> {
        let fetched = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                warn!("🛑 Refresco de flota cancelado ({})", scope.cache_id());
                return Err(FleetError::Cancelled);
            }
            result = self.directory.list_vehicles(scope) => result,
        };

        if cancel.is_cancelled() {
            warn!("🛑 Respuesta descartada: refresco cancelado ({})", scope.cache_id());
            return Err(FleetError::Cancelled);
        }

        let (vehicles, origin, fallback_reason) = match fetched {
            Ok(vehicles) => {
                if let Err(e) = self.cache.store_vehicles(scope, &vehicles).await {
                    warn!("⚠️ No se pudo guardar el snapshot en cache: {}", e);
                }
                (vehicles, SnapshotOrigin::Live, None)
            }
            Err(e) if !e.is_transport() => return Err(e),
            Err(e) => {
                error!("❌ Error obteniendo vehículos [{}]: {}", e.code(), e);
                match self.cache.load_vehicles(scope).await {
                    Ok(Some(cached)) => {
                        info!("📦 Usando snapshot en cache ({} vehículos)", cached.len());
                        (cached, SnapshotOrigin::Cached, Some(e.to_string()))
                    }
                    Ok(None) => return Err(e),
                    Err(cache_error) => {
                        warn!("⚠️ Error leyendo cache: {}", cache_error);
                        return Err(e);
                    }
                }
            }
        };

        let vehicle_count = vehicles.len();
        let carried_local = self
            .state
            .fleet
            .replace_merging(vehicles, scope.clone(), origin, |previous, fresh| {
                merge_local_entries(previous, fresh)
            })
            .await;

        info!(
            "✅ Flota actualizada: {} vehículos ({:?}), {} entradas locales conservadas",
            vehicle_count, origin, carried_local
        );

        Ok(RefreshOutcome {
            origin,
            vehicle_count,
            carried_local,
            fallback_reason,
        })
    }

    /// Filas del panel a partir del snapshot actual
    pub async fn ranked_fleet(&self) -> Vec<RankedVehicle> {
        let vehicles = self.state.fleet.vehicles().await;
        self.engine().rank_fleet(&vehicles)
    }

    pub async fn summary(&self) -> FleetSummary {
        let vehicles = self.state.fleet.vehicles().await;
        self.engine().summarize(&vehicles)
    }

    pub async fn record_damage(
        &self,
        number: &str,
        input: NewDamage,
        cancel: &CancellationToken,
    ) -> FleetResult<WriteOutcome> {
        input.validate()?;

        let entry = DamageEntry {
            id: Uuid::new_v4().to_string(),
            title: input.title.trim().to_string(),
            variation: input.variation,
            date: input.date,
            status: input.status,
            file_ref: input.file_ref,
            sync: SyncState::Pending,
        };
        self.write_entry(number, HistoryEntry::Damage(entry), cancel).await
    }

    pub async fn record_refuel(
        &self,
        number: &str,
        input: NewRefuel,
        cancel: &CancellationToken,
    ) -> FleetResult<WriteOutcome> {
        input.validate()?;

        let entry = RefuelEntry {
            id: Uuid::new_v4().to_string(),
            date: input.date,
            amount: input.amount,
            volume: input.volume,
            odometer_km: input.odometer_km,
            mileage: None,
            sync: SyncState::Pending,
        };
        self.write_entry(number, HistoryEntry::Refuel(entry), cancel).await
    }

    /// Fase 1: añadir localmente como `Pending`. Fase 2: POST y conciliar.
    /// La entrada local no se pierde, falle o no la persistencia.
    async fn write_entry(
        &self,
        number: &str,
        entry: HistoryEntry,
        cancel: &CancellationToken,
    ) -> FleetResult<WriteOutcome> {
        let engine = self.engine();
        let local_id = entry.id().to_string();
        let kind = entry.kind();

        let (vehicle_id, stored) = self
            .state
            .fleet
            .update(|vehicles| -> FleetResult<(String, HistoryEntry)> {
                engine.append_history(vehicles, number, entry)?;
                let vehicle = vehicles
                    .iter()
                    .find(|vehicle| vehicle.number == number)
                    .ok_or_else(|| vehicle_not_found(number))?;
                let stored =
                    find_entry(vehicle, kind, &local_id).ok_or_else(|| vehicle_not_found(number))?;
                Ok((vehicle.id.clone(), stored))
            })
            .await?;
        info!("📝 Entrada de {} {} añadida localmente a {}", kind, local_id, number);

        let result = self.post_entry(&vehicle_id, &stored, cancel).await;
        Ok(self.settle(number, kind, &local_id, result).await)
    }

    async fn post_entry(
        &self,
        vehicle_id: &str,
        entry: &HistoryEntry,
        cancel: &CancellationToken,
    ) -> FleetResult<Option<String>> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(FleetError::Cancelled),
            result = async {
                match entry {
                    HistoryEntry::Damage(damage) => {
                        self.directory.post_damage(vehicle_id, damage).await
                    }
                    HistoryEntry::Refuel(refuel) => {
                        self.directory.post_refuel(vehicle_id, refuel).await
                    }
                }
            } => result,
        }
    }

    /// Conciliar la entrada local con el resultado del POST
    async fn settle(
        &self,
        number: &str,
        kind: &'static str,
        local_id: &str,
        result: FleetResult<Option<String>>,
    ) -> WriteOutcome {
        let outcome = match result {
            Ok(server_id) => WriteOutcome {
                entry_id: server_id.unwrap_or_else(|| local_id.to_string()),
                sync: SyncState::Synced,
                error: None,
            },
            Err(e) => {
                warn!("⚠️ {} {} queda sin sincronizar: {}", kind, local_id, e);
                WriteOutcome {
                    entry_id: local_id.to_string(),
                    sync: SyncState::Unsynced,
                    error: Some(e.user_message()),
                }
            }
        };

        let found = self
            .state
            .fleet
            .update(|vehicles| {
                mark_entry(vehicles, number, kind, local_id, &outcome.entry_id, outcome.sync)
            })
            .await;
        if !found {
            // Un refresco reemplazó la lista mientras el POST estaba en curso
            warn!("⚠️ {} {} ya no está en el estado local", kind, local_id);
        } else if outcome.sync == SyncState::Synced {
            info!("✅ {} {} sincronizado como {}", kind, local_id, outcome.entry_id);
        }

        outcome
    }

    /// Reintentar una vez cada entrada `Unsynced` (acción manual del usuario)
    pub async fn retry_unsynced(&self, cancel: &CancellationToken) -> RetryReport {
        let pending: Vec<(String, String, HistoryEntry)> = self
            .state
            .fleet
            .update(|vehicles| {
                let mut pending = Vec::new();
                for vehicle in vehicles.iter_mut() {
                    for damage in vehicle
                        .damage_history
                        .iter_mut()
                        .filter(|d| d.sync == SyncState::Unsynced)
                    {
                        damage.sync = SyncState::Pending;
                        pending.push((
                            vehicle.number.clone(),
                            vehicle.id.clone(),
                            HistoryEntry::Damage(damage.clone()),
                        ));
                    }
                    for refuel in vehicle
                        .refuel_history
                        .iter_mut()
                        .filter(|r| r.sync == SyncState::Unsynced)
                    {
                        refuel.sync = SyncState::Pending;
                        pending.push((
                            vehicle.number.clone(),
                            vehicle.id.clone(),
                            HistoryEntry::Refuel(refuel.clone()),
                        ));
                    }
                }
                pending
            })
            .await;

        if pending.is_empty() {
            return RetryReport::default();
        }
        info!("🔄 Reintentando {} entradas sin sincronizar", pending.len());

        let results = join_all(
            pending
                .iter()
                .map(|(_, vehicle_id, entry)| self.post_entry(vehicle_id, entry, cancel)),
        )
        .await;

        let mut report = RetryReport {
            attempted: pending.len(),
            synced: 0,
        };
        for ((number, _, entry), result) in pending.iter().zip(results) {
            let outcome = self.settle(number, entry.kind(), entry.id(), result).await;
            if outcome.sync == SyncState::Synced {
                report.synced += 1;
            }
        }
        report
    }

    /// Reasignar (o quitar) el conductor de un vehículo
    pub async fn assign_driver(
        &self,
        vehicle_id: &str,
        driver_id: Option<&str>,
        cancel: &CancellationToken,
    ) -> FleetResult<()> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(FleetError::Cancelled),
            result = self.directory.assign_driver(vehicle_id, driver_id) => result?,
        }

        self.state
            .fleet
            .update(|vehicles| {
                let vehicle = vehicles.iter_mut().find(|vehicle| vehicle.id == vehicle_id);
                if let Some(vehicle) = vehicle {
                    if vehicle.driver_id.as_deref() != driver_id {
                        vehicle.driver_id = driver_id.map(str::to_string);
                        vehicle.driver_name = None;
                    }
                }
            })
            .await;
        Ok(())
    }
}

fn find_entry(vehicle: &VehicleRecord, kind: &str, id: &str) -> Option<HistoryEntry> {
    match kind {
        "damage" => vehicle
            .damage_history
            .iter()
            .find(|entry| entry.id == id)
            .cloned()
            .map(HistoryEntry::Damage),
        _ => vehicle
            .refuel_history
            .iter()
            .find(|entry| entry.id == id)
            .cloned()
            .map(HistoryEntry::Refuel),
    }
}

fn mark_entry(
    vehicles: &mut [VehicleRecord],
    number: &str,
    kind: &str,
    local_id: &str,
    final_id: &str,
    sync: SyncState,
) -> bool {
    let Some(vehicle) = vehicles.iter_mut().find(|vehicle| vehicle.number == number) else {
        return false;
    };

    if kind == "damage" {
        reconcile(&mut vehicle.damage_history, local_id, final_id, sync)
    } else {
        reconcile(&mut vehicle.refuel_history, local_id, final_id, sync)
    }
}

/// Si un refresco ya trajo la copia del servidor con el id definitivo, la
/// copia local sobra y se descarta; si no, la local pasa a ese id.
fn reconcile<E: HistoryItem>(
    history: &mut Vec<E>,
    local_id: &str,
    final_id: &str,
    sync: SyncState,
) -> bool {
    let Some(position) = history.iter().position(|entry| entry.entry_id() == local_id) else {
        return false;
    };

    let server_copy =
        final_id != local_id && history.iter().any(|entry| entry.entry_id() == final_id);
    if server_copy {
        log::info!("🔁 {} ya llegó del servidor, se descarta la copia local", final_id);
        history.remove(position);
    } else {
        history[position].confirm(final_id, sync);
    }
    true
}

/// Conservar sobre el listado nuevo las entradas locales aún no confirmadas
/// (`Pending`/`Unsynced`), emparejando por matrícula. Si el servidor ya
/// trae una entrada con el mismo id, gana la del servidor.
pub fn merge_local_entries(previous: &[VehicleRecord], fresh: &mut [VehicleRecord]) -> usize {
    let mut carried = 0;

    for old in previous {
        let Some(target) = fresh.iter_mut().find(|vehicle| vehicle.number == old.number) else {
            continue;
        };

        carried += carry_unconfirmed(&old.damage_history, &mut target.damage_history, &old.number);
        carried += carry_unconfirmed(&old.refuel_history, &mut target.refuel_history, &old.number);
    }

    carried
}

fn carry_unconfirmed<E: HistoryItem + Clone>(
    old: &[E],
    fresh: &mut Vec<E>,
    number: &str,
) -> usize {
    let mut carried = 0;
    for entry in old.iter().filter(|entry| entry.sync_state() != SyncState::Synced) {
        if !fresh.iter().any(|existing| existing.entry_id() == entry.entry_id()) {
            log::info!("➕ Entrada {} conservada en {}", entry.entry_id(), number);
            fresh.push(entry.clone());
            carried += 1;
        }
    }
    carried
}
