//! Historial de daños y repostajes
//!
//! Entradas que el cliente añade de forma optimista a un vehículo y que
//! luego se confirman (o no) contra el backend.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Estado de sincronización de una entrada añadida localmente
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SyncState {
    /// Añadida localmente, POST en curso
    Pending,
    /// Confirmada por el servidor
    #[default]
    Synced,
    /// El POST falló o se canceló; la entrada sigue en el estado local
    Unsynced,
}

/// Estado del daño reportado
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DamageStatus {
    #[serde(rename = "Can Drive", alias = "CanDrive")]
    CanDrive,
    Normal,
    #[serde(rename = "Need to Change", alias = "NeedToChange")]
    NeedToChange,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DamageEntry {
    pub id: String,
    pub title: String,
    pub variation: String,
    pub date: String,
    pub status: DamageStatus,
    pub file_ref: Option<String>,
    #[serde(default)]
    pub sync: SyncState,
}

impl DamageEntry {
    /// Derivado del estado: la pieza hay que cambiarla
    pub fn changed(&self) -> bool {
        self.status == DamageStatus::NeedToChange
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefuelEntry {
    pub id: String,
    pub date: String,
    pub amount: Decimal,
    /// Litros
    pub volume: f64,
    pub odometer_km: f64,
    /// km/l respecto a la entrada anterior; `None` si no se puede calcular
    pub mileage: Option<f64>,
    #[serde(default)]
    pub sync: SyncState,
}

/// Acceso común a las entradas de cualquier historial
pub trait HistoryItem {
    fn entry_id(&self) -> &str;

    fn sync_state(&self) -> SyncState;

    /// Fijar el id definitivo y el estado tras el POST
    fn confirm(&mut self, id: &str, sync: SyncState);
}

impl HistoryItem for DamageEntry {
    fn entry_id(&self) -> &str {
        &self.id
    }

    fn sync_state(&self) -> SyncState {
        self.sync
    }

    fn confirm(&mut self, id: &str, sync: SyncState) {
        self.id = id.to_string();
        self.sync = sync;
    }
}

impl HistoryItem for RefuelEntry {
    fn entry_id(&self) -> &str {
        &self.id
    }

    fn sync_state(&self) -> SyncState {
        self.sync
    }

    fn confirm(&mut self, id: &str, sync: SyncState) {
        self.id = id.to_string();
        self.sync = sync;
    }
}

/// Entrada que se puede añadir al historial de un vehículo
#[derive(Debug, Clone, PartialEq)]
pub enum HistoryEntry {
    Damage(DamageEntry),
    Refuel(RefuelEntry),
}

impl HistoryEntry {
    pub fn id(&self) -> &str {
        match self {
            HistoryEntry::Damage(entry) => &entry.id,
            HistoryEntry::Refuel(entry) => &entry.id,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            HistoryEntry::Damage(_) => "damage",
            HistoryEntry::Refuel(_) => "refuel",
        }
    }
}
