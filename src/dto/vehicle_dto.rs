//! DTOs de vehículos
//!
//! Forma exacta de los JSON que envía y recibe el backend. La
//! decodificación falla cerrada: un payload sin estructura reconocible se
//! rechaza en lugar de propagar campos vacíos hacia la clasificación.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::{
    DamageEntry, DamageStatus, DocumentDate, RefuelEntry, SyncState, VehicleDocuments,
    VehicleRecord,
};
use crate::utils::errors::{decode_error, FleetResult};
use crate::utils::validation::{
    validate_entry_date, validate_non_negative_amount, validate_not_blank,
};

/// Identificador del backend: puede llegar como string o como número
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WireId {
    Text(String),
    Number(i64),
}

impl WireId {
    /// `None` si el id es un string en blanco
    pub fn into_key(self) -> Option<String> {
        match self {
            WireId::Text(text) if text.trim().is_empty() => None,
            WireId::Text(text) => Some(text),
            WireId::Number(number) => Some(number.to_string()),
        }
    }
}

// Vehículo tal como lo devuelve el listado
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleDto {
    #[serde(alias = "_id")]
    pub id: Option<WireId>,
    pub vehicle_number: Option<String>,
    pub rc_expiry: Option<String>,
    pub insurance: Option<String>,
    pub pollution: Option<String>,
    pub fitness: Option<String>,
    pub tyre_changed_date: Option<String>,
    pub permit: Option<String>,
    pub driver_id: Option<WireId>,
    pub driver_name: Option<String>,
    pub damage_history: Option<Vec<DamageDto>>,
    pub refuel_history: Option<Vec<RefuelDto>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DamageDto {
    #[serde(alias = "_id")]
    pub id: Option<WireId>,
    pub title: String,
    pub variation: Option<String>,
    pub date: String,
    pub status: DamageStatus,
    #[serde(alias = "file")]
    pub file_ref: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefuelDto {
    #[serde(alias = "_id")]
    pub id: Option<WireId>,
    pub date: String,
    pub amount: Decimal,
    pub volume: f64,
    #[serde(alias = "odometer")]
    pub odometer_km: f64,
    pub mileage: Option<f64>,
}

impl DamageDto {
    fn into_entry(self, vehicle: &str) -> FleetResult<DamageEntry> {
        let id = self
            .id
            .and_then(WireId::into_key)
            .ok_or_else(|| {
                decode_error("damage entry", format!("missing id on vehicle {}", vehicle))
            })?;

        Ok(DamageEntry {
            id,
            title: self.title,
            variation: self.variation.unwrap_or_default(),
            date: self.date,
            status: self.status,
            file_ref: self.file_ref,
            sync: SyncState::Synced,
        })
    }
}

impl RefuelDto {
    fn into_entry(self, vehicle: &str) -> FleetResult<RefuelEntry> {
        let id = self
            .id
            .and_then(WireId::into_key)
            .ok_or_else(|| {
                decode_error("refuel entry", format!("missing id on vehicle {}", vehicle))
            })?;

        Ok(RefuelEntry {
            id,
            date: self.date,
            amount: self.amount,
            volume: self.volume,
            odometer_km: self.odometer_km,
            mileage: self.mileage,
            sync: SyncState::Synced,
        })
    }
}

impl TryFrom<VehicleDto> for VehicleRecord {
    type Error = crate::utils::errors::FleetError;

    fn try_from(dto: VehicleDto) -> Result<Self, Self::Error> {
        let number = dto
            .vehicle_number
            .filter(|number| !number.trim().is_empty())
            .ok_or_else(|| decode_error("vehicle", "missing vehicleNumber"))?;
        let id = dto
            .id
            .and_then(WireId::into_key)
            .ok_or_else(|| decode_error("vehicle", format!("missing id for {}", number)))?;

        let documents = VehicleDocuments {
            rc_expiry: DocumentDate::from_raw(dto.rc_expiry.as_deref()),
            insurance: DocumentDate::from_raw(dto.insurance.as_deref()),
            pollution: DocumentDate::from_raw(dto.pollution.as_deref()),
            permit: dto.permit,
            fitness: DocumentDate::from_raw(dto.fitness.as_deref()),
            tyre_changed_date: DocumentDate::from_raw(dto.tyre_changed_date.as_deref()),
        };

        let damage_history = dto
            .damage_history
            .unwrap_or_default()
            .into_iter()
            .map(|entry| entry.into_entry(&number))
            .collect::<FleetResult<Vec<_>>>()?;
        let refuel_history = dto
            .refuel_history
            .unwrap_or_default()
            .into_iter()
            .map(|entry| entry.into_entry(&number))
            .collect::<FleetResult<Vec<_>>>()?;

        Ok(VehicleRecord {
            id,
            number,
            documents,
            driver_id: dto.driver_id.and_then(WireId::into_key),
            driver_name: dto.driver_name,
            damage_history,
            refuel_history,
        })
    }
}

/// Decodificar el cuerpo de un listado de vehículos
pub fn decode_vehicles(body: &str) -> FleetResult<Vec<VehicleRecord>> {
    let dtos: Vec<VehicleDto> =
        serde_json::from_str(body).map_err(|e| decode_error("vehicle list", e))?;
    dtos.into_iter().map(VehicleRecord::try_from).collect()
}

/// Extraer el id asignado por el servidor a una entrada recién creada.
/// Acepta `{ "id": .. }`, `{ "_id": .. }` o el mismo objeto dentro de `data`.
pub fn decode_created_id(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    let object = value.get("data").filter(|data| data.is_object()).unwrap_or(&value);
    let raw = object.get("id").or_else(|| object.get("_id"))?;
    serde_json::from_value::<WireId>(raw.clone()).ok()?.into_key()
}

// Datos que introduce el usuario al reportar un daño
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewDamage {
    #[validate(custom = "validate_not_blank")]
    pub title: String,
    pub variation: String,
    #[validate(custom = "validate_entry_date")]
    pub date: String,
    pub status: DamageStatus,
    pub file_ref: Option<String>,
}

// Datos que introduce el usuario al registrar un repostaje
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewRefuel {
    #[validate(custom = "validate_entry_date")]
    pub date: String,
    #[validate(custom = "validate_non_negative_amount")]
    pub amount: Decimal,
    #[validate(range(min = 0.0))]
    pub volume: f64,
    #[validate(range(min = 0.0))]
    pub odometer_km: f64,
}

// Request para persistir un daño
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateDamageRequest {
    pub title: String,
    pub variation: String,
    pub date: String,
    pub status: DamageStatus,
    pub changed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_ref: Option<String>,
}

impl From<&DamageEntry> for CreateDamageRequest {
    fn from(entry: &DamageEntry) -> Self {
        Self {
            title: entry.title.clone(),
            variation: entry.variation.clone(),
            date: entry.date.clone(),
            status: entry.status,
            changed: entry.changed(),
            file_ref: entry.file_ref.clone(),
        }
    }
}

// Request para persistir un repostaje
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRefuelRequest {
    pub date: String,
    pub amount: f64,
    pub volume: f64,
    pub odometer_km: f64,
    pub mileage: Option<f64>,
}

impl From<&RefuelEntry> for CreateRefuelRequest {
    fn from(entry: &RefuelEntry) -> Self {
        Self {
            date: entry.date.clone(),
            amount: entry.amount.to_f64().unwrap_or_default(),
            volume: entry.volume,
            odometer_km: entry.odometer_km,
            mileage: entry.mileage,
        }
    }
}

// Request para reasignar conductor
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignDriverRequest {
    pub driver_id: Option<String>,
}
