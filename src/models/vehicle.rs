//! Modelo de Vehicle
//!
//! Este módulo contiene el registro de vehículo tal como lo maneja el
//! cliente, ya decodificado y validado desde el backend.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::history::{DamageEntry, RefuelEntry};
use crate::utils::validation::parse_iso_datetime;

/// Fecha de un documento del vehículo (RC, seguro, contaminación...)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DocumentDate {
    /// El backend envió `null` o no envió el campo
    Missing,
    /// El backend envió un string que no es una fecha reconocible
    Invalid(String),
    At(DateTime<Utc>),
}

impl DocumentDate {
    pub fn from_raw(raw: Option<&str>) -> Self {
        match raw {
            None => DocumentDate::Missing,
            Some(value) => match parse_iso_datetime(value) {
                Some(at) => DocumentDate::At(at),
                None => DocumentDate::Invalid(value.to_string()),
            },
        }
    }

    pub fn instant(&self) -> Option<DateTime<Utc>> {
        match self {
            DocumentDate::At(at) => Some(*at),
            _ => None,
        }
    }

    /// Solo una fecha válida estrictamente posterior a `now` cuenta como vigente
    pub fn is_after(&self, now: DateTime<Utc>) -> bool {
        self.instant().map(|at| at > now).unwrap_or(false)
    }
}

/// Documentos de cumplimiento del vehículo
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehicleDocuments {
    pub rc_expiry: DocumentDate,
    pub insurance: DocumentDate,
    pub pollution: DocumentDate,
    /// Texto libre: solo "yes" (sin distinguir mayúsculas) es un permiso válido
    pub permit: Option<String>,
    pub fitness: DocumentDate,
    pub tyre_changed_date: DocumentDate,
}

impl VehicleDocuments {
    pub fn is_permit_valid(&self) -> bool {
        self.permit
            .as_deref()
            .map(|permit| permit.to_lowercase() == "yes")
            .unwrap_or(false)
    }

    /// Las tres fechas que deciden el estado activo, en orden de declaración
    pub fn dated(&self) -> [&DocumentDate; 3] {
        [&self.rc_expiry, &self.insurance, &self.pollution]
    }
}

/// Vehículo de la flota
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehicleRecord {
    pub id: String,
    /// Matrícula visible; única dentro de la flota
    pub number: String,
    pub documents: VehicleDocuments,
    pub driver_id: Option<String>,
    pub driver_name: Option<String>,
    pub damage_history: Vec<DamageEntry>,
    pub refuel_history: Vec<RefuelEntry>,
}

impl VehicleRecord {
    pub fn new(
        id: impl Into<String>,
        number: impl Into<String>,
        documents: VehicleDocuments,
    ) -> Self {
        Self {
            id: id.into(),
            number: number.into(),
            documents,
            driver_id: None,
            driver_name: None,
            damage_history: Vec::new(),
            refuel_history: Vec::new(),
        }
    }

    pub fn with_driver(
        mut self,
        driver_id: impl Into<String>,
        driver_name: Option<String>,
    ) -> Self {
        self.driver_id = Some(driver_id.into());
        self.driver_name = driver_name;
        self
    }
}

/// Parte de la flota que ve el usuario actual
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FleetScope {
    /// Administrador: todos los vehículos
    All,
    /// Conductor: solo los vehículos asignados a ese conductor
    Driver(String),
}

impl FleetScope {
    pub fn cache_id(&self) -> String {
        match self {
            FleetScope::All => "all".to_string(),
            FleetScope::Driver(driver_id) => format!("driver:{}", driver_id),
        }
    }
}
