//! Services module
//!
//! Este módulo contiene la lógica de negocio del cliente: el motor de
//! estado de la flota y el servicio de sincronización con el backend.

pub mod fleet_status_engine;
pub mod fleet_sync_service;

pub use fleet_status_engine::FleetStatusEngine;
pub use fleet_sync_service::{FleetSyncService, RefreshOutcome, RetryReport, WriteOutcome};
