//! Cliente de flota para la app de logística de ladrillos
//!
//! Clasificación de cumplimiento de camiones, avisos de vencimiento,
//! orden del panel y sincronización optimista con el backend REST.

pub mod cache;
pub mod clients;
pub mod config;
pub mod dto;
pub mod models;
pub mod services;
pub mod state;
pub mod utils;

pub use utils::errors::{FleetError, FleetResult};
