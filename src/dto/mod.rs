//! DTOs
//!
//! Contratos de datos con el backend.

pub mod vehicle_dto;

pub use vehicle_dto::*;
