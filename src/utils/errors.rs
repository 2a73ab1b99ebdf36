//! Sistema de manejo de errores
//!
//! Este módulo define todos los tipos de errores del cliente de flota
//! y su traducción a mensajes para el usuario.

use thiserror::Error;

/// Errores principales de la aplicación
#[derive(Error, Debug)]
pub enum FleetError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("Vehicle not found: {0}")]
    VehicleNotFound(String),

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Cache error: {0}")]
    Cache(String),
}

impl FleetError {
    /// Código estable del error, útil para logs y para la capa de UI
    pub fn code(&self) -> &'static str {
        match self {
            FleetError::Network(_) => "NETWORK_ERROR",
            FleetError::Http { .. } => "HTTP_ERROR",
            FleetError::Decode(_) => "DECODE_ERROR",
            FleetError::Validation(_) => "VALIDATION_ERROR",
            FleetError::VehicleNotFound(_) => "VEHICLE_NOT_FOUND",
            FleetError::Cancelled => "CANCELLED",
            FleetError::Config(_) => "CONFIG_ERROR",
            FleetError::Cache(_) => "CACHE_ERROR",
        }
    }

    /// Mensaje corto para la notificación no bloqueante que ve el usuario
    pub fn user_message(&self) -> String {
        match self {
            FleetError::Network(_) => {
                "Could not reach the server. Pull down to refresh and try again.".to_string()
            }
            FleetError::Http { status, .. } if *status >= 500 => {
                "The server is having trouble right now. Please try again later.".to_string()
            }
            FleetError::Http { status, message } => {
                format!("Request rejected ({}): {}", status, message)
            }
            FleetError::Decode(_) => {
                "The server sent data this app could not read.".to_string()
            }
            FleetError::Validation(_) => "Some of the entered values are invalid.".to_string(),
            FleetError::VehicleNotFound(number) => {
                format!("Vehicle {} is not in the current list.", number)
            }
            FleetError::Cancelled => "The request was cancelled.".to_string(),
            FleetError::Config(msg) => format!("Configuration problem: {}", msg),
            FleetError::Cache(_) => "Local data could not be read.".to_string(),
        }
    }

    /// Indica si el fallo es de transporte o del backend (y no de los datos locales)
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            FleetError::Network(_) | FleetError::Http { .. } | FleetError::Decode(_)
        )
    }
}

/// Resultado tipado para operaciones que pueden fallar
pub type FleetResult<T> = Result<T, FleetError>;

/// Función helper para crear errores de vehículo no encontrado
pub fn vehicle_not_found(number: &str) -> FleetError {
    FleetError::VehicleNotFound(number.to_string())
}

/// Función helper para crear errores de decodificación
pub fn decode_error(context: &str, detail: impl std::fmt::Display) -> FleetError {
    FleetError::Decode(format!("{}: {}", context, detail))
}

/// Función helper para crear errores de configuración
pub fn config_error(var: &str, detail: impl std::fmt::Display) -> FleetError {
    FleetError::Config(format!("{} {}", var, detail))
}
