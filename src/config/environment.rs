//! Configuración de variables de entorno
//!
//! Este módulo maneja la configuración del entorno y variables de configuración.

use std::env;
use std::str::FromStr;

use crate::models::Locale;
use crate::utils::errors::{config_error, FleetResult};

pub const DEFAULT_DUE_SOON_DAYS: i64 = 5;
pub const DEFAULT_SNAPSHOT_TTL_SECS: u64 = 86_400;
/// Un año
pub const MAX_SNAPSHOT_TTL_SECS: u64 = 365 * 86_400;

/// Configuración del entorno
#[derive(Debug, Clone)]
pub struct EnvironmentConfig {
    pub environment: String,
    pub api_base_url: String,
    pub api_token: Option<String>,
    /// Si está presente, la app actúa como conductor y solo ve su vehículo
    pub driver_id: Option<String>,
    pub due_soon_days: i64,
    pub snapshot_ttl_secs: u64,
    pub http_timeout_secs: Option<u64>,
    pub locale: Locale,
}

impl EnvironmentConfig {
    /// Cargar la configuración desde el entorno (llamar antes a `dotenvy::dotenv()`)
    pub fn from_env() -> FleetResult<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Igual que `from_env` pero con una fuente de variables arbitraria
    pub fn from_lookup<F>(lookup: F) -> FleetResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let api_base_url = get("FLEET_API_BASE_URL")
            .ok_or_else(|| config_error("FLEET_API_BASE_URL", "must be set"))?
            .trim_end_matches('/')
            .to_string();
        if !api_base_url.starts_with("http://") && !api_base_url.starts_with("https://") {
            return Err(config_error("FLEET_API_BASE_URL", "must start with http:// or https://"));
        }

        let due_soon_days = parse_or(
            "FLEET_DUE_SOON_DAYS",
            get("FLEET_DUE_SOON_DAYS"),
            DEFAULT_DUE_SOON_DAYS,
        )?;
        if due_soon_days < 0 {
            return Err(config_error("FLEET_DUE_SOON_DAYS", "must not be negative"));
        }

        let snapshot_ttl_secs = parse_or(
            "FLEET_SNAPSHOT_TTL_SECS",
            get("FLEET_SNAPSHOT_TTL_SECS"),
            DEFAULT_SNAPSHOT_TTL_SECS,
        )?;
        if snapshot_ttl_secs > MAX_SNAPSHOT_TTL_SECS {
            return Err(config_error(
                "FLEET_SNAPSHOT_TTL_SECS",
                format!("must not exceed {}", MAX_SNAPSHOT_TTL_SECS),
            ));
        }

        Ok(Self {
            environment: get("ENVIRONMENT").unwrap_or_else(|| "development".to_string()),
            api_base_url,
            api_token: get("FLEET_API_TOKEN"),
            driver_id: get("FLEET_DRIVER_ID"),
            due_soon_days,
            snapshot_ttl_secs,
            http_timeout_secs: get("FLEET_HTTP_TIMEOUT_SECS")
                .map(|raw| parse_value("FLEET_HTTP_TIMEOUT_SECS", &raw))
                .transpose()?,
            locale: get("FLEET_LOCALE")
                .map(|raw| raw.parse::<Locale>())
                .transpose()?
                .unwrap_or_default(),
        })
    }

    /// Verificar si estamos en modo desarrollo
    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }

    /// Verificar si estamos en modo producción
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

fn parse_value<T: FromStr>(var: &str, raw: &str) -> FleetResult<T> {
    raw.parse::<T>()
        .map_err(|_| config_error(var, format!("has invalid value '{}'", raw)))
}

fn parse_or<T: FromStr>(var: &str, raw: Option<String>, default: T) -> FleetResult<T> {
    match raw {
        Some(raw) => parse_value(var, &raw),
        None => Ok(default),
    }
}
