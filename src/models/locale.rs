use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::utils::errors::FleetError;

/// Idioma de la interfaz (la app duplica los textos en inglés y tamil)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Locale {
    #[default]
    English,
    Tamil,
}

impl Locale {
    pub fn code(&self) -> &'static str {
        match self {
            Locale::English => "en",
            Locale::Tamil => "ta",
        }
    }
}

impl FromStr for Locale {
    type Err = FleetError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "en" | "english" => Ok(Locale::English),
            "ta" | "tamil" => Ok(Locale::Tamil),
            other => Err(FleetError::Config(format!("unsupported locale '{}'", other))),
        }
    }
}
