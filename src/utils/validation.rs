//! Utilidades de validación
//!
//! Este módulo contiene funciones helper para validación de datos
//! y conversión de fechas que llegan del backend.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use validator::ValidationError;

/// Convertir un string ISO-8601 a instante UTC
///
/// Acepta RFC 3339 (`2025-03-01T10:00:00Z`, `2025-03-01T10:00:00+05:30`),
/// fecha-hora sin zona (se interpreta como UTC) y fecha simple
/// `YYYY-MM-DD` (medianoche UTC). Devuelve `None` si no se reconoce.
pub fn parse_iso_datetime(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }

    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return Some(naive.and_utc());
        }
    }

    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Validar que un string no esté vacío
pub fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut error = ValidationError::new("not_blank");
        error.add_param("value".into(), &value.to_string());
        return Err(error);
    }
    Ok(())
}

/// Validar que un importe no sea negativo
pub fn validate_non_negative_amount(value: &Decimal) -> Result<(), ValidationError> {
    if value.is_sign_negative() && !value.is_zero() {
        let mut error = ValidationError::new("non_negative");
        error.add_param("actual".into(), &value.to_string());
        return Err(error);
    }
    Ok(())
}

/// Validar que una fecha de entrada sea ISO-8601 reconocible
pub fn validate_entry_date(value: &str) -> Result<(), ValidationError> {
    if parse_iso_datetime(value).is_none() {
        let mut error = ValidationError::new("date");
        error.add_param("value".into(), &value.to_string());
        error.add_param("format".into(), &"ISO-8601".to_string());
        return Err(error);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_parse_iso_datetime_formats() {
        let midnight = Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap();
        assert_eq!(parse_iso_datetime("2025-03-01"), Some(midnight));
        assert_eq!(parse_iso_datetime("2025-03-01T00:00:00Z"), Some(midnight));
        assert_eq!(parse_iso_datetime("2025-03-01T00:00:00.000Z"), Some(midnight));
        assert_eq!(parse_iso_datetime("2025-03-01T05:30:00+05:30"), Some(midnight));
        assert_eq!(parse_iso_datetime("2025-03-01T00:00:00"), Some(midnight));
    }

    #[test]
    fn test_parse_iso_datetime_rejects_garbage() {
        assert_eq!(parse_iso_datetime(""), None);
        assert_eq!(parse_iso_datetime("   "), None);
        assert_eq!(parse_iso_datetime("next tuesday"), None);
        assert_eq!(parse_iso_datetime("2025-13-45"), None);
    }

    #[test]
    fn test_validators() {
        assert!(validate_not_blank("Front bumper").is_ok());
        assert!(validate_not_blank("  ").is_err());
        assert!(validate_non_negative_amount(&Decimal::new(150050, 2)).is_ok());
        assert!(validate_non_negative_amount(&Decimal::ZERO).is_ok());
        assert!(validate_non_negative_amount(&Decimal::new(-1, 0)).is_err());
        assert!(validate_entry_date("2025-03-01").is_ok());
        assert!(validate_entry_date("01/03/2025").is_err());
    }
}
