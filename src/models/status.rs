//! Estado de cumplimiento de la flota
//!
//! Resultados que produce el motor de estado: clasificación, avisos de
//! vencimiento y filas ordenadas para el panel.

use serde::{Deserialize, Serialize};

use super::locale::Locale;
use super::vehicle::VehicleRecord;

/// Documento al que se refiere un aviso
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DocumentLabel {
    #[serde(rename = "RC")]
    Rc,
    Insurance,
    Pollution,
    Permit,
}

impl DocumentLabel {
    pub fn label(&self, locale: Locale) -> &'static str {
        match (self, locale) {
            (DocumentLabel::Rc, Locale::English) => "RC",
            (DocumentLabel::Insurance, Locale::English) => "Insurance",
            (DocumentLabel::Pollution, Locale::English) => "Pollution",
            (DocumentLabel::Permit, Locale::English) => "Permit",
            (DocumentLabel::Rc, Locale::Tamil) => "ஆர்.சி",
            (DocumentLabel::Insurance, Locale::Tamil) => "காப்பீடு",
            (DocumentLabel::Pollution, Locale::Tamil) => "மாசு சான்று",
            (DocumentLabel::Permit, Locale::Tamil) => "அனுமதி",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DueKind {
    Expired,
    Due,
}

impl DueKind {
    pub fn heading(&self, locale: Locale) -> &'static str {
        match (self, locale) {
            (DueKind::Expired, Locale::English) => "Expired",
            (DueKind::Due, Locale::English) => "Due soon",
            (DueKind::Expired, Locale::Tamil) => "காலாவதியானது",
            (DueKind::Due, Locale::Tamil) => "விரைவில் காலாவதியாகும்",
        }
    }
}

/// Aviso más urgente de un vehículo. Si hay documentos vencidos solo se
/// informan esos.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DueInfo {
    #[serde(rename = "type")]
    pub kind: DueKind,
    pub labels: Vec<DocumentLabel>,
}

impl DueInfo {
    /// Texto listo para mostrar, p. ej. `Expired: RC, Permit`
    pub fn render(&self, locale: Locale) -> String {
        let labels: Vec<&str> = self.labels.iter().map(|label| label.label(locale)).collect();
        format!("{}: {}", self.kind.heading(locale), labels.join(", "))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    pub is_active: bool,
}

/// Fila del panel de flota ya ordenada
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedVehicle {
    pub vehicle: VehicleRecord,
    pub is_active: bool,
    pub due: Option<DueInfo>,
}

/// Contadores para la cabecera del panel
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FleetSummary {
    pub total: usize,
    pub active: usize,
    pub inactive: usize,
    pub due_soon: usize,
    pub expired: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_due_info() {
        let info = DueInfo {
            kind: DueKind::Expired,
            labels: vec![DocumentLabel::Rc, DocumentLabel::Permit],
        };
        assert_eq!(info.render(Locale::English), "Expired: RC, Permit");
        assert_eq!(info.render(Locale::Tamil), "காலாவதியானது: ஆர்.சி, அனுமதி");
    }

    #[test]
    fn test_due_info_wire_shape() {
        let info = DueInfo {
            kind: DueKind::Due,
            labels: vec![DocumentLabel::Rc, DocumentLabel::Insurance],
        };
        let json = serde_json::to_value(&info).unwrap();
        assert_eq!(json["type"], "due");
        assert_eq!(json["labels"][0], "RC");
        assert_eq!(json["labels"][1], "Insurance");
    }
}
