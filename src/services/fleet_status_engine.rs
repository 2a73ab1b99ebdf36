//! Motor de estado de la flota
//!
//! Clasifica cada vehículo (activo/inactivo), calcula el aviso de
//! vencimiento más urgente y produce el orden de visualización del panel.
//! También añade entradas de daño/repostaje al historial local.
//!
//! Todo es síncrono y puro respecto a `now`: una fecha mal formada nunca
//! detiene la clasificación, simplemente cuenta como vencida.

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::config::DEFAULT_DUE_SOON_DAYS;
use crate::models::{
    Classification, DocumentLabel, DueInfo, DueKind, FleetSummary, HistoryEntry, RankedVehicle,
    RefuelEntry, VehicleRecord,
};
use crate::utils::errors::{vehicle_not_found, FleetResult};

const MS_PER_DAY: f64 = 86_400_000.0;

#[derive(Debug, Clone, Copy)]
pub struct FleetStatusEngine {
    now: DateTime<Utc>,
    due_soon_days: i64,
}

impl Default for FleetStatusEngine {
    fn default() -> Self {
        Self::at(Utc::now())
    }
}

impl FleetStatusEngine {
    /// Motor evaluado en un instante fijo
    pub fn at(now: DateTime<Utc>) -> Self {
        Self {
            now,
            due_soon_days: DEFAULT_DUE_SOON_DAYS,
        }
    }

    pub fn with_due_soon_days(mut self, days: i64) -> Self {
        self.due_soon_days = days;
        self
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.now
    }

    pub fn classify(&self, vehicle: &VehicleRecord) -> Classification {
        let documents = &vehicle.documents;
        let dates_valid = documents.dated().iter().all(|date| date.is_after(self.now));

        Classification {
            is_active: dates_valid && documents.is_permit_valid(),
        }
    }

    /// Aviso más urgente del vehículo, o `None` si cumple con todo
    pub fn nearest_due(&self, vehicle: &VehicleRecord) -> Option<DueInfo> {
        let documents = &vehicle.documents;
        let labelled = [
            (DocumentLabel::Rc, &documents.rc_expiry),
            (DocumentLabel::Insurance, &documents.insurance),
            (DocumentLabel::Pollution, &documents.pollution),
        ];

        let mut expired = Vec::new();
        let mut due_soon = Vec::new();

        for (label, date) in labelled {
            match date.instant() {
                Some(expiry) => {
                    let diff_days = (expiry - self.now).num_milliseconds() as f64 / MS_PER_DAY;
                    if diff_days <= 0.0 {
                        expired.push(label);
                    } else if diff_days <= self.due_soon_days as f64 {
                        due_soon.push(label);
                    }
                }
                None => expired.push(label),
            }
        }

        if !documents.is_permit_valid() {
            expired.push(DocumentLabel::Permit);
        }

        if !expired.is_empty() {
            Some(DueInfo {
                kind: DueKind::Expired,
                labels: expired,
            })
        } else if !due_soon.is_empty() {
            Some(DueInfo {
                kind: DueKind::Due,
                labels: due_soon,
            })
        } else {
            None
        }
    }

    /// Activos primero y luego inactivos; dentro de cada grupo, el
    /// vencimiento global más próximo primero. Vehículos con alguna fecha
    /// ausente o inválida no tienen clave y van al principio de su grupo.
    pub fn rank_fleet(&self, vehicles: &[VehicleRecord]) -> Vec<RankedVehicle> {
        let mut tagged: Vec<(Option<DateTime<Utc>>, RankedVehicle)> = vehicles
            .iter()
            .map(|vehicle| {
                let ranked = RankedVehicle {
                    is_active: self.classify(vehicle).is_active,
                    due: self.nearest_due(vehicle),
                    vehicle: vehicle.clone(),
                };
                (soonest_expiry(vehicle), ranked)
            })
            .collect();

        // Option ordena None antes que Some; sort_by es estable
        tagged.sort_by(|(a, _), (b, _)| a.cmp(b));

        let (active, inactive): (Vec<_>, Vec<_>) = tagged
            .into_iter()
            .map(|(_, ranked)| ranked)
            .partition(|ranked| ranked.is_active);

        debug!(
            "📊 Flota ordenada: {} activos, {} inactivos",
            active.len(),
            inactive.len()
        );

        active.into_iter().chain(inactive).collect()
    }

    pub fn summarize(&self, vehicles: &[VehicleRecord]) -> FleetSummary {
        vehicles.iter().fold(FleetSummary::default(), |mut summary, vehicle| {
            summary.total += 1;
            if self.classify(vehicle).is_active {
                summary.active += 1;
            } else {
                summary.inactive += 1;
            }
            match self.nearest_due(vehicle).map(|due| due.kind) {
                Some(DueKind::Expired) => summary.expired += 1,
                Some(DueKind::Due) => summary.due_soon += 1,
                None => {}
            }
            summary
        })
    }

    /// Añade una entrada al historial del vehículo con esa matrícula.
    /// Las entradas anteriores no se tocan.
    pub fn append_history(
        &self,
        vehicles: &mut [VehicleRecord],
        number: &str,
        entry: HistoryEntry,
    ) -> FleetResult<()> {
        let vehicle = vehicles
            .iter_mut()
            .find(|vehicle| vehicle.number == number)
            .ok_or_else(|| vehicle_not_found(number))?;

        match entry {
            HistoryEntry::Damage(damage) => vehicle.damage_history.push(damage),
            HistoryEntry::Refuel(mut refuel) => {
                refuel.mileage = compute_mileage(vehicle.refuel_history.last(), &refuel);
                vehicle.refuel_history.push(refuel);
            }
        }

        Ok(())
    }
}

/// Mínimo de las tres fechas que deciden el estado; `None` si falta alguna
fn soonest_expiry(vehicle: &VehicleRecord) -> Option<DateTime<Utc>> {
    vehicle
        .documents
        .dated()
        .iter()
        .map(|date| date.instant())
        .collect::<Option<Vec<_>>>()?
        .into_iter()
        .min()
}

/// km/l desde la entrada anterior (por orden de historial, no por fecha)
pub fn compute_mileage(previous: Option<&RefuelEntry>, next: &RefuelEntry) -> Option<f64> {
    let distance = next.odometer_km - previous?.odometer_km;
    if next.volume > 0.0 && distance > 0.0 {
        Some(distance / next.volume)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DamageEntry, DamageStatus, DocumentDate, SyncState, VehicleDocuments};
    use chrono::{Duration, TimeZone};
    use rust_decimal::Decimal;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 9, 0, 0).unwrap()
    }

    fn at_days(days: i64) -> DocumentDate {
        DocumentDate::At(now() + Duration::days(days))
    }

    fn vehicle(
        number: &str,
        rc: DocumentDate,
        insurance: DocumentDate,
        pollution: DocumentDate,
        permit: &str,
    ) -> VehicleRecord {
        VehicleRecord::new(
            format!("id-{}", number),
            number,
            VehicleDocuments {
                rc_expiry: rc,
                insurance,
                pollution,
                permit: Some(permit.to_string()),
                fitness: DocumentDate::Missing,
                tyre_changed_date: DocumentDate::Missing,
            },
        )
    }

    fn refuel(id: &str, odometer_km: f64, volume: f64) -> RefuelEntry {
        refuel_on(id, "2025-06-01", odometer_km, volume)
    }

    fn refuel_on(id: &str, date: &str, odometer_km: f64, volume: f64) -> RefuelEntry {
        RefuelEntry {
            id: id.to_string(),
            date: date.to_string(),
            amount: Decimal::new(2000, 0),
            volume,
            odometer_km,
            mileage: None,
            sync: SyncState::Synced,
        }
    }

    #[test]
    fn test_classify_active_requires_all_documents() {
        let engine = FleetStatusEngine::at(now());

        let ok = vehicle("A", at_days(30), at_days(30), at_days(30), "YES");
        assert!(engine.classify(&ok).is_active);

        let past_rc = vehicle("B", at_days(-1), at_days(30), at_days(30), "yes");
        assert!(!engine.classify(&past_rc).is_active);

        let past_insurance = vehicle("B2", at_days(30), at_days(-1), at_days(30), "yes");
        assert!(!engine.classify(&past_insurance).is_active);

        let past_pollution = vehicle("B3", at_days(30), at_days(30), at_days(-1), "yes");
        assert!(!engine.classify(&past_pollution).is_active);

        let bad_permit = vehicle("C", at_days(30), at_days(30), at_days(30), "no");
        assert!(!engine.classify(&bad_permit).is_active);

        let invalid_date = DocumentDate::Invalid("??".into());
        let invalid = vehicle("D", at_days(30), invalid_date, at_days(30), "yes");
        assert!(!engine.classify(&invalid).is_active);
    }

    #[test]
    fn test_classify_expiry_exactly_now_is_inactive() {
        let engine = FleetStatusEngine::at(now());
        let v = vehicle("A", DocumentDate::At(now()), at_days(30), at_days(30), "yes");
        assert!(!engine.classify(&v).is_active);
    }

    #[test]
    fn test_nearest_due_all_due_soon() {
        let engine = FleetStatusEngine::at(now());
        let v = vehicle("A", at_days(3), at_days(3), at_days(3), "yes");
        assert_eq!(
            engine.nearest_due(&v),
            Some(DueInfo {
                kind: DueKind::Due,
                labels: vec![DocumentLabel::Rc, DocumentLabel::Insurance, DocumentLabel::Pollution],
            })
        );
    }

    #[test]
    fn test_nearest_due_expired_dominates() {
        let engine = FleetStatusEngine::at(now());
        let v = vehicle("A", at_days(-2), at_days(60), at_days(2), "no");
        assert_eq!(
            engine.nearest_due(&v),
            Some(DueInfo {
                kind: DueKind::Expired,
                labels: vec![DocumentLabel::Rc, DocumentLabel::Permit],
            })
        );
    }

    #[test]
    fn test_nearest_due_boundaries() {
        let engine = FleetStatusEngine::at(now());

        let five_days = vehicle("A", at_days(5), at_days(60), at_days(60), "yes");
        assert_eq!(engine.nearest_due(&five_days).map(|d| d.kind), Some(DueKind::Due));

        let just_over = vehicle(
            "B",
            DocumentDate::At(now() + Duration::days(5) + Duration::minutes(1)),
            at_days(60),
            at_days(60),
            "yes",
        );
        assert_eq!(engine.nearest_due(&just_over), None);

        let today = vehicle("C", DocumentDate::At(now()), at_days(60), at_days(60), "yes");
        assert_eq!(engine.nearest_due(&today).map(|d| d.kind), Some(DueKind::Expired));
    }

    #[test]
    fn test_nearest_due_missing_dates_are_expired() {
        let engine = FleetStatusEngine::at(now());
        let invalid_date = DocumentDate::Invalid("x".into());
        let v = vehicle("A", DocumentDate::Missing, at_days(60), invalid_date, "yes");
        assert_eq!(
            engine.nearest_due(&v).unwrap().labels,
            vec![DocumentLabel::Rc, DocumentLabel::Pollution]
        );
    }

    #[test]
    fn test_nearest_due_respects_configured_window() {
        let engine = FleetStatusEngine::at(now()).with_due_soon_days(10);
        let v = vehicle("A", at_days(8), at_days(60), at_days(60), "yes");
        assert_eq!(engine.nearest_due(&v).map(|d| d.kind), Some(DueKind::Due));
    }

    #[test]
    fn test_rank_fleet_orders_active_then_inactive() {
        let engine = FleetStatusEngine::at(now());
        let vehicles = vec![
            vehicle("INACTIVE-LATE", at_days(90), at_days(90), at_days(90), "no"),
            vehicle("ACTIVE-LATE", at_days(50), at_days(40), at_days(60), "yes"),
            vehicle("INACTIVE-EARLY", at_days(-10), at_days(90), at_days(90), "yes"),
            vehicle("ACTIVE-EARLY", at_days(20), at_days(10), at_days(30), "yes"),
        ];

        let ranked = engine.rank_fleet(&vehicles);
        let order: Vec<&str> = ranked.iter().map(|r| r.vehicle.number.as_str()).collect();
        assert_eq!(order, vec!["ACTIVE-EARLY", "ACTIVE-LATE", "INACTIVE-EARLY", "INACTIVE-LATE"]);
        assert!(ranked[0].is_active && ranked[1].is_active);
        assert!(!ranked[2].is_active && !ranked[3].is_active);
    }

    #[test]
    fn test_rank_fleet_is_idempotent() {
        let engine = FleetStatusEngine::at(now());
        let vehicles = vec![
            vehicle("A", at_days(9), at_days(9), at_days(9), "no"),
            vehicle("B", DocumentDate::Missing, at_days(9), at_days(9), "yes"),
            vehicle("C", at_days(3), at_days(30), at_days(30), "yes"),
            vehicle("D", at_days(3), at_days(30), at_days(30), "yes"),
            vehicle("E", at_days(1), at_days(30), at_days(30), "yes"),
        ];

        let first: Vec<VehicleRecord> =
            engine.rank_fleet(&vehicles).into_iter().map(|r| r.vehicle).collect();
        let second: Vec<VehicleRecord> =
            engine.rank_fleet(&first).into_iter().map(|r| r.vehicle).collect();
        assert_eq!(first, second);

        let order: Vec<&str> = first.iter().map(|v| v.number.as_str()).collect();
        assert_eq!(order, vec!["E", "C", "D", "B", "A"]);
    }

    #[test]
    fn test_summarize() {
        let engine = FleetStatusEngine::at(now());
        let vehicles = vec![
            vehicle("A", at_days(30), at_days(30), at_days(30), "yes"),
            vehicle("B", at_days(2), at_days(30), at_days(30), "yes"),
            vehicle("C", at_days(-1), at_days(30), at_days(30), "yes"),
        ];
        let summary = engine.summarize(&vehicles);
        assert_eq!(summary.total, 3);
        assert_eq!(summary.active, 2);
        assert_eq!(summary.inactive, 1);
        assert_eq!(summary.due_soon, 1);
        assert_eq!(summary.expired, 1);
    }

    #[test]
    fn test_append_refuel_computes_mileage() {
        let engine = FleetStatusEngine::at(now());
        let mut vehicles = vec![vehicle("TN01", at_days(30), at_days(30), at_days(30), "yes")];
        vehicles[0].refuel_history.push(refuel("r1", 1000.0, 30.0));

        engine
            .append_history(&mut vehicles, "TN01", HistoryEntry::Refuel(refuel("r2", 1300.0, 20.0)))
            .unwrap();
        assert_eq!(vehicles[0].refuel_history[1].mileage, Some(15.0));

        engine
            .append_history(&mut vehicles, "TN01", HistoryEntry::Refuel(refuel("r3", 1500.0, 0.0)))
            .unwrap();
        assert_eq!(vehicles[0].refuel_history[2].mileage, None);
    }

    #[test]
    fn test_first_refuel_has_no_mileage() {
        assert_eq!(compute_mileage(None, &refuel("r1", 1000.0, 20.0)), None);
        assert_eq!(
            compute_mileage(Some(&refuel("r1", 1000.0, 20.0)), &refuel("r2", 900.0, 20.0)),
            None
        );
    }

    #[test]
    fn test_mileage_uses_last_appended_entry_not_latest_date() {
        let engine = FleetStatusEngine::at(now());
        let mut vehicles = vec![vehicle("TN01", at_days(30), at_days(30), at_days(30), "yes")];
        vehicles[0].refuel_history.push(refuel_on("r1", "2025-06-10", 1000.0, 30.0));
        vehicles[0].refuel_history.push(refuel_on("r2", "2025-05-01", 1100.0, 10.0));

        let next = refuel_on("r3", "2025-06-15", 1300.0, 20.0);
        engine.append_history(&mut vehicles, "TN01", HistoryEntry::Refuel(next)).unwrap();

        // (1300 - 1100) / 20, no (1300 - 1000) / 20
        assert_eq!(vehicles[0].refuel_history[2].mileage, Some(10.0));
    }

    #[test]
    fn test_append_damage_keeps_prior_entries() {
        let engine = FleetStatusEngine::at(now());
        let mut vehicles = vec![vehicle("TN01", at_days(30), at_days(30), at_days(30), "yes")];
        let first = DamageEntry {
            id: "d1".to_string(),
            title: "Mirror".to_string(),
            variation: "Left".to_string(),
            date: "2025-05-01".to_string(),
            status: DamageStatus::CanDrive,
            file_ref: None,
            sync: SyncState::Synced,
        };
        vehicles[0].damage_history.push(first.clone());
        let before = vehicles[0].damage_history.clone();

        let second = DamageEntry { id: "d2".to_string(), ..first.clone() };
        engine
            .append_history(&mut vehicles, "TN01", HistoryEntry::Damage(second.clone()))
            .unwrap();

        assert_eq!(vehicles[0].damage_history.len(), before.len() + 1);
        assert_eq!(vehicles[0].damage_history[0], before[0]);
        assert_eq!(vehicles[0].damage_history[1], second);
    }

    #[test]
    fn test_append_to_unknown_vehicle_is_not_found() {
        let engine = FleetStatusEngine::at(now());
        let mut vehicles = vec![vehicle("TN01", at_days(30), at_days(30), at_days(30), "yes")];
        let entry = HistoryEntry::Refuel(refuel("r1", 10.0, 1.0));
        let result = engine.append_history(&mut vehicles, "KA99", entry);
        assert!(matches!(result, Err(crate::utils::errors::FleetError::VehicleNotFound(_))));
        assert!(vehicles[0].refuel_history.is_empty());
    }
}
