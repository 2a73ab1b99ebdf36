//! Shared application state
//!
//! Este módulo define el estado compartido del cliente. En lugar de un
//! único almacén global, cada porción (sesión, flota, idioma) tiene su
//! propio handle con accesores explícitos de lectura y reemplazo.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::config::EnvironmentConfig;
use crate::models::{FleetScope, Locale, VehicleRecord};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UserRole {
    Admin,
    Driver,
    Customer,
}

/// Sesión del usuario autenticado
#[derive(Clone, Debug, Default)]
pub struct Session {
    pub token: Option<String>,
    pub user_id: Option<String>,
    pub role: Option<UserRole>,
}

impl Session {
    pub fn new(token: impl Into<String>, user_id: impl Into<String>, role: UserRole) -> Self {
        Self {
            token: Some(token.into()),
            user_id: Some(user_id.into()),
            role: Some(role),
        }
    }

    /// Flota visible para este usuario; los clientes no ven camiones
    pub fn fleet_scope(&self) -> Option<FleetScope> {
        match (self.role?, &self.user_id) {
            (UserRole::Admin, _) => Some(FleetScope::All),
            (UserRole::Driver, Some(user_id)) => Some(FleetScope::Driver(user_id.clone())),
            _ => None,
        }
    }
}

#[derive(Clone, Default)]
pub struct SessionState {
    inner: Arc<RwLock<Session>>,
}

impl SessionState {
    pub async fn current(&self) -> Session {
        self.inner.read().await.clone()
    }

    pub async fn replace(&self, session: Session) {
        *self.inner.write().await = session;
    }

    pub async fn clear(&self) {
        *self.inner.write().await = Session::default();
    }
}

/// Origen del snapshot de flota actual
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum SnapshotOrigin {
    #[default]
    Empty,
    Live,
    Cached,
}

#[derive(Clone, Debug, Default)]
pub struct FleetSnapshot {
    pub vehicles: Vec<VehicleRecord>,
    pub scope: Option<FleetScope>,
    pub origin: SnapshotOrigin,
    pub refreshed_at: Option<DateTime<Utc>>,
}

#[derive(Clone, Default)]
pub struct FleetState {
    inner: Arc<RwLock<FleetSnapshot>>,
}

impl FleetState {
    pub async fn snapshot(&self) -> FleetSnapshot {
        self.inner.read().await.clone()
    }

    pub async fn vehicles(&self) -> Vec<VehicleRecord> {
        self.inner.read().await.vehicles.clone()
    }

    /// Reemplazo completo del listado (nunca mutación parcial del snapshot).
    /// Antes de reemplazar, `merge` puede mirar el listado anterior.
    pub async fn replace_merging<R>(
        &self,
        mut vehicles: Vec<VehicleRecord>,
        scope: FleetScope,
        origin: SnapshotOrigin,
        merge: impl FnOnce(&[VehicleRecord], &mut Vec<VehicleRecord>) -> R,
    ) -> R {
        let mut snapshot = self.inner.write().await;
        let result = merge(&snapshot.vehicles, &mut vehicles);
        *snapshot = FleetSnapshot {
            vehicles,
            scope: Some(scope),
            origin,
            refreshed_at: Some(Utc::now()),
        };
        result
    }

    /// Modificación puntual del listado bajo el cerrojo de escritura
    pub async fn update<R>(&self, f: impl FnOnce(&mut Vec<VehicleRecord>) -> R) -> R {
        let mut snapshot = self.inner.write().await;
        f(&mut snapshot.vehicles)
    }
}

#[derive(Clone, Default)]
pub struct LocaleState {
    inner: Arc<RwLock<Locale>>,
}

impl LocaleState {
    pub async fn current(&self) -> Locale {
        *self.inner.read().await
    }

    pub async fn replace(&self, locale: Locale) {
        *self.inner.write().await = locale;
    }
}

#[derive(Clone, Default)]
pub struct AppState {
    pub session: SessionState,
    pub fleet: FleetState,
    pub locale: LocaleState,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Estado inicial a partir de la configuración del entorno
    pub async fn from_config(config: &EnvironmentConfig) -> Self {
        let state = Self::new();
        state.locale.replace(config.locale).await;

        let role = if config.driver_id.is_some() {
            UserRole::Driver
        } else {
            UserRole::Admin
        };
        state
            .session
            .replace(Session {
                token: config.api_token.clone(),
                user_id: config.driver_id.clone(),
                role: Some(role),
            })
            .await;
        state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DocumentDate, VehicleDocuments};

    fn vehicle(number: &str) -> VehicleRecord {
        VehicleRecord::new(
            number,
            number,
            VehicleDocuments {
                rc_expiry: DocumentDate::Missing,
                insurance: DocumentDate::Missing,
                pollution: DocumentDate::Missing,
                permit: None,
                fitness: DocumentDate::Missing,
                tyre_changed_date: DocumentDate::Missing,
            },
        )
    }

    #[test]
    fn test_fleet_scope_by_role() {
        assert_eq!(
            Session::new("t", "admin-1", UserRole::Admin).fleet_scope(),
            Some(FleetScope::All)
        );
        assert_eq!(
            Session::new("t", "drv-9", UserRole::Driver).fleet_scope(),
            Some(FleetScope::Driver("drv-9".to_string()))
        );
        assert_eq!(Session::new("t", "cust-1", UserRole::Customer).fleet_scope(), None);
        assert_eq!(Session::default().fleet_scope(), None);
    }

    #[tokio::test]
    async fn test_fleet_replace_is_whole_value() {
        let state = AppState::new();
        assert_eq!(state.fleet.snapshot().await.origin, SnapshotOrigin::Empty);

        state
            .fleet
            .replace_merging(
                vec![vehicle("A"), vehicle("B")],
                FleetScope::All,
                SnapshotOrigin::Live,
                |_, _| (),
            )
            .await;
        let previous = state
            .fleet
            .replace_merging(vec![vehicle("C")], FleetScope::All, SnapshotOrigin::Cached, |old, _| {
                old.len()
            })
            .await;
        assert_eq!(previous, 2);

        let snapshot = state.fleet.snapshot().await;
        assert_eq!(snapshot.vehicles, vec![vehicle("C")]);
        assert_eq!(snapshot.origin, SnapshotOrigin::Cached);
        assert!(snapshot.refreshed_at.is_some());
    }

    #[tokio::test]
    async fn test_session_and_locale_slices() {
        let state = AppState::new();
        state.session.replace(Session::new("tok", "drv-1", UserRole::Driver)).await;
        state.locale.replace(Locale::Tamil).await;

        let clone = state.clone();
        assert_eq!(clone.session.current().await.token.as_deref(), Some("tok"));
        assert_eq!(clone.locale.current().await, Locale::Tamil);

        clone.session.clear().await;
        assert!(state.session.current().await.token.is_none());
    }
}
