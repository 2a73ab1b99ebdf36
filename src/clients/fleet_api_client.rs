//! Cliente HTTP para el backend de flota
//!
//! JSON sobre HTTP contra el backend de la empresa: listado de vehículos,
//! vehículos por conductor, alta de daños/repostajes y reasignación de
//! conductor. El token bearer se envía solo si la sesión tiene uno.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use std::time::Duration;
use tracing::{debug, info, warn};

use super::VehicleDirectory;
use crate::config::EnvironmentConfig;
use crate::dto::{
    decode_created_id, decode_vehicles, AssignDriverRequest, CreateDamageRequest,
    CreateRefuelRequest,
};
use crate::models::{DamageEntry, FleetScope, RefuelEntry, VehicleRecord};
use crate::utils::errors::{FleetError, FleetResult};

/// Longitud máxima del cuerpo de error que se guarda en el mensaje
const MAX_ERROR_BODY: usize = 200;

#[derive(Clone)]
pub struct FleetApiClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl FleetApiClient {
    /// Crear nuevo cliente HTTP. Sin timeout salvo que se indique uno.
    pub fn new(
        base_url: impl Into<String>,
        token: Option<String>,
        timeout: Option<Duration>,
    ) -> FleetResult<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token,
        })
    }

    pub fn from_config(config: &EnvironmentConfig) -> FleetResult<Self> {
        Self::new(
            config.api_base_url.clone(),
            config.api_token.clone(),
            config.http_timeout_secs.map(Duration::from_secs),
        )
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn vehicle_url(&self, vehicle_id: &str, suffix: &str) -> String {
        self.url(&format!("/vehicles/{}/{}", urlencoding::encode(vehicle_id), suffix))
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        let builder = builder.header("Accept", "application/json");
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Leer el cuerpo de la respuesta, convirtiendo los códigos no-2xx en error
    async fn read_body(response: Response) -> FleetResult<String> {
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let mut message: String = body.chars().take(MAX_ERROR_BODY).collect();
            if message.trim().is_empty() {
                message = status.canonical_reason().unwrap_or("unknown error").to_string();
            }
            warn!("❌ Backend respondió {}: {}", status, message);
            return Err(FleetError::Http {
                status: status.as_u16(),
                message,
            });
        }

        Ok(body)
    }
}

#[async_trait]
impl VehicleDirectory for FleetApiClient {
    async fn list_vehicles(&self, scope: &FleetScope) -> FleetResult<Vec<VehicleRecord>> {
        let url = match scope {
            FleetScope::All => self.url("/vehicles"),
            FleetScope::Driver(driver_id) => {
                self.url(&format!("/vehicles/driver/{}", urlencoding::encode(driver_id)))
            }
        };
        info!("🚚 Obteniendo vehículos: {}", url);

        let response = self.authorized(self.client.get(&url)).send().await?;
        let body = Self::read_body(response).await?;
        let vehicles = decode_vehicles(&body)?;

        info!("✅ {} vehículos recibidos", vehicles.len());
        Ok(vehicles)
    }

    async fn post_damage(
        &self,
        vehicle_id: &str,
        entry: &DamageEntry,
    ) -> FleetResult<Option<String>> {
        let url = self.vehicle_url(vehicle_id, "damage");
        debug!("📤 POST daño {} -> {}", entry.id, url);

        let response = self
            .authorized(self.client.post(&url))
            .json(&CreateDamageRequest::from(entry))
            .send()
            .await?;
        let body = Self::read_body(response).await?;
        Ok(decode_created_id(&body))
    }

    async fn post_refuel(
        &self,
        vehicle_id: &str,
        entry: &RefuelEntry,
    ) -> FleetResult<Option<String>> {
        let url = self.vehicle_url(vehicle_id, "refuel");
        debug!("📤 POST repostaje {} -> {}", entry.id, url);

        let response = self
            .authorized(self.client.post(&url))
            .json(&CreateRefuelRequest::from(entry))
            .send()
            .await?;
        let body = Self::read_body(response).await?;
        Ok(decode_created_id(&body))
    }

    async fn assign_driver(&self, vehicle_id: &str, driver_id: Option<&str>) -> FleetResult<()> {
        let url = self.vehicle_url(vehicle_id, "driver");
        info!("👷 Reasignando conductor de {} -> {:?}", vehicle_id, driver_id);

        let response = self
            .authorized(self.client.put(&url))
            .json(&AssignDriverRequest {
                driver_id: driver_id.map(str::to_string),
            })
            .send()
            .await?;
        Self::read_body(response).await?;
        Ok(())
    }
}
