use anyhow::Result;
use dotenvy::dotenv;
use std::sync::Arc;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use brick_fleet::cache::{CacheConfig, SnapshotCache};
use brick_fleet::clients::FleetApiClient;
use brick_fleet::config::EnvironmentConfig;
use brick_fleet::services::FleetSyncService;
use brick_fleet::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Cargar variables de entorno
    dotenv().ok();

    // Configurar logging
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    info!("🧱 Brick Fleet - Estado de la flota");
    info!("==================================");

    let config = match EnvironmentConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("❌ Configuración inválida: {}", e);
            return Err(anyhow::anyhow!("Error de configuración: {}", e));
        }
    };

    let client = FleetApiClient::from_config(&config)?;
    info!("🌐 Backend: {}", client.base_url());

    let state = AppState::from_config(&config).await;
    let cache = SnapshotCache::new(CacheConfig {
        default_ttl: config.snapshot_ttl_secs,
        ..CacheConfig::default()
    });
    let service = FleetSyncService::new(Arc::new(client), state.clone(), cache)
        .with_due_soon_days(config.due_soon_days);

    let Some(scope) = state.session.current().await.fleet_scope() else {
        warn!("⚠️ La sesión actual no tiene flota visible");
        return Ok(());
    };

    // Ctrl+C cancela el refresco en curso
    let cancel = CancellationToken::new();
    let cancel_on_signal = cancel.clone();
    tokio::spawn(async move {
        shutdown_signal().await;
        cancel_on_signal.cancel();
    });

    match service.refresh(&scope, &cancel).await {
        Ok(outcome) => info!("✅ Refresco completado: {:?}", outcome),
        Err(e) => {
            error!("❌ {} [{}]", e.user_message(), e.code());
            return Ok(());
        }
    }

    let locale = state.locale.current().await;
    info!("🌍 Idioma: {}", locale.code());
    for row in service.ranked_fleet().await {
        let status = if row.is_active { "ACTIVE" } else { "INACTIVE" };
        let warning = row
            .due
            .as_ref()
            .map(|due| due.render(locale))
            .unwrap_or_default();
        info!(
            "🚚 {:<14} {:<8} {:<20} {}",
            row.vehicle.number,
            status,
            row.vehicle.driver_name.as_deref().unwrap_or("-"),
            warning
        );
    }

    let summary = service.summary().await;
    info!(
        "📊 Total {} | activos {} | inactivos {} | por vencer {} | vencidos {}",
        summary.total, summary.active, summary.inactive, summary.due_soon, summary.expired
    );

    info!("👋 Terminado");
    Ok(())
}

/// Señal de apagado
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("❌ No se pudo instalar el handler de Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("❌ No se pudo instalar el handler de terminación: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("🛑 Señal Ctrl+C recibida, cancelando...");
        },
        _ = terminate => {
            info!("🛑 Señal de terminación recibida, cancelando...");
        },
    }
}
