use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use clicklog::analytics::{GeoLocator, IpInfoLocator};
use clicklog::api;
use clicklog::config::Config;
use clicklog::storage::{EventStore, JsonLinesStore};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Load configuration
    let config = Config::from_env()?;
    info!("Loaded configuration");

    let store: Arc<dyn EventStore> = Arc::new(JsonLinesStore::new(&config.storage.log_path));
    info!("📝 Writing events to {}", config.storage.log_path);

    let geo: Option<Arc<dyn GeoLocator>> = if config.geo.enabled {
        let locator: Arc<dyn GeoLocator> = Arc::new(IpInfoLocator::from_config(&config.geo)?);
        info!(
            "🌍 Geolocation enabled (service: {}, authenticated: {}, timeout: {}s)",
            config.geo.base_url,
            config.geo.token.is_some(),
            config.geo.timeout_secs
        );
        Some(locator)
    } else {
        warn!("Geolocation is disabled - events are stored without location data");
        None
    };

    let router = api::create_api_router(store, geo);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("🚀 Starting log server on http://{}", addr);
    info!("   - POST http://{}/api/log", addr);
    info!("   - GET  http://{}/logs", addr);

    axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
