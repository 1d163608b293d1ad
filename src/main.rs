// Main entry point - Dependency injection and server setup
mod application;
mod domain;
mod infrastructure;
mod presentation;

use std::{net::SocketAddr, path::Path, sync::Arc};
use tokio::signal;
use tracing_subscriber::EnvFilter;

use crate::application::admin_service::AdminService;
use crate::application::broadcaster::{DashboardPublisher, UpdateBroadcaster};
use crate::application::clock::{Clock, SystemClock};
use crate::application::consumption_repository::ConsumptionRepository;
use crate::application::dashboard_service::DashboardService;
use crate::application::ingest_service::IngestService;
use crate::application::rate_service::RateService;
use crate::application::sample_producer::SampleProducer;
use crate::infrastructure::config::load_app_config;
use crate::infrastructure::memory_repository::InMemoryRepository;
use crate::presentation::app_state::AppState;
use crate::presentation::routes::create_router;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("multiplug_telemetry=info,tower_http=info")),
        )
        .init();

    // Load configuration
    let config = load_app_config()?;

    // Create repository (infrastructure layer)
    let repository: Arc<dyn ConsumptionRepository> = match &config.storage.snapshot_path {
        Some(path) => {
            if let Some(parent) = Path::new(path).parent().filter(|p| !p.as_os_str().is_empty()) {
                tokio::fs::create_dir_all(parent).await?;
            }
            Arc::new(InMemoryRepository::open(path).await?)
        }
        None => {
            tracing::warn!("No snapshot path configured, consumption data is not durable");
            Arc::new(InMemoryRepository::new())
        }
    };

    // Create services (application layer)
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let rates = RateService::new(repository.clone(), config.rates.default_rate);
    let rate = rates.ensure_default().await?;
    tracing::info!("Electricity rate: {} BDT/kWh", rate);

    let dashboard_service = DashboardService::new(repository.clone(), rates.clone(), clock.clone());
    let broadcaster = UpdateBroadcaster::new(config.broadcast.capacity);
    let publisher = DashboardPublisher::new(dashboard_service.clone(), broadcaster.clone());
    let ingest_service = IngestService::new(
        repository.clone(),
        rates.clone(),
        publisher.clone(),
        clock.clone(),
        config.ingest_policy(),
    );
    let admin_service = AdminService::new(repository, rates, publisher, clock);

    let producer = if config.producer.enabled {
        let producer = SampleProducer::new(ingest_service.clone(), config.producer_config());
        Some(tokio::spawn(async move { producer.run().await }))
    } else {
        tracing::info!("Sample producer disabled");
        None
    };

    // Create application state
    let state = Arc::new(AppState {
        dashboard_service,
        ingest_service,
        admin_service,
        broadcaster,
    });

    // Build router (presentation layer)
    let router = create_router(state);

    // Start server
    let addr: SocketAddr = config.bind_address().parse()?;
    tracing::info!("Starting multiplug-telemetry service on {}", addr);

    axum::serve(tokio::net::TcpListener::bind(addr).await?, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(handle) = producer {
        handle.abort();
    }

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
