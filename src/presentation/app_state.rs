// Application state for HTTP and WebSocket handlers
use crate::application::admin_service::AdminService;
use crate::application::broadcaster::UpdateBroadcaster;
use crate::application::dashboard_service::DashboardService;
use crate::application::ingest_service::IngestService;

#[derive(Clone)]
pub struct AppState {
    pub dashboard_service: DashboardService,
    pub ingest_service: IngestService,
    pub admin_service: AdminService,
    pub broadcaster: UpdateBroadcaster,
}

#[cfg(test)]
impl AppState {
    /// Fully wired state over an empty in-memory store with the clock pinned at `now`
    pub fn in_memory(now: chrono::NaiveDateTime) -> Self {
        use crate::application::broadcaster::DashboardPublisher;
        use crate::application::clock::{Clock, FixedClock};
        use crate::application::ingest_service::IngestPolicy;
        use crate::application::rate_service::{RateService, DEFAULT_RATE};
        use crate::infrastructure::memory_repository::InMemoryRepository;
        use std::sync::Arc;

        let repository = Arc::new(InMemoryRepository::new());
        let clock: Arc<dyn Clock> = Arc::new(FixedClock::new(now));
        let rates = RateService::new(repository.clone(), DEFAULT_RATE);
        let dashboard = DashboardService::new(repository.clone(), rates.clone(), clock.clone());
        let broadcaster = UpdateBroadcaster::new(16);
        let publisher = DashboardPublisher::new(dashboard.clone(), broadcaster.clone());

        Self {
            dashboard_service: dashboard,
            ingest_service: IngestService::new(
                repository.clone(),
                rates.clone(),
                publisher.clone(),
                clock.clone(),
                IngestPolicy::default(),
            ),
            admin_service: AdminService::new(repository, rates, publisher, clock),
            broadcaster,
        }
    }
}
