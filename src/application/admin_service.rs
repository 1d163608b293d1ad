// Admin service - Administrative state changes that trigger a broadcast
use crate::application::broadcaster::DashboardPublisher;
use crate::application::clock::Clock;
use crate::application::consumption_repository::ConsumptionRepository;
use crate::application::rate_service::RateService;
use crate::domain::error::Result;
use std::sync::Arc;

#[derive(Clone)]
pub struct AdminService {
    repository: Arc<dyn ConsumptionRepository>,
    rates: RateService,
    publisher: DashboardPublisher,
    clock: Arc<dyn Clock>,
}

impl AdminService {
    pub fn new(
        repository: Arc<dyn ConsumptionRepository>,
        rates: RateService,
        publisher: DashboardPublisher,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            repository,
            rates,
            publisher,
            clock,
        }
    }

    /// Clear today's daily buckets for every port.
    ///
    /// Monthly buckets keep today's contribution.
    pub async fn reset_today(&self) -> Result<usize> {
        let today = self.clock.now().date();
        let cleared = self.repository.delete_daily_for_date(today).await?;
        tracing::info!("Reset {} daily bucket(s) for {}", cleared, today);

        self.publisher.publish().await;
        Ok(cleared)
    }

    pub async fn update_rate(&self, rate: f64) -> Result<()> {
        self.rates.set_rate(rate).await?;
        self.publisher.publish().await;
        Ok(())
    }
}
