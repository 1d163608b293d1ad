// Ingest service - Validates a sample, stores the snapshot, aggregates and publishes
use crate::application::aggregator::ConsumptionAggregator;
use crate::application::broadcaster::DashboardPublisher;
use crate::application::clock::Clock;
use crate::application::consumption_repository::ConsumptionRepository;
use crate::application::rate_service::RateService;
use crate::domain::error::{MultiplugError, Result};
use crate::domain::reading::{RawReading, Reading};
use chrono::NaiveDateTime;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// Every sample is treated as one minute of constant power, regardless of
/// when it arrives. Devices must report at most once per minute per port,
/// otherwise energy is over-counted.
pub const SAMPLE_INTERVAL_MINUTES: u32 = 1;

#[derive(Debug, Clone)]
pub struct IngestPolicy {
    pub retry_attempts: u32,
    pub retry_base_delay: Duration,
    pub reject_negative: bool,
}

impl Default for IngestPolicy {
    fn default() -> Self {
        Self {
            retry_attempts: 3,
            retry_base_delay: Duration::from_millis(50),
            reject_negative: false,
        }
    }
}

#[derive(Clone)]
pub struct IngestService {
    rates: RateService,
    aggregator: ConsumptionAggregator,
    publisher: DashboardPublisher,
    clock: Arc<dyn Clock>,
    policy: IngestPolicy,
}

impl IngestService {
    pub fn new(
        repository: Arc<dyn ConsumptionRepository>,
        rates: RateService,
        publisher: DashboardPublisher,
        clock: Arc<dyn Clock>,
        policy: IngestPolicy,
    ) -> Self {
        Self {
            aggregator: ConsumptionAggregator::new(repository),
            rates,
            publisher,
            clock,
            policy,
        }
    }

    /// Validate a raw device payload and ingest it
    pub async fn ingest(&self, raw: &RawReading) -> Result<()> {
        let reading = raw.validate()?;
        self.ingest_reading(reading).await
    }

    pub async fn ingest_reading(&self, reading: Reading) -> Result<()> {
        if reading.has_negative() {
            if self.policy.reject_negative {
                return Err(MultiplugError::validation(
                    "Negative voltage, current or power is not allowed",
                ));
            }
            tracing::warn!(
                "Port {} reported negative values: {:.2} V, {:.3} A, {:.2} W",
                reading.port,
                reading.voltage,
                reading.current,
                reading.power
            );
        }

        let now = self.clock.now();
        let rate = self.with_retry(|| self.rates.get_rate()).await?;

        self.with_retry(|| self.store(&reading, rate, now)).await?;

        tracing::debug!(
            "Ingested port {}: {:.1} V, {:.3} A, {:.1} W ({:?})",
            reading.port,
            reading.voltage,
            reading.current,
            reading.power,
            reading.status()
        );

        self.publisher.publish().await;
        Ok(())
    }

    async fn store(&self, reading: &Reading, rate: f64, now: NaiveDateTime) -> Result<()> {
        self.aggregator
            .apply_reading(reading, SAMPLE_INTERVAL_MINUTES, rate, now)
            .await?;
        Ok(())
    }

    /// Retry persistence failures with doubling backoff
    async fn with_retry<T, F, Fut>(&self, operation: F) -> Result<T>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let attempts = self.policy.retry_attempts.max(1);
        let mut delay = self.policy.retry_base_delay;
        let mut attempt = 1;

        loop {
            match operation().await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_retryable() && attempt < attempts => {
                    tracing::warn!(
                        "Attempt {}/{} failed: {}, retrying in {:?}",
                        attempt,
                        attempts,
                        e,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                    delay *= 2;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
