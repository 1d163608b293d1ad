// Consumption aggregator - Folds power samples into daily and monthly buckets
use crate::application::consumption_repository::ConsumptionRepository;
use crate::domain::consumption::{
    DailyBucket, DailyKey, EnergyIncrement, MonthlyBucket, MonthlyKey,
};
use crate::domain::error::Result;
use crate::domain::reading::{Reading, RealtimeReading};
use chrono::NaiveDateTime;
use std::sync::Arc;

#[derive(Clone)]
pub struct ConsumptionAggregator {
    repository: Arc<dyn ConsumptionRepository>,
}

impl ConsumptionAggregator {
    pub fn new(repository: Arc<dyn ConsumptionRepository>) -> Self {
        Self { repository }
    }

    /// Record `reading` as its port's snapshot and add the energy and cost of
    /// its power held for `elapsed_minutes` to the buckets for `now`, in one
    /// store write. Cost uses `rate` as it stands now; buckets already
    /// accumulated are never recomputed.
    pub async fn apply_reading(
        &self,
        reading: &Reading,
        elapsed_minutes: u32,
        rate: f64,
        now: NaiveDateTime,
    ) -> Result<(DailyBucket, MonthlyBucket)> {
        let port = reading.port;
        let increment = EnergyIncrement::from_power(reading.power, elapsed_minutes, rate);

        let (daily, monthly) = self
            .repository
            .record_sample(
                RealtimeReading::from_reading(reading, now),
                DailyKey::at(now, port),
                MonthlyKey::at(now, port),
                increment,
            )
            .await?;

        tracing::debug!(
            "Port {}: +{:.5} kWh, +{:.4} BDT (today {:.4} kWh, month {:.4} kWh)",
            port,
            increment.energy_kwh,
            increment.cost,
            daily.energy_kwh,
            monthly.energy_kwh
        );

        Ok((daily, monthly))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::port::Port;
    use crate::infrastructure::memory_repository::InMemoryRepository;
    use chrono::NaiveDate;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
    }

    fn port(n: u8) -> Port {
        Port::new(n).unwrap()
    }

    fn sample(n: u8, power: f64) -> Reading {
        Reading::new(port(n), 220.0, power / 220.0, power)
    }

    fn setup() -> (ConsumptionAggregator, Arc<InMemoryRepository>) {
        let repository = Arc::new(InMemoryRepository::new());
        (ConsumptionAggregator::new(repository.clone()), repository)
    }

    #[tokio::test]
    async fn test_accumulation_law() {
        let (aggregator, _) = setup();
        let now = at(2024, 6, 10, 12, 0);

        let (daily, monthly) = aggregator.apply_reading(&sample(1, 600.0), 1, 8.0, now).await.unwrap();
        assert_eq!(daily.energy_kwh, 0.01);
        assert_eq!(daily.cost, 0.08);
        assert_eq!(monthly.energy_kwh, 0.01);
        assert_eq!(monthly.cost, 0.08);

        let (daily, monthly) = aggregator.apply_reading(&sample(1, 600.0), 1, 8.0, now).await.unwrap();
        assert_eq!(daily.energy_kwh, 0.02);
        assert_eq!(daily.cost, 0.16);
        assert_eq!(daily.runtime_minutes, 2);
        assert_eq!(monthly.energy_kwh, 0.02);
        assert_eq!(monthly.cost, 0.16);
    }

    #[tokio::test]
    async fn test_runtime_only_counts_when_powered() {
        let (aggregator, _) = setup();
        let now = at(2024, 6, 10, 12, 0);

        aggregator.apply_reading(&sample(2, 100.0), 1, 8.0, now).await.unwrap();
        let (daily, _) = aggregator.apply_reading(&sample(2, 0.0), 1, 8.0, now).await.unwrap();

        assert_eq!(daily.runtime_minutes, 1);
        assert!((daily.energy_kwh - 100.0 / 60_000.0).abs() < 1e-12);
    }

    #[tokio::test]
    async fn test_first_write_creates_bucket_without_resetting_existing() {
        let (aggregator, repository) = setup();
        let now = at(2024, 6, 10, 12, 0);

        assert!(repository.get_daily(DailyKey::at(now, port(3))).await.unwrap().is_none());

        aggregator.apply_reading(&sample(3, 1200.0), 1, 8.0, now).await.unwrap();
        aggregator.apply_reading(&sample(3, 600.0), 1, 8.0, now).await.unwrap();

        let daily = repository.get_daily(DailyKey::at(now, port(3))).await.unwrap().unwrap();
        assert!((daily.energy_kwh - 0.03).abs() < 1e-12);
    }

    #[tokio::test]
    async fn test_rate_change_is_not_retroactive() {
        let (aggregator, _) = setup();
        let now = at(2024, 6, 10, 12, 0);

        aggregator.apply_reading(&sample(1, 600.0), 1, 8.0, now).await.unwrap();
        let (daily, _) = aggregator.apply_reading(&sample(1, 600.0), 1, 10.0, now).await.unwrap();

        assert!((daily.cost - 0.18).abs() < 1e-12);
    }

    #[tokio::test]
    async fn test_day_and_month_rollover() {
        let (aggregator, repository) = setup();
        let before = at(2024, 1, 31, 23, 59);
        let after = at(2024, 2, 1, 0, 0);

        aggregator.apply_reading(&sample(1, 600.0), 1, 8.0, before).await.unwrap();
        let (daily, monthly) = aggregator.apply_reading(&sample(1, 600.0), 1, 8.0, after).await.unwrap();

        assert_eq!(daily.energy_kwh, 0.01);
        assert_eq!(monthly.energy_kwh, 0.01);

        let january = repository
            .get_monthly(MonthlyKey::new(2024, 1, port(1)))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(january.energy_kwh, 0.01);
    }

    #[tokio::test]
    async fn test_concurrent_increments_are_not_lost() {
        let (aggregator, repository) = setup();
        let now = at(2024, 6, 10, 12, 0);
        let n = 200;

        let handles: Vec<_> = (0..n)
            .map(|_| {
                let aggregator = aggregator.clone();
                tokio::spawn(async move {
                    aggregator.apply_reading(&sample(4, 600.0), 1, 8.0, now).await
                })
            })
            .collect();

        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let daily = repository.get_daily(DailyKey::at(now, port(4))).await.unwrap().unwrap();
        let monthly = repository
            .get_monthly(MonthlyKey::at(now, port(4)))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(daily.runtime_minutes, n);
        assert!((daily.energy_kwh - n as f64 * 0.01).abs() < 1e-9);
        assert!((daily.cost - n as f64 * 0.08).abs() < 1e-9);
        assert!((monthly.energy_kwh - n as f64 * 0.01).abs() < 1e-9);
    }
}
