// Sample producer - Stands in for the multiplug hardware, one reading per port per tick

use crate::application::ingest_service::IngestService;
use crate::domain::port::Port;
use crate::domain::reading::Reading;
use rand::Rng;
use std::time::Duration;
use tokio::time::interval;

/// Typical device on each outlet: (min watts, max watts, probability of being on)
const DEVICE_PROFILES: [(f64, f64, f64); 4] = [
    (800.0, 1200.0, 0.7), // AC / heater
    (150.0, 300.0, 0.9),  // refrigerator
    (20.0, 60.0, 0.8),    // LED lighting
    (50.0, 200.0, 0.3),   // occasional use
];

const BASE_VOLTAGES: [f64; 4] = [220.0, 218.0, 222.0, 219.0];
const VOLTAGE_JITTER: f64 = 5.0;

#[derive(Debug, Clone)]
pub struct ProducerConfig {
    pub interval_secs: u64,
}

impl Default for ProducerConfig {
    fn default() -> Self {
        Self { interval_secs: 60 }
    }
}

#[derive(Clone)]
pub struct SampleProducer {
    ingest: IngestService,
    config: ProducerConfig,
}

impl SampleProducer {
    pub fn new(ingest: IngestService, config: ProducerConfig) -> Self {
        Self { ingest, config }
    }

    /// Run the producer loop. The first tick fires immediately.
    /// A failed tick is logged and the loop carries on.
    pub async fn run(&self) {
        tracing::info!(
            "Sample producer started (interval: {}s)",
            self.config.interval_secs
        );

        let mut interval = interval(Duration::from_secs(self.config.interval_secs.max(1)));

        loop {
            interval.tick().await;

            // Each tick runs in its own task so a panic cannot take the loop down
            let producer = self.clone();
            match tokio::spawn(async move { producer.tick().await }).await {
                Ok(0) => {}
                Ok(failed) => {
                    tracing::error!("Sample producer tick failed for {} port(s)", failed);
                }
                Err(e) => tracing::error!("Sample producer tick aborted: {}", e),
            }
        }
    }

    /// Produce and ingest one reading per port, returning how many failed
    pub async fn tick(&self) -> usize {
        let readings = synthesize(&mut rand::thread_rng());
        let mut failed = 0;

        for reading in readings {
            if let Err(e) = self.ingest.ingest_reading(reading).await {
                tracing::error!("Failed to ingest sample for port {}: {}", reading.port, e);
                failed += 1;
            }
        }

        failed
    }
}

/// One plausible reading per port
pub fn synthesize<R: Rng>(rng: &mut R) -> Vec<Reading> {
    Port::all()
        .zip(DEVICE_PROFILES.iter().zip(BASE_VOLTAGES.iter()))
        .map(|(port, (&(min_w, max_w, on_probability), &base_voltage))| {
            let power = if rng.gen_bool(on_probability) {
                rng.gen_range(min_w..max_w)
            } else {
                0.0
            };

            let voltage = if power > 0.0 {
                base_voltage + rng.gen_range(-VOLTAGE_JITTER..VOLTAGE_JITTER)
            } else {
                0.0
            };
            let current = if voltage > 0.0 { power / voltage } else { 0.0 };

            Reading::new(port, voltage, current, power)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::broadcaster::{DashboardPublisher, UpdateBroadcaster};
    use crate::application::clock::{Clock, FixedClock};
    use crate::application::dashboard_service::DashboardService;
    use crate::application::ingest_service::IngestPolicy;
    use crate::application::rate_service::{RateService, DEFAULT_RATE};
    use crate::infrastructure::memory_repository::InMemoryRepository;
    use chrono::NaiveDate;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::sync::Arc;

    #[test]
    fn test_synthesized_readings_follow_profiles() {
        let mut rng = StdRng::seed_from_u64(42);

        for _ in 0..500 {
            let readings = synthesize(&mut rng);
            assert_eq!(readings.len(), 4);

            for (i, reading) in readings.iter().enumerate() {
                let (min_w, max_w, _) = DEVICE_PROFILES[i];
                assert_eq!(reading.port.number() as usize, i + 1);

                if reading.power > 0.0 {
                    assert!(reading.power >= min_w && reading.power < max_w);
                    assert!((reading.voltage - BASE_VOLTAGES[i]).abs() <= VOLTAGE_JITTER);
                    assert!((reading.current * reading.voltage - reading.power).abs() < 1e-9);
                } else {
                    assert_eq!(reading.voltage, 0.0);
                    assert_eq!(reading.current, 0.0);
                }
            }
        }
    }

    #[tokio::test]
    async fn test_tick_ingests_every_port() {
        let repository = Arc::new(InMemoryRepository::new());
        let now = NaiveDate::from_ymd_opt(2024, 8, 1)
            .unwrap()
            .and_hms_opt(8, 0, 0)
            .unwrap();
        let clock: Arc<dyn Clock> = Arc::new(FixedClock::new(now));
        let rates = RateService::new(repository.clone(), DEFAULT_RATE);
        let dashboard = DashboardService::new(repository.clone(), rates.clone(), clock.clone());
        let publisher = DashboardPublisher::new(dashboard.clone(), UpdateBroadcaster::new(8));
        let ingest = IngestService::new(
            repository.clone(),
            rates,
            publisher,
            clock,
            IngestPolicy::default(),
        );

        let producer = SampleProducer::new(ingest, ProducerConfig::default());
        assert_eq!(producer.tick().await, 0);

        let view = dashboard.project().await.unwrap();
        for port in Port::all() {
            let realtime = view.realtime(port).unwrap();
            assert_eq!(realtime.last_updated, Some(now));
        }
    }
}
