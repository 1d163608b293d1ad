// Dashboard service - Projects snapshots, buckets and the rate into one view
use crate::application::clock::Clock;
use crate::application::consumption_repository::{ConsumptionRepository, DashboardRows};
use crate::application::rate_service::{RateService, RATE_SETTING_KEY};
use crate::domain::consumption::{format_runtime, round2};
use crate::domain::dashboard::{
    DailyTotal, DailyView, DashboardView, MonthlyTotal, MonthlyView, PortTable, RealtimeView,
};
use crate::domain::error::Result;
use crate::domain::port::Port;
use chrono::{Datelike, NaiveDateTime};
use std::collections::BTreeMap;
use std::sync::Arc;

#[derive(Clone)]
pub struct DashboardService {
    repository: Arc<dyn ConsumptionRepository>,
    rates: RateService,
    clock: Arc<dyn Clock>,
}

impl DashboardService {
    pub fn new(
        repository: Arc<dyn ConsumptionRepository>,
        rates: RateService,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            repository,
            rates,
            clock,
        }
    }

    pub async fn project(&self) -> Result<DashboardView> {
        self.project_at(self.clock.now()).await
    }

    /// Every figure in the view comes from one read of the store
    pub async fn project_at(&self, now: NaiveDateTime) -> Result<DashboardView> {
        let rows = self
            .repository
            .load_dashboard_rows(now.date(), RATE_SETTING_KEY)
            .await?;

        Ok(DashboardView {
            realtime: realtime(&rows),
            today: today(&rows),
            monthly: monthly(&rows, now.day()),
            electricity_rate: self.rates.rate_from_setting(rows.rate_setting.as_deref()),
        })
    }
}

fn realtime(rows: &DashboardRows) -> BTreeMap<String, RealtimeView> {
    Port::all()
        .map(|port| {
            let view = match rows.realtime.get(&port) {
                Some(reading) => RealtimeView {
                    voltage: reading.voltage,
                    current: reading.current,
                    power: reading.power,
                    status: reading.status,
                    last_updated: Some(reading.timestamp),
                },
                None => RealtimeView::offline(),
            };
            (port.key(), view)
        })
        .collect()
}

fn today(rows: &DashboardRows) -> PortTable<DailyView, DailyTotal> {
    let mut ports = BTreeMap::new();
    let mut energy = 0.0;
    let mut cost = 0.0;
    let mut runtime = 0;

    for port in Port::all() {
        let view = match rows.daily.get(&port) {
            Some(bucket) => {
                energy += bucket.energy_kwh;
                cost += bucket.cost;
                runtime += bucket.runtime_minutes;

                DailyView {
                    energy: round2(bucket.energy_kwh),
                    cost: round2(bucket.cost),
                    runtime: format_runtime(bucket.runtime_minutes),
                    runtime_minutes: bucket.runtime_minutes,
                }
            }
            None => DailyView {
                energy: 0.0,
                cost: 0.0,
                runtime: format_runtime(0),
                runtime_minutes: 0,
            },
        };
        ports.insert(port.key(), view);
    }

    PortTable {
        ports,
        total: DailyTotal {
            energy: round2(energy),
            cost: round2(cost),
            runtime: format_runtime(runtime),
        },
    }
}

fn monthly(rows: &DashboardRows, day_of_month: u32) -> PortTable<MonthlyView, MonthlyTotal> {
    let mut ports = BTreeMap::new();
    let mut energy = 0.0;
    let mut cost = 0.0;

    for port in Port::all() {
        let view = match rows.monthly.get(&port) {
            Some(bucket) => {
                energy += bucket.energy_kwh;
                cost += bucket.cost;

                MonthlyView {
                    energy: round2(bucket.energy_kwh),
                    cost: round2(bucket.cost),
                }
            }
            None => MonthlyView {
                energy: 0.0,
                cost: 0.0,
            },
        };
        ports.insert(port.key(), view);
    }

    PortTable {
        ports,
        total: MonthlyTotal {
            energy: round2(energy),
            cost: round2(cost),
            days: day_of_month,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::clock::FixedClock;
    use crate::application::rate_service::DEFAULT_RATE;
    use crate::domain::consumption::{DailyKey, EnergyIncrement, MonthlyKey};
    use crate::domain::reading::{PortStatus, RealtimeReading, Reading};
    use crate::infrastructure::memory_repository::InMemoryRepository;
    use chrono::NaiveDate;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 2, 17)
            .unwrap()
            .and_hms_opt(9, 30, 0)
            .unwrap()
    }

    fn port(n: u8) -> Port {
        Port::new(n).unwrap()
    }

    fn setup() -> (DashboardService, Arc<InMemoryRepository>) {
        let repository = Arc::new(InMemoryRepository::new());
        let rates = RateService::new(repository.clone(), DEFAULT_RATE);
        let clock = Arc::new(FixedClock::new(now()));
        (
            DashboardService::new(repository.clone(), rates, clock),
            repository,
        )
    }

    async fn add(repository: &InMemoryRepository, port: Port, power: f64, minutes: u32) {
        let increment = EnergyIncrement::from_power(power, minutes, DEFAULT_RATE);
        repository
            .apply_increment(DailyKey::at(now(), port), MonthlyKey::at(now(), port), increment)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_empty_store_projects_zeroed_view() {
        let (dashboard, _) = setup();
        let view = dashboard.project().await.unwrap();

        for port in Port::all() {
            assert_eq!(view.realtime(port), Some(&RealtimeView::offline()));
            let today = view.today.port(port).unwrap();
            assert_eq!(today.energy, 0.0);
            assert_eq!(today.runtime, "0h 0m");
            assert_eq!(view.monthly.port(port).unwrap().cost, 0.0);
        }
        assert_eq!(view.today.total.runtime, "0h 0m");
        assert_eq!(view.monthly.total.days, 17);
        assert_eq!(view.electricity_rate, DEFAULT_RATE);
    }

    #[tokio::test]
    async fn test_totals_sum_unrounded_values() {
        let (dashboard, repository) = setup();
        // 0.004 kWh per port rounds to 0.0 individually but the total is 0.016
        for p in Port::all() {
            add(&repository, p, 240.0, 1).await;
        }
        add(&repository, port(1), 600.0, 124).await;

        let view = dashboard.project().await.unwrap();
        assert_eq!(view.today.port(port(2)).unwrap().energy, 0.0);
        assert_eq!(view.today.port(port(1)).unwrap().runtime, "2h 5m");
        assert_eq!(view.today.total.energy, round2(4.0 * 0.004 + 1.24));
        assert_eq!(view.today.total.runtime, "2h 8m");
        assert_eq!(view.monthly.total.energy, view.today.total.energy);
    }

    #[tokio::test]
    async fn test_realtime_reading_is_reflected() {
        let (dashboard, repository) = setup();
        let reading = Reading::new(port(3), 221.0, 0.2, 44.2);
        repository
            .upsert_realtime(RealtimeReading::from_reading(&reading, now()))
            .await
            .unwrap();

        let view = dashboard.project().await.unwrap();
        let realtime = view.realtime(port(3)).unwrap();
        assert_eq!(realtime.power, 44.2);
        assert_eq!(realtime.status, PortStatus::Online);
        assert_eq!(realtime.last_updated, Some(now()));
        assert_eq!(view.realtime(port(1)), Some(&RealtimeView::offline()));
    }

    #[tokio::test]
    async fn test_projection_is_idempotent() {
        let (dashboard, repository) = setup();
        add(&repository, port(2), 180.0, 3).await;

        let first = dashboard.project().await.unwrap();
        let second = dashboard.project().await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_serialized_shape() {
        let (dashboard, _) = setup();
        let json = serde_json::to_value(dashboard.project().await.unwrap()).unwrap();

        assert_eq!(json["realtime"]["port1"]["status"], "offline");
        assert_eq!(json["today"]["port4"]["runtime"], "0h 0m");
        assert_eq!(json["today"]["total"]["runtime"], "0h 0m");
        assert_eq!(json["monthly"]["total"]["days"], 17);
        assert_eq!(json["electricity_rate"], 8.0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_projection_is_consistent_under_concurrent_writes() {
        let (dashboard, repository) = setup();

        let writer = {
            let repository = repository.clone();
            tokio::spawn(async move {
                for _ in 0..2_000 {
                    for p in Port::all() {
                        add(&repository, p, 600.0, 1).await;
                    }
                }
            })
        };

        // Today and this month receive identical increments, so any view
        // taken from one state has equal totals.
        while !writer.is_finished() {
            let view = dashboard.project().await.unwrap();
            assert_eq!(view.today.total.energy, view.monthly.total.energy);
            assert_eq!(view.today.total.cost, view.monthly.total.cost);
        }
        writer.await.unwrap();

        let view = dashboard.project().await.unwrap();
        assert_eq!(view.today.total.energy, view.monthly.total.energy);
        assert_eq!(view.today.total.runtime, "133h 20m");
    }
}
