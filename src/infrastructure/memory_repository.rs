// In-memory repository implementation with optional JSON snapshot durability
use crate::application::consumption_repository::{ConsumptionRepository, DashboardRows};
use crate::domain::consumption::{DailyBucket, DailyKey, EnergyIncrement, MonthlyBucket, MonthlyKey};
use crate::domain::error::{MultiplugError, Result};
use crate::domain::port::Port;
use crate::domain::reading::RealtimeReading;
use async_trait::async_trait;
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

#[derive(Debug, Clone, Default)]
struct Tables {
    settings: BTreeMap<String, String>,
    realtime: BTreeMap<Port, RealtimeReading>,
    daily: BTreeMap<DailyKey, DailyBucket>,
    monthly: BTreeMap<MonthlyKey, MonthlyBucket>,
}

/// On-disk layout. Buckets carry their own keys, so plain lists suffice.
#[derive(Debug, Default, Serialize, Deserialize)]
struct Snapshot {
    #[serde(default)]
    settings: BTreeMap<String, String>,
    #[serde(default)]
    realtime: Vec<RealtimeReading>,
    #[serde(default)]
    daily: Vec<DailyBucket>,
    #[serde(default)]
    monthly: Vec<MonthlyBucket>,
}

impl Tables {
    fn increment(
        &mut self,
        daily: DailyKey,
        monthly: MonthlyKey,
        increment: &EnergyIncrement,
    ) -> (DailyBucket, MonthlyBucket) {
        let daily_bucket = self
            .daily
            .entry(daily)
            .or_insert_with(|| DailyBucket::empty(daily));
        daily_bucket.accumulate(increment);
        let daily_bucket = daily_bucket.clone();

        let monthly_bucket = self
            .monthly
            .entry(monthly)
            .or_insert_with(|| MonthlyBucket::empty(monthly));
        monthly_bucket.accumulate(increment);

        (daily_bucket, monthly_bucket.clone())
    }
}

impl From<Snapshot> for Tables {
    fn from(snapshot: Snapshot) -> Self {
        Self {
            settings: snapshot.settings,
            realtime: snapshot.realtime.into_iter().map(|r| (r.port, r)).collect(),
            daily: snapshot.daily.into_iter().map(|b| (b.key, b)).collect(),
            monthly: snapshot.monthly.into_iter().map(|b| (b.key, b)).collect(),
        }
    }
}

impl From<&Tables> for Snapshot {
    fn from(tables: &Tables) -> Self {
        Self {
            settings: tables.settings.clone(),
            realtime: tables.realtime.values().cloned().collect(),
            daily: tables.daily.values().cloned().collect(),
            monthly: tables.monthly.values().cloned().collect(),
        }
    }
}

/// All tables sit behind one lock, which makes every write a single
/// critical section: bucket increments serialize and the daily/monthly pair
/// is applied together.
pub struct InMemoryRepository {
    tables: Mutex<Tables>,
    snapshot_path: Option<PathBuf>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self {
            tables: Mutex::new(Tables::default()),
            snapshot_path: None,
        }
    }

    /// Open a durable repository backed by a JSON snapshot file.
    /// A missing file starts empty.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();

        let tables = match tokio::fs::read(&path).await {
            Ok(bytes) => {
                let snapshot: Snapshot = serde_json::from_slice(&bytes).map_err(|e| {
                    MultiplugError::persistence(format!(
                        "Corrupt snapshot {}: {}",
                        path.display(),
                        e
                    ))
                })?;
                Tables::from(snapshot)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::info!("No snapshot at {}, starting empty", path.display());
                Tables::default()
            }
            Err(e) => {
                return Err(MultiplugError::persistence(format!(
                    "Failed to read snapshot {}: {}",
                    path.display(),
                    e
                )));
            }
        };

        tracing::info!(
            "Loaded snapshot {} ({} daily, {} monthly bucket(s))",
            path.display(),
            tables.daily.len(),
            tables.monthly.len()
        );

        Ok(Self {
            tables: Mutex::new(tables),
            snapshot_path: Some(path),
        })
    }

    /// Apply `mutate` under the lock. When durable, the new state is written
    /// to disk before it becomes visible; a failed write changes nothing.
    async fn write<T>(&self, mutate: impl FnOnce(&mut Tables) -> T) -> Result<T> {
        let mut tables = self.tables.lock().await;

        let Some(path) = &self.snapshot_path else {
            return Ok(mutate(&mut *tables));
        };

        let mut next = tables.clone();
        let output = mutate(&mut next);
        Self::persist(path, &next).await?;
        *tables = next;

        Ok(output)
    }

    async fn persist(path: &Path, tables: &Tables) -> Result<()> {
        let bytes = serde_json::to_vec(&Snapshot::from(tables))
            .map_err(|e| MultiplugError::Internal(e.to_string()))?;

        let tmp = path.with_extension("tmp");
        tokio::fs::write(&tmp, &bytes).await.map_err(|e| {
            MultiplugError::persistence(format!("Failed to write {}: {}", tmp.display(), e))
        })?;
        tokio::fs::rename(&tmp, path).await.map_err(|e| {
            MultiplugError::persistence(format!("Failed to replace {}: {}", path.display(), e))
        })?;

        Ok(())
    }
}

impl Default for InMemoryRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
impl InMemoryRepository {
    pub async fn apply_increment(
        &self,
        daily: DailyKey,
        monthly: MonthlyKey,
        increment: EnergyIncrement,
    ) -> Result<(DailyBucket, MonthlyBucket)> {
        self.write(|t| t.increment(daily, monthly, &increment)).await
    }

    pub async fn upsert_realtime(&self, reading: RealtimeReading) -> Result<()> {
        self.write(|t| {
            t.realtime.insert(reading.port, reading);
        })
        .await
    }

    pub async fn get_realtime(&self, port: Port) -> Result<Option<RealtimeReading>> {
        Ok(self.tables.lock().await.realtime.get(&port).cloned())
    }

    pub async fn get_daily(&self, key: DailyKey) -> Result<Option<DailyBucket>> {
        Ok(self.tables.lock().await.daily.get(&key).cloned())
    }

    pub async fn get_monthly(&self, key: MonthlyKey) -> Result<Option<MonthlyBucket>> {
        Ok(self.tables.lock().await.monthly.get(&key).cloned())
    }
}

#[async_trait]
impl ConsumptionRepository for InMemoryRepository {
    async fn get_setting(&self, key: &str) -> Result<Option<String>> {
        Ok(self.tables.lock().await.settings.get(key).cloned())
    }

    async fn put_setting(&self, key: &str, value: &str) -> Result<()> {
        self.write(|t| {
            t.settings.insert(key.to_string(), value.to_string());
        })
        .await
    }

    async fn record_sample(
        &self,
        snapshot: RealtimeReading,
        daily: DailyKey,
        monthly: MonthlyKey,
        increment: EnergyIncrement,
    ) -> Result<(DailyBucket, MonthlyBucket)> {
        self.write(|t| {
            t.realtime.insert(snapshot.port, snapshot);
            t.increment(daily, monthly, &increment)
        })
        .await
    }

    async fn load_dashboard_rows(&self, date: NaiveDate, rate_key: &str) -> Result<DashboardRows> {
        let tables = self.tables.lock().await;
        let mut rows = DashboardRows {
            rate_setting: tables.settings.get(rate_key).cloned(),
            ..DashboardRows::default()
        };

        for port in Port::all() {
            if let Some(reading) = tables.realtime.get(&port) {
                rows.realtime.insert(port, reading.clone());
            }
            if let Some(bucket) = tables.daily.get(&DailyKey::new(date, port)) {
                rows.daily.insert(port, bucket.clone());
            }
            let monthly_key = MonthlyKey::new(date.year(), date.month(), port);
            if let Some(bucket) = tables.monthly.get(&monthly_key) {
                rows.monthly.insert(port, bucket.clone());
            }
        }

        Ok(rows)
    }

    async fn delete_daily_for_date(&self, date: NaiveDate) -> Result<usize> {
        self.write(|t| {
            let before = t.daily.len();
            t.daily.retain(|key, _| key.date != date);
            before - t.daily.len()
        })
        .await
    }
}
