// Repository trait for snapshot, bucket and settings storage
use crate::domain::consumption::{DailyBucket, DailyKey, EnergyIncrement, MonthlyBucket, MonthlyKey};
use crate::domain::error::Result;
use crate::domain::port::Port;
use crate::domain::reading::RealtimeReading;
use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::BTreeMap;

/// Everything the dashboard needs for one day, read in a single pass
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DashboardRows {
    pub rate_setting: Option<String>,
    pub realtime: BTreeMap<Port, RealtimeReading>,
    pub daily: BTreeMap<Port, DailyBucket>,
    pub monthly: BTreeMap<Port, MonthlyBucket>,
}

#[async_trait]
pub trait ConsumptionRepository: Send + Sync {
    async fn get_setting(&self, key: &str) -> Result<Option<String>>;

    async fn put_setting(&self, key: &str, value: &str) -> Result<()>;

    /// Replace the snapshot for its port and add `increment` to both buckets,
    /// creating them on first write.
    ///
    /// Must be atomic: concurrent calls for the same key serialize, and a
    /// failure leaves the snapshot and both buckets unchanged.
    async fn record_sample(
        &self,
        snapshot: RealtimeReading,
        daily: DailyKey,
        monthly: MonthlyKey,
        increment: EnergyIncrement,
    ) -> Result<(DailyBucket, MonthlyBucket)>;

    /// Snapshots, the buckets for `date` and its month, and the setting under
    /// `rate_key`, all from one consistent state
    async fn load_dashboard_rows(&self, date: NaiveDate, rate_key: &str) -> Result<DashboardRows>;

    /// Remove every daily bucket dated `date`, returning how many were removed
    async fn delete_daily_for_date(&self, date: NaiveDate) -> Result<usize>;
}
