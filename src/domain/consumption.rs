// Consumption domain models - daily and monthly energy/cost buckets
use super::port::Port;
use chrono::{Datelike, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Watt-minutes in one kilowatt-hour
const WATT_MINUTES_PER_KWH: f64 = 60_000.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DailyKey {
    pub date: NaiveDate,
    pub port: Port,
}

impl DailyKey {
    pub fn new(date: NaiveDate, port: Port) -> Self {
        Self { date, port }
    }

    pub fn at(now: NaiveDateTime, port: Port) -> Self {
        Self::new(now.date(), port)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MonthlyKey {
    pub year: i32,
    pub month: u32,
    pub port: Port,
}

impl MonthlyKey {
    pub fn new(year: i32, month: u32, port: Port) -> Self {
        Self { year, month, port }
    }

    pub fn at(now: NaiveDateTime, port: Port) -> Self {
        Self::new(now.year(), now.month(), port)
    }
}

/// Energy, cost and runtime produced by one sample
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnergyIncrement {
    pub energy_kwh: f64,
    pub cost: f64,
    pub runtime_minutes: u32,
}

impl EnergyIncrement {
    /// Treats `power_watts` as constant over `elapsed_minutes`.
    /// Runtime only counts while the port draws power.
    pub fn from_power(power_watts: f64, elapsed_minutes: u32, rate: f64) -> Self {
        let energy_kwh = power_watts * elapsed_minutes as f64 / WATT_MINUTES_PER_KWH;
        let runtime_minutes = if power_watts > 0.0 { elapsed_minutes } else { 0 };

        Self {
            energy_kwh,
            cost: energy_kwh * rate,
            runtime_minutes,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyBucket {
    pub key: DailyKey,
    pub energy_kwh: f64,
    pub cost: f64,
    pub runtime_minutes: u32,
}

impl DailyBucket {
    pub fn empty(key: DailyKey) -> Self {
        Self {
            key,
            energy_kwh: 0.0,
            cost: 0.0,
            runtime_minutes: 0,
        }
    }

    pub fn accumulate(&mut self, increment: &EnergyIncrement) {
        self.energy_kwh += increment.energy_kwh;
        self.cost += increment.cost;
        self.runtime_minutes += increment.runtime_minutes;
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyBucket {
    pub key: MonthlyKey,
    pub energy_kwh: f64,
    pub cost: f64,
}

impl MonthlyBucket {
    pub fn empty(key: MonthlyKey) -> Self {
        Self {
            key,
            energy_kwh: 0.0,
            cost: 0.0,
        }
    }

    pub fn accumulate(&mut self, increment: &EnergyIncrement) {
        self.energy_kwh += increment.energy_kwh;
        self.cost += increment.cost;
    }
}

/// Format minutes as "{hours}h {minutes}m"
pub fn format_runtime(minutes: u32) -> String {
    format!("{}h {}m", minutes / 60, minutes % 60)
}

/// Round to two decimals for display. Stored totals are never rounded.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
