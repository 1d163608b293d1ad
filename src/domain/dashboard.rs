// Dashboard domain model - the read-model pushed to and pulled by clients
#[cfg(test)]
use super::port::Port;
use super::reading::PortStatus;
use chrono::NaiveDateTime;
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardView {
    pub realtime: BTreeMap<String, RealtimeView>,
    pub today: PortTable<DailyView, DailyTotal>,
    pub monthly: PortTable<MonthlyView, MonthlyTotal>,
    pub electricity_rate: f64,
}

/// Per-port entries keyed "port1".."port4" plus a `total` entry
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PortTable<T, Total> {
    #[serde(flatten)]
    pub ports: BTreeMap<String, T>,
    pub total: Total,
}

#[cfg(test)]
impl<T, Total> PortTable<T, Total> {
    pub fn port(&self, port: Port) -> Option<&T> {
        self.ports.get(&port.key())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RealtimeView {
    pub voltage: f64,
    pub current: f64,
    pub power: f64,
    pub status: PortStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<NaiveDateTime>,
}

impl RealtimeView {
    pub fn offline() -> Self {
        Self {
            voltage: 0.0,
            current: 0.0,
            power: 0.0,
            status: PortStatus::Offline,
            last_updated: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyView {
    pub energy: f64,
    pub cost: f64,
    pub runtime: String,
    pub runtime_minutes: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyTotal {
    pub energy: f64,
    pub cost: f64,
    pub runtime: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyView {
    pub energy: f64,
    pub cost: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyTotal {
    pub energy: f64,
    pub cost: f64,
    /// Current day of the month
    pub days: u32,
}

#[cfg(test)]
impl DashboardView {
    pub fn realtime(&self, port: Port) -> Option<&RealtimeView> {
        self.realtime.get(&port.key())
    }
}
