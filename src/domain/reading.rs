// Reading domain models - incoming samples and the per-port realtime snapshot
use super::error::{MultiplugError, Result};
use super::port::Port;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PortStatus {
    Online,
    Offline,
}

impl PortStatus {
    pub fn from_power(power: f64) -> Self {
        if power > 0.0 {
            PortStatus::Online
        } else {
            PortStatus::Offline
        }
    }
}

/// A sample as it arrives from a device, before validation.
///
/// Fields are kept as raw JSON so that numeric strings such as `"220.5"`
/// are accepted alongside plain numbers.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawReading {
    pub port: Option<Value>,
    pub voltage: Option<Value>,
    pub current: Option<Value>,
    pub power: Option<Value>,
}

impl RawReading {
    pub fn validate(&self) -> Result<Reading> {
        let (Some(port), Some(voltage), Some(current), Some(power)) =
            (&self.port, &self.voltage, &self.current, &self.power)
        else {
            return Err(MultiplugError::validation("Missing required fields"));
        };

        Ok(Reading {
            port: parse_port(port)?,
            voltage: parse_number("voltage", voltage)?,
            current: parse_number("current", current)?,
            power: parse_number("power", power)?,
        })
    }
}

/// A validated sample for a single port
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reading {
    pub port: Port,
    pub voltage: f64,
    pub current: f64,
    pub power: f64,
}

impl Reading {
    pub fn new(port: Port, voltage: f64, current: f64, power: f64) -> Self {
        Self {
            port,
            voltage,
            current,
            power,
        }
    }

    pub fn status(&self) -> PortStatus {
        PortStatus::from_power(self.power)
    }

    pub fn has_negative(&self) -> bool {
        self.voltage < 0.0 || self.current < 0.0 || self.power < 0.0
    }
}

/// Latest instantaneous state of a port. Exactly one per port, overwritten on every sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RealtimeReading {
    pub port: Port,
    pub voltage: f64,
    pub current: f64,
    pub power: f64,
    pub status: PortStatus,
    pub timestamp: NaiveDateTime,
}

impl RealtimeReading {
    pub fn from_reading(reading: &Reading, timestamp: NaiveDateTime) -> Self {
        Self {
            port: reading.port,
            voltage: reading.voltage,
            current: reading.current,
            power: reading.power,
            status: reading.status(),
            timestamp,
        }
    }
}

/// Parse a finite number from a JSON number or numeric string
pub fn parse_number(field: &str, value: &Value) -> Result<f64> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };

    match parsed {
        Some(v) if v.is_finite() => Ok(v),
        _ => Err(MultiplugError::validation(format!(
            "Invalid value for {}",
            field
        ))),
    }
}

fn parse_port(value: &Value) -> Result<Port> {
    let number = parse_number("port", value)
        .map_err(|_| MultiplugError::validation("Invalid port number"))?;

    if number.fract() != 0.0 || number < 0.0 || number > u8::MAX as f64 {
        return Err(MultiplugError::validation("Invalid port number"));
    }

    Port::new(number as u8)
}
