use crate::application::ingest_service::IngestPolicy;
use crate::application::rate_service::DEFAULT_RATE;
use crate::application::sample_producer::ProducerConfig;
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerSettings,
    pub rates: RateSettings,
    pub producer: ProducerSettings,
    #[serde(default)]
    pub storage: StorageSettings,
    pub broadcast: BroadcastSettings,
    pub ingest: IngestSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RateSettings {
    pub default_rate: f64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ProducerSettings {
    pub enabled: bool,
    pub interval_secs: u64,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct StorageSettings {
    /// JSON snapshot file; in-memory only when unset
    #[serde(default)]
    pub snapshot_path: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BroadcastSettings {
    pub capacity: usize,
}

#[derive(Debug, Deserialize, Clone)]
pub struct IngestSettings {
    pub retry_attempts: u32,
    pub retry_base_delay_ms: u64,
    pub reject_negative: bool,
}

impl AppConfig {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    pub fn ingest_policy(&self) -> IngestPolicy {
        IngestPolicy {
            retry_attempts: self.ingest.retry_attempts,
            retry_base_delay: Duration::from_millis(self.ingest.retry_base_delay_ms),
            reject_negative: self.ingest.reject_negative,
        }
    }

    pub fn producer_config(&self) -> ProducerConfig {
        ProducerConfig {
            interval_secs: self.producer.interval_secs,
        }
    }
}

/// Defaults, then `config/multiplug.*` if present, then `MULTIPLUG__*` env vars
pub fn load_app_config() -> anyhow::Result<AppConfig> {
    load_app_config_from(config::File::with_name("config/multiplug").required(false))
}

pub fn load_app_config_from<S>(source: S) -> anyhow::Result<AppConfig>
where
    S: config::Source + Send + Sync + 'static,
{
    let settings = config::Config::builder()
        .set_default("server.host", "0.0.0.0")?
        .set_default("server.port", 5000_i64)?
        .set_default("rates.default_rate", DEFAULT_RATE)?
        .set_default("producer.enabled", true)?
        .set_default("producer.interval_secs", 60_i64)?
        .set_default("broadcast.capacity", 64_i64)?
        .set_default("ingest.retry_attempts", 3_i64)?
        .set_default("ingest.retry_base_delay_ms", 50_i64)?
        .set_default("ingest.reject_negative", false)?
        .add_source(source)
        .add_source(
            config::Environment::with_prefix("MULTIPLUG")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    let app_config: AppConfig = settings.try_deserialize()?;

    if !app_config.rates.default_rate.is_finite() || app_config.rates.default_rate <= 0.0 {
        anyhow::bail!(
            "rates.default_rate must be positive, got {}",
            app_config.rates.default_rate
        );
    }

    Ok(app_config)
}
