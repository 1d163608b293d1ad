// Rate service - Current electricity price per kWh, kept in the settings table
use crate::application::consumption_repository::ConsumptionRepository;
use crate::domain::error::{MultiplugError, Result};
use std::sync::Arc;

pub const RATE_SETTING_KEY: &str = "electricity_rate_bdt";
pub const DEFAULT_RATE: f64 = 8.0;

#[derive(Clone)]
pub struct RateService {
    repository: Arc<dyn ConsumptionRepository>,
    default_rate: f64,
}

impl RateService {
    pub fn new(repository: Arc<dyn ConsumptionRepository>, default_rate: f64) -> Self {
        Self {
            repository,
            default_rate,
        }
    }

    /// Seed the configured default when no rate has been stored yet
    pub async fn ensure_default(&self) -> Result<f64> {
        match self.repository.get_setting(RATE_SETTING_KEY).await? {
            Some(_) => self.get_rate().await,
            None => {
                self.set_rate(self.default_rate).await?;
                Ok(self.default_rate)
            }
        }
    }

    pub async fn get_rate(&self) -> Result<f64> {
        let stored = self.repository.get_setting(RATE_SETTING_KEY).await?;
        Ok(self.rate_from_setting(stored.as_deref()))
    }

    /// Interpret a stored setting value. Anything that is not a positive
    /// number falls back to the default.
    pub fn rate_from_setting(&self, stored: Option<&str>) -> f64 {
        let Some(value) = stored else {
            return self.default_rate;
        };

        match value.trim().parse::<f64>() {
            Ok(rate) if rate.is_finite() && rate > 0.0 => rate,
            _ => {
                tracing::warn!(
                    "Stored rate {:?} is not a positive number, using default {}",
                    value,
                    self.default_rate
                );
                self.default_rate
            }
        }
    }

    pub async fn set_rate(&self, rate: f64) -> Result<()> {
        if !rate.is_finite() || rate <= 0.0 {
            return Err(MultiplugError::validation("Rate must be a positive number"));
        }

        self.repository
            .put_setting(RATE_SETTING_KEY, &rate.to_string())
            .await?;
        tracing::info!("Electricity rate set to {} BDT/kWh", rate);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::memory_repository::InMemoryRepository;

    fn service() -> (RateService, Arc<InMemoryRepository>) {
        let repository = Arc::new(InMemoryRepository::new());
        (RateService::new(repository.clone(), DEFAULT_RATE), repository)
    }

    #[tokio::test]
    async fn test_get_rate_defaults_when_unset() {
        let (rates, _) = service();
        assert_eq!(rates.get_rate().await.unwrap(), DEFAULT_RATE);
    }

    #[tokio::test]
    async fn test_set_rate_upserts() {
        let (rates, repository) = service();
        rates.set_rate(9.5).await.unwrap();
        rates.set_rate(10.25).await.unwrap();

        assert_eq!(rates.get_rate().await.unwrap(), 10.25);
        assert_eq!(
            repository.get_setting(RATE_SETTING_KEY).await.unwrap(),
            Some("10.25".to_string())
        );
    }

    #[tokio::test]
    async fn test_set_rate_rejects_non_positive() {
        let (rates, _) = service();
        rates.set_rate(12.0).await.unwrap();

        for bad in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            let err = rates.set_rate(bad).await.unwrap_err();
            assert!(matches!(err, MultiplugError::Validation(_)));
        }
        assert_eq!(rates.get_rate().await.unwrap(), 12.0);
    }

    #[tokio::test]
    async fn test_ensure_default_keeps_existing_rate() {
        let (rates, repository) = service();
        assert_eq!(rates.ensure_default().await.unwrap(), DEFAULT_RATE);
        assert!(repository.get_setting(RATE_SETTING_KEY).await.unwrap().is_some());

        rates.set_rate(11.0).await.unwrap();
        assert_eq!(rates.ensure_default().await.unwrap(), 11.0);
    }

    #[tokio::test]
    async fn test_corrupt_rate_falls_back_to_default() {
        let (rates, repository) = service();
        repository.put_setting(RATE_SETTING_KEY, "cheap").await.unwrap();
        assert_eq!(rates.get_rate().await.unwrap(), DEFAULT_RATE);
    }

    #[tokio::test]
    async fn test_non_positive_stored_rate_falls_back_to_default() {
        let (rates, repository) = service();

        for stored in ["0", "-3", "inf"] {
            repository.put_setting(RATE_SETTING_KEY, stored).await.unwrap();
            assert_eq!(rates.get_rate().await.unwrap(), DEFAULT_RATE);
        }
        assert_eq!(rates.rate_from_setting(Some(" 9.5 ")), 9.5);
        assert_eq!(rates.rate_from_setting(None), DEFAULT_RATE);
    }
}
