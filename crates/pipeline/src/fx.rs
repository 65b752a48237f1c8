//! Foreign-exchange rate provider contract.

use async_trait::async_trait;
use chrono::DateTime;
use rust_decimal::Decimal;

use flipline_core::config_keys as keys;
use flipline_core::error::CoreError;
use flipline_core::types::Timestamp;

use crate::config::ConfigProvider;
use crate::error::PipelineError;

/// A current FX rate and when it was last refreshed.
#[derive(Debug, Clone)]
pub struct FxRate {
    pub rate: Decimal,
    pub updated_at: Option<Timestamp>,
}

/// Source of the current JPY-per-USD rate.
#[async_trait]
pub trait FxProvider: Send + Sync {
    async fn current_rate(&self) -> Result<FxRate, PipelineError>;
}

/// Production provider reading the rate the sync job writes into config.
///
/// A missing or unparsable rate is a validation error — pricing must
/// never run on a made-up rate.
pub struct ConfigFxProvider<'a> {
    config: &'a dyn ConfigProvider,
}

impl<'a> ConfigFxProvider<'a> {
    pub fn new(config: &'a dyn ConfigProvider) -> Self {
        Self { config }
    }
}

#[async_trait]
impl FxProvider for ConfigFxProvider<'_> {
    async fn current_rate(&self) -> Result<FxRate, PipelineError> {
        let raw = self
            .config
            .get(keys::FX_RATE)
            .await?
            .ok_or_else(|| CoreError::Validation("No FX rate available".into()))?;
        let rate = raw.parse::<Decimal>().map_err(|_| {
            CoreError::Validation(format!("Config '{}' is not a valid decimal: '{raw}'", keys::FX_RATE))
        })?;
        if rate <= Decimal::ZERO {
            return Err(CoreError::Validation(format!("FX rate must be positive, got {rate}")).into());
        }

        let updated_at = match self.config.get(keys::FX_RATE_UPDATED_AT).await? {
            Some(ts) => DateTime::parse_from_rfc3339(&ts)
                .ok()
                .map(|dt| dt.with_timezone(&chrono::Utc)),
            None => None,
        };

        Ok(FxRate { rate, updated_at })
    }
}
