//! Configuration provider contract and typed resolution.
//!
//! Tunables are dynamic key/value state behind an injected provider —
//! no global mutable singletons. Each operation resolves the keys it
//! needs once, with explicit per-key fallback defaults, into a typed
//! snapshot that the pure core consumes.

use async_trait::async_trait;
use chrono::Duration;
use rust_decimal::Decimal;
use sqlx::PgPool;

use flipline_core::cash_gate::CashSnapshot;
use flipline_core::config_keys as keys;
use flipline_core::error::CoreError;
use flipline_core::pricing::PricingConfig;
use flipline_core::retry::RetryPolicy;
use flipline_core::shipping::SizeTier;
use flipline_db::repositories::ConfigRepo;

use crate::error::PipelineError;

// ---------------------------------------------------------------------------
// Provider contract
// ---------------------------------------------------------------------------

/// Key/value configuration lookup.
#[async_trait]
pub trait ConfigProvider: Send + Sync {
    /// Fetch one value; `None` when the key is absent.
    async fn get(&self, key: &str) -> Result<Option<String>, PipelineError>;

    /// Store one value.
    async fn set(&self, key: &str, value: &str) -> Result<(), PipelineError>;
}

/// Production provider backed by the `app_config` table.
pub struct DbConfigProvider {
    pool: PgPool,
}

impl DbConfigProvider {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ConfigProvider for DbConfigProvider {
    async fn get(&self, key: &str) -> Result<Option<String>, PipelineError> {
        Ok(ConfigRepo::get(&self.pool, key).await?)
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), PipelineError> {
        ConfigRepo::set(&self.pool, key, value).await?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Typed resolution
// ---------------------------------------------------------------------------

async fn get_or(
    provider: &dyn ConfigProvider,
    key: &str,
    default: &str,
) -> Result<String, PipelineError> {
    Ok(provider.get(key).await?.unwrap_or_else(|| default.to_string()))
}

async fn decimal(
    provider: &dyn ConfigProvider,
    key: &str,
    default: &str,
) -> Result<Decimal, PipelineError> {
    let raw = get_or(provider, key, default).await?;
    raw.parse::<Decimal>().map_err(|_| {
        CoreError::Validation(format!("Config '{key}' is not a valid decimal: '{raw}'")).into()
    })
}

async fn integer(
    provider: &dyn ConfigProvider,
    key: &str,
    default: &str,
) -> Result<i64, PipelineError> {
    let raw = get_or(provider, key, default).await?;
    raw.parse::<i64>().map_err(|_| {
        CoreError::Validation(format!("Config '{key}' is not a valid integer: '{raw}'")).into()
    })
}

/// Refuse to proceed while the kill switch is set.
pub async fn ensure_not_paused(provider: &dyn ConfigProvider) -> Result<(), PipelineError> {
    let raw = get_or(provider, keys::SYSTEM_PAUSED, keys::defaults::SYSTEM_PAUSED).await?;
    if raw.trim().eq_ignore_ascii_case("true") {
        return Err(CoreError::Paused("mutating operations are disabled".into()).into());
    }
    Ok(())
}

/// Resolve the pricing configuration with per-key defaults.
pub async fn pricing_config(provider: &dyn ConfigProvider) -> Result<PricingConfig, PipelineError> {
    let tier_raw = get_or(provider, keys::DEFAULT_SIZE_TIER, keys::defaults::DEFAULT_SIZE_TIER).await?;
    Ok(PricingConfig {
        fx_buffer_rate: decimal(provider, keys::FX_BUFFER_RATE, keys::defaults::FX_BUFFER_RATE).await?,
        domestic_ship: decimal(provider, keys::SHIP_DOMESTIC, keys::defaults::SHIP_DOMESTIC).await?,
        packing: decimal(provider, keys::SHIP_PACKING, keys::defaults::SHIP_PACKING).await?,
        handling_inbound: decimal(
            provider,
            keys::FEE_HANDLING_INBOUND,
            keys::defaults::FEE_HANDLING_INBOUND,
        )
        .await?,
        handling_outbound: decimal(
            provider,
            keys::FEE_HANDLING_OUTBOUND,
            keys::defaults::FEE_HANDLING_OUTBOUND,
        )
        .await?,
        marketplace_fee_rate: decimal(
            provider,
            keys::FEE_MARKETPLACE_RATE,
            keys::defaults::FEE_MARKETPLACE_RATE,
        )
        .await?,
        refund_reserve_rate: decimal(
            provider,
            keys::FEE_REFUND_RESERVE_RATE,
            keys::defaults::FEE_REFUND_RESERVE_RATE,
        )
        .await?,
        min_profit_amount: decimal(provider, keys::PROFIT_MIN_AMOUNT, keys::defaults::PROFIT_MIN_AMOUNT)
            .await?,
        min_profit_rate: decimal(provider, keys::PROFIT_MIN_RATE, keys::defaults::PROFIT_MIN_RATE)
            .await?,
        default_weight_kg: decimal(provider, keys::DEFAULT_WEIGHT_KG, keys::defaults::DEFAULT_WEIGHT_KG)
            .await?,
        default_size_tier: SizeTier::parse(&tier_raw).map_err(PipelineError::from)?,
    })
}

/// Resolve the cash-gate snapshot with per-key defaults.
pub async fn cash_snapshot(provider: &dyn ConfigProvider) -> Result<CashSnapshot, PipelineError> {
    Ok(CashSnapshot {
        cash: decimal(provider, keys::CASH_CURRENT, keys::defaults::CASH_CURRENT).await?,
        credit_limit: decimal(provider, keys::CASH_CREDIT_LIMIT, keys::defaults::CASH_CREDIT_LIMIT)
            .await?,
        credit_used: decimal(provider, keys::CASH_CREDIT_USED, keys::defaults::CASH_CREDIT_USED)
            .await?,
        unconfirmed_cost: decimal(
            provider,
            keys::CASH_UNCONFIRMED_COST,
            keys::defaults::CASH_UNCONFIRMED_COST,
        )
        .await?,
        fixed_reserve: decimal(provider, keys::CASH_FIXED_RESERVE, keys::defaults::CASH_FIXED_RESERVE)
            .await?,
        trailing_sales_30d: decimal(
            provider,
            keys::CASH_TRAILING_SALES_30D,
            keys::defaults::CASH_TRAILING_SALES_30D,
        )
        .await?,
        refund_reserve_ratio: decimal(
            provider,
            keys::CASH_REFUND_RESERVE_RATIO,
            keys::defaults::CASH_REFUND_RESERVE_RATIO,
        )
        .await?,
        working_capital_cap_ratio: decimal(
            provider,
            keys::CASH_WORKING_CAPITAL_CAP_RATIO,
            keys::defaults::CASH_WORKING_CAPITAL_CAP_RATIO,
        )
        .await?,
        safety_buffer: decimal(provider, keys::CASH_SAFETY_BUFFER, keys::defaults::CASH_SAFETY_BUFFER)
            .await?,
    })
}

/// Resolve the tracking retry policy.
pub async fn retry_policy(provider: &dyn ConfigProvider) -> Result<RetryPolicy, PipelineError> {
    let max_attempts = integer(
        provider,
        keys::TRACKING_MAX_ATTEMPTS,
        keys::defaults::TRACKING_MAX_ATTEMPTS,
    )
    .await?;
    let max_age_hours = integer(
        provider,
        keys::TRACKING_MAX_AGE_HOURS,
        keys::defaults::TRACKING_MAX_AGE_HOURS,
    )
    .await?;
    let interval_mins = integer(
        provider,
        keys::TRACKING_RETRY_INTERVAL_MINS,
        keys::defaults::TRACKING_RETRY_INTERVAL_MINS,
    )
    .await?;
    Ok(RetryPolicy {
        max_attempts: max_attempts as i32,
        max_age: Duration::hours(max_age_hours),
        retry_interval: Duration::minutes(interval_mins),
    })
}

/// Batch size for the tracking reconciliation pass.
pub async fn tracking_batch_size(provider: &dyn ConfigProvider) -> Result<i64, PipelineError> {
    integer(provider, keys::TRACKING_BATCH_SIZE, keys::defaults::TRACKING_BATCH_SIZE).await
}

/// Batch size for the publish pass.
pub async fn publish_batch_size(provider: &dyn ConfigProvider) -> Result<i64, PipelineError> {
    integer(provider, keys::PUBLISH_BATCH_SIZE, keys::defaults::PUBLISH_BATCH_SIZE).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// In-memory provider for unit tests.
    pub(crate) struct MemoryConfig {
        values: Mutex<HashMap<String, String>>,
    }

    impl MemoryConfig {
        pub(crate) fn new(pairs: &[(&str, &str)]) -> Self {
            Self {
                values: Mutex::new(
                    pairs
                        .iter()
                        .map(|(k, v)| (k.to_string(), v.to_string()))
                        .collect(),
                ),
            }
        }
    }

    #[async_trait]
    impl ConfigProvider for MemoryConfig {
        async fn get(&self, key: &str) -> Result<Option<String>, PipelineError> {
            Ok(self.values.lock().unwrap().get(key).cloned())
        }

        async fn set(&self, key: &str, value: &str) -> Result<(), PipelineError> {
            self.values
                .lock()
                .unwrap()
                .insert(key.to_string(), value.to_string());
            Ok(())
        }
    }

    #[tokio::test]
    async fn missing_keys_fall_back_to_defaults() {
        let provider = MemoryConfig::new(&[]);
        let cfg = pricing_config(&provider).await.unwrap();
        assert_eq!(cfg.marketplace_fee_rate.to_string(), "0.15");
        assert_eq!(cfg.default_size_tier, SizeTier::M);
    }

    #[tokio::test]
    async fn stored_values_override_defaults() {
        let provider = MemoryConfig::new(&[("fee.marketplace_rate", "0.12")]);
        let cfg = pricing_config(&provider).await.unwrap();
        assert_eq!(cfg.marketplace_fee_rate.to_string(), "0.12");
    }

    #[tokio::test]
    async fn garbage_value_is_a_validation_error() {
        use assert_matches::assert_matches;

        let provider = MemoryConfig::new(&[("profit.min_amount", "lots")]);
        let err = pricing_config(&provider).await.unwrap_err();
        assert_matches!(&err, PipelineError::Core(CoreError::Validation(_)));
        assert!(err.to_string().contains("profit.min_amount"));
    }

    #[tokio::test]
    async fn pause_flag_blocks() {
        let provider = MemoryConfig::new(&[("system.paused", "true")]);
        let err = ensure_not_paused(&provider).await.unwrap_err();
        assert!(err.is_paused());
    }

    #[tokio::test]
    async fn unpaused_by_default() {
        let provider = MemoryConfig::new(&[]);
        assert!(ensure_not_paused(&provider).await.is_ok());
    }

    #[tokio::test]
    async fn retry_policy_resolves() {
        let provider = MemoryConfig::new(&[("tracking.max_attempts", "3")]);
        let policy = retry_policy(&provider).await.unwrap();
        assert_eq!(policy.max_attempts, 3);
        assert_eq!(policy.max_age, Duration::hours(72));
    }
}
