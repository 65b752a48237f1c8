//! Catalog of dynamic configuration keys and their fallback defaults.
//!
//! Tunables live in the `app_config` table and are resolved through the
//! orchestration layer's `ConfigProvider` once per operation. Every key
//! has an explicit default here so a missing row never aborts a
//! computation.

/// Global kill switch. `"true"` halts all mutating operations.
pub const SYSTEM_PAUSED: &str = "system.paused";

// ---------------------------------------------------------------------------
// Pricing
// ---------------------------------------------------------------------------

/// Safety buffer applied on top of the raw FX rate.
pub const FX_BUFFER_RATE: &str = "fx.buffer_rate";
/// Current home-per-foreign FX rate (written by the rate sync).
pub const FX_RATE: &str = "fx.rate";
/// When the FX rate was last refreshed (RFC 3339).
pub const FX_RATE_UPDATED_AT: &str = "fx.rate_updated_at";

/// Domestic inbound shipping, JPY.
pub const SHIP_DOMESTIC: &str = "ship.domestic";
/// Packing and miscellaneous materials, JPY.
pub const SHIP_PACKING: &str = "ship.packing";
/// Handling fee on sourcing, JPY.
pub const FEE_HANDLING_INBOUND: &str = "fee.handling_inbound";
/// Handling fee on fulfillment, JPY.
pub const FEE_HANDLING_OUTBOUND: &str = "fee.handling_outbound";
/// Marketplace final-value fee rate.
pub const FEE_MARKETPLACE_RATE: &str = "fee.marketplace_rate";
/// Refund reserve rate withheld from revenue.
pub const FEE_REFUND_RESERVE_RATE: &str = "fee.refund_reserve_rate";
/// Minimum absolute profit per item, JPY.
pub const PROFIT_MIN_AMOUNT: &str = "profit.min_amount";
/// Minimum profit rate relative to total cost.
pub const PROFIT_MIN_RATE: &str = "profit.min_rate";
/// Weight assumed when a candidate has none recorded, kg.
pub const DEFAULT_WEIGHT_KG: &str = "default.weight_kg";
/// Size tier assumed when a candidate has none recorded.
pub const DEFAULT_SIZE_TIER: &str = "default.size_tier";

// ---------------------------------------------------------------------------
// Cash gate
// ---------------------------------------------------------------------------

pub const CASH_CURRENT: &str = "cash.current";
pub const CASH_CREDIT_LIMIT: &str = "cash.credit_limit";
pub const CASH_CREDIT_USED: &str = "cash.credit_used";
pub const CASH_UNCONFIRMED_COST: &str = "cash.unconfirmed_cost";
pub const CASH_FIXED_RESERVE: &str = "cash.fixed_reserve";
pub const CASH_TRAILING_SALES_30D: &str = "cash.trailing_sales_30d";
pub const CASH_REFUND_RESERVE_RATIO: &str = "cash.refund_reserve_ratio";
pub const CASH_WORKING_CAPITAL_CAP_RATIO: &str = "cash.working_capital_cap_ratio";
pub const CASH_SAFETY_BUFFER: &str = "cash.safety_buffer";

// ---------------------------------------------------------------------------
// Tracking reconciliation
// ---------------------------------------------------------------------------

pub const TRACKING_MAX_ATTEMPTS: &str = "tracking.max_attempts";
pub const TRACKING_MAX_AGE_HOURS: &str = "tracking.max_age_hours";
pub const TRACKING_RETRY_INTERVAL_MINS: &str = "tracking.retry_interval_mins";
pub const TRACKING_BATCH_SIZE: &str = "tracking.batch_size";

/// Max candidates published per batch pass.
pub const PUBLISH_BATCH_SIZE: &str = "publish.batch_size";

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

/// Fallback values used when a key has no row in `app_config`.
pub mod defaults {
    pub const SYSTEM_PAUSED: &str = "false";

    pub const FX_BUFFER_RATE: &str = "0.03";
    pub const SHIP_DOMESTIC: &str = "800";
    pub const SHIP_PACKING: &str = "300";
    pub const FEE_HANDLING_INBOUND: &str = "200";
    pub const FEE_HANDLING_OUTBOUND: &str = "500";
    pub const FEE_MARKETPLACE_RATE: &str = "0.15";
    pub const FEE_REFUND_RESERVE_RATE: &str = "0.05";
    pub const PROFIT_MIN_AMOUNT: &str = "2000";
    pub const PROFIT_MIN_RATE: &str = "0.20";
    pub const DEFAULT_WEIGHT_KG: &str = "1.0";
    pub const DEFAULT_SIZE_TIER: &str = "M";

    pub const CASH_CURRENT: &str = "0";
    pub const CASH_CREDIT_LIMIT: &str = "0";
    pub const CASH_CREDIT_USED: &str = "0";
    pub const CASH_UNCONFIRMED_COST: &str = "0";
    pub const CASH_FIXED_RESERVE: &str = "0";
    pub const CASH_TRAILING_SALES_30D: &str = "0";
    pub const CASH_REFUND_RESERVE_RATIO: &str = "0.08";
    pub const CASH_WORKING_CAPITAL_CAP_RATIO: &str = "0.5";
    pub const CASH_SAFETY_BUFFER: &str = "50000";

    pub const TRACKING_MAX_ATTEMPTS: &str = "5";
    pub const TRACKING_MAX_AGE_HOURS: &str = "72";
    pub const TRACKING_RETRY_INTERVAL_MINS: &str = "30";
    pub const TRACKING_BATCH_SIZE: &str = "20";

    pub const PUBLISH_BATCH_SIZE: &str = "10";
}
