//! Pricing result and pricing rule models.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use flipline_core::types::{DbId, Timestamp};

// ---------------------------------------------------------------------------
// Pricing result (latest snapshot per candidate)
// ---------------------------------------------------------------------------

/// Latest pricing snapshot for a candidate. One row per candidate,
/// replaced wholesale on every recalculation — never patched.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct PricingResult {
    pub id: DbId,
    pub candidate_id: DbId,
    pub fx_rate: Decimal,
    pub buffered_fx_rate: Decimal,
    pub sell_price_usd: Decimal,
    pub sell_price_jpy: Decimal,
    pub total_cost: Decimal,
    pub fee_amount: Decimal,
    pub reserve_amount: Decimal,
    pub profit_amount: Decimal,
    pub profit_rate: Decimal,
    pub profit_ok: bool,
    pub cash_ok: bool,
    pub created_at: Timestamp,
}

/// DTO for the per-candidate upsert.
#[derive(Debug, Clone, Deserialize)]
pub struct UpsertPricingResult {
    pub candidate_id: DbId,
    pub fx_rate: Decimal,
    pub buffered_fx_rate: Decimal,
    pub sell_price_usd: Decimal,
    pub sell_price_jpy: Decimal,
    pub total_cost: Decimal,
    pub fee_amount: Decimal,
    pub reserve_amount: Decimal,
    pub profit_amount: Decimal,
    pub profit_rate: Decimal,
    pub profit_ok: bool,
    pub cash_ok: bool,
}

// ---------------------------------------------------------------------------
// Pricing rules
// ---------------------------------------------------------------------------

/// A minimum-profit override rule row.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct PricingRuleRow {
    pub id: DbId,
    pub condition_type: String,
    pub min_value: Option<Decimal>,
    pub max_value: Option<Decimal>,
    pub target_field: String,
    pub override_value: Decimal,
    pub priority: i32,
    pub created_at: Timestamp,
}

/// DTO for inserting a new rule.
#[derive(Debug, Clone, Deserialize)]
pub struct CreatePricingRule {
    pub condition_type: String,
    pub min_value: Option<Decimal>,
    pub max_value: Option<Decimal>,
    pub target_field: String,
    pub override_value: Decimal,
    pub priority: i32,
}
