//! Repository for the `pricing_results` and `pricing_rules` tables.

use sqlx::PgExecutor;

use flipline_core::types::DbId;

use crate::models::pricing::{CreatePricingRule, PricingResult, PricingRuleRow, UpsertPricingResult};

/// Column list for `pricing_results` SELECT queries.
const RESULT_COLUMNS: &str = "\
    id, candidate_id, fx_rate, buffered_fx_rate, sell_price_usd, sell_price_jpy, \
    total_cost, fee_amount, reserve_amount, profit_amount, profit_rate, \
    profit_ok, cash_ok, created_at";

/// Column list for `pricing_rules` SELECT queries.
const RULE_COLUMNS: &str = "\
    id, condition_type, min_value, max_value, target_field, override_value, \
    priority, created_at";

/// Provides pricing snapshot upserts and rule queries.
pub struct PricingRepo;

impl PricingRepo {
    /// Replace the candidate's pricing snapshot wholesale.
    ///
    /// One row per candidate; `created_at` is reset so the freshness
    /// check sees the recalculation time.
    pub async fn upsert_result<'e>(
        exec: impl PgExecutor<'e>,
        dto: &UpsertPricingResult,
    ) -> Result<PricingResult, sqlx::Error> {
        let query = format!(
            "INSERT INTO pricing_results \
                 (candidate_id, fx_rate, buffered_fx_rate, sell_price_usd, sell_price_jpy, \
                  total_cost, fee_amount, reserve_amount, profit_amount, profit_rate, \
                  profit_ok, cash_ok) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12) \
             ON CONFLICT (candidate_id) \
             DO UPDATE SET \
                fx_rate = EXCLUDED.fx_rate, \
                buffered_fx_rate = EXCLUDED.buffered_fx_rate, \
                sell_price_usd = EXCLUDED.sell_price_usd, \
                sell_price_jpy = EXCLUDED.sell_price_jpy, \
                total_cost = EXCLUDED.total_cost, \
                fee_amount = EXCLUDED.fee_amount, \
                reserve_amount = EXCLUDED.reserve_amount, \
                profit_amount = EXCLUDED.profit_amount, \
                profit_rate = EXCLUDED.profit_rate, \
                profit_ok = EXCLUDED.profit_ok, \
                cash_ok = EXCLUDED.cash_ok, \
                created_at = NOW() \
             RETURNING {RESULT_COLUMNS}"
        );
        sqlx::query_as::<_, PricingResult>(&query)
            .bind(dto.candidate_id)
            .bind(dto.fx_rate)
            .bind(dto.buffered_fx_rate)
            .bind(dto.sell_price_usd)
            .bind(dto.sell_price_jpy)
            .bind(dto.total_cost)
            .bind(dto.fee_amount)
            .bind(dto.reserve_amount)
            .bind(dto.profit_amount)
            .bind(dto.profit_rate)
            .bind(dto.profit_ok)
            .bind(dto.cash_ok)
            .fetch_one(exec)
            .await
    }

    /// Latest snapshot for a candidate, if any.
    pub async fn find_by_candidate<'e>(
        exec: impl PgExecutor<'e>,
        candidate_id: DbId,
    ) -> Result<Option<PricingResult>, sqlx::Error> {
        let query = format!("SELECT {RESULT_COLUMNS} FROM pricing_results WHERE candidate_id = $1");
        sqlx::query_as::<_, PricingResult>(&query)
            .bind(candidate_id)
            .fetch_optional(exec)
            .await
    }

    /// All override rules in evaluation order: priority DESC, id ASC.
    ///
    /// The id tie-break makes same-priority evaluation deterministic.
    pub async fn list_rules<'e>(
        exec: impl PgExecutor<'e>,
    ) -> Result<Vec<PricingRuleRow>, sqlx::Error> {
        let query =
            format!("SELECT {RULE_COLUMNS} FROM pricing_rules ORDER BY priority DESC, id ASC");
        sqlx::query_as::<_, PricingRuleRow>(&query)
            .fetch_all(exec)
            .await
    }

    /// Insert a new override rule.
    pub async fn create_rule<'e>(
        exec: impl PgExecutor<'e>,
        dto: &CreatePricingRule,
    ) -> Result<PricingRuleRow, sqlx::Error> {
        let query = format!(
            "INSERT INTO pricing_rules \
                 (condition_type, min_value, max_value, target_field, override_value, priority) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING {RULE_COLUMNS}"
        );
        sqlx::query_as::<_, PricingRuleRow>(&query)
            .bind(&dto.condition_type)
            .bind(dto.min_value)
            .bind(dto.max_value)
            .bind(&dto.target_field)
            .bind(dto.override_value)
            .bind(dto.priority)
            .fetch_one(exec)
            .await
    }
}
