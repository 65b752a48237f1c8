//! Pricing calculator: cost/profit breakdown and the profitability gate.
//!
//! Combines the configured fee structure, the shipping cost table, and
//! the rule engine into a full breakdown for one candidate. Source-side
//! amounts are JPY, the sell side is USD; all arithmetic is fixed-point
//! `Decimal` with half-up rounding for money and a ceiling on the final
//! recommended price. A failed gate is a result value, not an error;
//! errors are reserved for inputs that make the computation impossible.

use rust_decimal::Decimal;
use serde::Serialize;

use crate::error::CoreError;
use crate::money::{ceil_2dp, round_half_up_2dp};
use crate::rules::{apply_rules, PricingRule, ProfitThresholds};
use crate::shipping::{shipping_cost, SizeTier};

// ---------------------------------------------------------------------------
// Inputs
// ---------------------------------------------------------------------------

/// Resolved configuration values for one pricing run.
///
/// The orchestration layer builds this from the config provider with
/// per-key fallback defaults; the calculator itself never reads config.
#[derive(Debug, Clone)]
pub struct PricingConfig {
    pub fx_buffer_rate: Decimal,
    pub domestic_ship: Decimal,
    pub packing: Decimal,
    pub handling_inbound: Decimal,
    pub handling_outbound: Decimal,
    pub marketplace_fee_rate: Decimal,
    pub refund_reserve_rate: Decimal,
    pub min_profit_amount: Decimal,
    pub min_profit_rate: Decimal,
    pub default_weight_kg: Decimal,
    pub default_size_tier: SizeTier,
}

/// Per-candidate inputs for one pricing run.
#[derive(Debug, Clone)]
pub struct PricingInput {
    /// Acquisition price, JPY. Must be positive.
    pub source_price: Decimal,
    /// Item weight; falls back to the configured default.
    pub weight_kg: Option<Decimal>,
    /// Package tier; falls back to the configured default.
    pub size_tier: Option<SizeTier>,
    /// Raw JPY-per-USD rate. Must be positive.
    pub fx_rate: Decimal,
    /// Caller-chosen sell price; when absent the recommendation is used.
    pub target_sell_usd: Option<Decimal>,
}

// ---------------------------------------------------------------------------
// Breakdown
// ---------------------------------------------------------------------------

/// Full cost/profit breakdown for one candidate.
///
/// Invariant: `profit_amount = sell_price_jpy - total_cost - fee_amount
/// - reserve_amount`, exactly, in the rounded figures below.
#[derive(Debug, Clone, Serialize)]
pub struct PricingBreakdown {
    pub fx_rate: Decimal,
    pub buffered_fx_rate: Decimal,
    pub size_tier: SizeTier,
    pub weight_kg: Decimal,
    pub shipping_cost: Decimal,
    pub total_cost: Decimal,
    /// Thresholds after rule application.
    pub min_profit_amount: Decimal,
    pub min_profit_rate: Decimal,
    pub required_profit: Decimal,
    pub recommended_sell_usd: Decimal,
    /// Effective sell price: the caller's target, or the recommendation.
    pub sell_price_usd: Decimal,
    /// Revenue in JPY at the buffered rate.
    pub sell_price_jpy: Decimal,
    pub fee_amount: Decimal,
    pub reserve_amount: Decimal,
    pub profit_amount: Decimal,
    /// Profit relative to total cost, 4 decimal places. Zero when total
    /// cost is not positive (fail closed).
    pub profit_rate: Decimal,
    pub profit_ok: bool,
    /// Set when the caller supplied a target below the recommendation.
    pub below_recommendation: bool,
}

// ---------------------------------------------------------------------------
// Computation
// ---------------------------------------------------------------------------

/// Compute the full breakdown for one candidate.
///
/// `rules` must be sorted priority DESC, id ASC (see [`apply_rules`]).
pub fn compute(
    input: &PricingInput,
    cfg: &PricingConfig,
    rules: &[PricingRule],
) -> Result<PricingBreakdown, CoreError> {
    if input.source_price <= Decimal::ZERO {
        return Err(CoreError::Validation(format!(
            "source_price must be positive, got {}",
            input.source_price
        )));
    }
    if input.fx_rate <= Decimal::ZERO {
        return Err(CoreError::Validation(format!(
            "fx_rate must be positive, got {}",
            input.fx_rate
        )));
    }
    if let Some(target) = input.target_sell_usd {
        if target <= Decimal::ZERO {
            return Err(CoreError::Validation(format!(
                "target_sell_usd must be positive, got {target}"
            )));
        }
    }

    let deduction_rate = cfg.marketplace_fee_rate + cfg.refund_reserve_rate;
    if deduction_rate >= Decimal::ONE {
        return Err(CoreError::Validation(format!(
            "marketplace fee rate + refund reserve rate must be < 1, got {deduction_rate}"
        )));
    }

    let weight_kg = input.weight_kg.unwrap_or(cfg.default_weight_kg);
    let size_tier = input.size_tier.unwrap_or(cfg.default_size_tier);

    let thresholds = apply_rules(
        ProfitThresholds {
            min_amount: cfg.min_profit_amount,
            min_rate: cfg.min_profit_rate,
        },
        rules,
        input.source_price,
        weight_kg,
    );

    let buffered_fx = input.fx_rate * (Decimal::ONE + cfg.fx_buffer_rate);
    let shipping = shipping_cost(size_tier, weight_kg)?;

    let total_cost = round_half_up_2dp(
        input.source_price
            + cfg.domestic_ship
            + cfg.packing
            + cfg.handling_inbound
            + cfg.handling_outbound
            + shipping,
    );

    // Required profit: the larger of the absolute floor and the rate floor.
    let rate_floor = total_cost * thresholds.min_rate;
    let required_profit = thresholds.min_amount.max(rate_floor);

    // Minimal USD price whose post-fee revenue covers cost + required profit.
    let recommended_sell_usd =
        ceil_2dp((total_cost + required_profit) / ((Decimal::ONE - deduction_rate) * buffered_fx));

    let sell_price_usd = input.target_sell_usd.unwrap_or(recommended_sell_usd);
    let below_recommendation = sell_price_usd < recommended_sell_usd;

    let sell_price_jpy = round_half_up_2dp(sell_price_usd * buffered_fx);
    let fee_amount = round_half_up_2dp(sell_price_jpy * cfg.marketplace_fee_rate);
    let reserve_amount = round_half_up_2dp(sell_price_jpy * cfg.refund_reserve_rate);
    let profit_amount = sell_price_jpy - total_cost - fee_amount - reserve_amount;

    // Gate: both floors checked independently; the rate floor compares
    // cross-multiplied so no division happens. Non-positive total cost
    // fails closed.
    let profit_ok = total_cost > Decimal::ZERO
        && profit_amount >= thresholds.min_amount
        && profit_amount >= total_cost * thresholds.min_rate;

    let profit_rate = if total_cost > Decimal::ZERO {
        (profit_amount / total_cost)
            .round_dp_with_strategy(4, rust_decimal::RoundingStrategy::MidpointAwayFromZero)
    } else {
        Decimal::ZERO
    };

    Ok(PricingBreakdown {
        fx_rate: input.fx_rate,
        buffered_fx_rate: buffered_fx,
        size_tier,
        weight_kg,
        shipping_cost: shipping,
        total_cost,
        min_profit_amount: thresholds.min_amount,
        min_profit_rate: thresholds.min_rate,
        required_profit,
        recommended_sell_usd,
        sell_price_usd,
        sell_price_jpy,
        fee_amount,
        reserve_amount,
        profit_amount,
        profit_rate,
        profit_ok,
        below_recommendation,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn default_config() -> PricingConfig {
        PricingConfig {
            fx_buffer_rate: dec!(0.03),
            domestic_ship: dec!(800),
            packing: dec!(300),
            handling_inbound: dec!(200),
            handling_outbound: dec!(500),
            marketplace_fee_rate: dec!(0.15),
            refund_reserve_rate: dec!(0.05),
            min_profit_amount: dec!(2000),
            min_profit_rate: dec!(0.20),
            default_weight_kg: dec!(1.0),
            default_size_tier: SizeTier::M,
        }
    }

    fn xl_input() -> PricingInput {
        PricingInput {
            source_price: dec!(10000),
            weight_kg: Some(dec!(1.5)),
            size_tier: Some(SizeTier::Xl),
            fx_rate: dec!(145),
            target_sell_usd: None,
        }
    }

    // -- worked example: XL item priced at the recommendation --

    #[test]
    fn xl_breakdown_costs() {
        let b = compute(&xl_input(), &default_config(), &[]).unwrap();
        assert_eq!(b.buffered_fx_rate, dec!(149.35));
        assert_eq!(b.shipping_cost, dec!(6500.0));
        assert_eq!(b.total_cost, dec!(18300.00));
        assert_eq!(b.required_profit, dec!(3660.0000));
    }

    #[test]
    fn xl_recommendation_and_gate() {
        let b = compute(&xl_input(), &default_config(), &[]).unwrap();
        assert_eq!(b.recommended_sell_usd, dec!(183.80));
        assert_eq!(b.sell_price_usd, dec!(183.80));
        assert_eq!(b.sell_price_jpy, dec!(27450.53));
        assert_eq!(b.fee_amount, dec!(4117.58));
        assert_eq!(b.reserve_amount, dec!(1372.53));
        assert_eq!(b.profit_amount, dec!(3660.42));
        assert!(b.profit_ok);
        assert!(!b.below_recommendation);
    }

    #[test]
    fn profit_identity_holds_exactly() {
        let b = compute(&xl_input(), &default_config(), &[]).unwrap();
        assert_eq!(
            b.profit_amount,
            b.sell_price_jpy - b.total_cost - b.fee_amount - b.reserve_amount
        );
    }

    // -- worked example: target below the recommendation --

    #[test]
    fn target_below_recommendation_warns_and_fails_gate() {
        let mut input = xl_input();
        input.target_sell_usd = Some(dec!(150.00));
        let b = compute(&input, &default_config(), &[]).unwrap();
        assert!(b.below_recommendation);
        assert!(!b.profit_ok);
        assert_eq!(b.sell_price_jpy, dec!(22402.50));
        assert_eq!(b.profit_amount, dec!(-378.01));
    }

    #[test]
    fn target_above_recommendation_passes_without_warning() {
        let mut input = xl_input();
        input.target_sell_usd = Some(dec!(200.00));
        let b = compute(&input, &default_config(), &[]).unwrap();
        assert!(!b.below_recommendation);
        assert!(b.profit_ok);
    }

    // -- gate monotonicity: raising the sell price never flips pass -> fail --

    #[test]
    fn gate_is_monotonic_in_sell_price() {
        let cfg = default_config();
        let mut passed = false;
        let mut cents = dec!(150.00);
        while cents <= dec!(220.00) {
            let input = PricingInput {
                target_sell_usd: Some(cents),
                ..xl_input()
            };
            let b = compute(&input, &cfg, &[]).unwrap();
            if passed {
                assert!(b.profit_ok, "gate flipped back to failing at {cents}");
            }
            passed = passed || b.profit_ok;
            cents += dec!(0.01);
        }
        assert!(passed);
    }

    // -- defaults --

    #[test]
    fn missing_weight_and_tier_use_config_defaults() {
        let input = PricingInput {
            weight_kg: None,
            size_tier: None,
            ..xl_input()
        };
        let b = compute(&input, &default_config(), &[]).unwrap();
        assert_eq!(b.weight_kg, dec!(1.0));
        assert_eq!(b.size_tier, SizeTier::M);
        // M tier @ 1.0kg = 1800 + 1000 = 2800
        assert_eq!(b.shipping_cost, dec!(2800.0));
    }

    // -- rule overrides feed the gate --

    #[test]
    fn rule_override_changes_required_profit() {
        use crate::rules::{RuleCondition, RuleTarget};
        let rules = vec![PricingRule {
            id: 1,
            condition: RuleCondition::SourcePrice,
            min_value: Some(dec!(5000)),
            max_value: None,
            target: RuleTarget::MinProfitRate,
            override_value: dec!(0.30),
            priority: 10,
        }];
        let b = compute(&xl_input(), &default_config(), &rules).unwrap();
        assert_eq!(b.min_profit_rate, dec!(0.30));
        // 18300 * 0.30 = 5490 > 2000
        assert_eq!(b.required_profit, dec!(5490.0000));
    }

    // -- validation --

    #[test]
    fn non_positive_source_price_rejected() {
        let mut input = xl_input();
        input.source_price = dec!(0);
        assert!(compute(&input, &default_config(), &[]).is_err());
        input.source_price = dec!(-100);
        assert!(compute(&input, &default_config(), &[]).is_err());
    }

    #[test]
    fn non_positive_fx_rate_rejected() {
        let mut input = xl_input();
        input.fx_rate = dec!(0);
        assert!(compute(&input, &default_config(), &[]).is_err());
    }

    #[test]
    fn non_positive_target_rejected() {
        let mut input = xl_input();
        input.target_sell_usd = Some(dec!(0));
        assert!(compute(&input, &default_config(), &[]).is_err());
    }

    #[test]
    fn deduction_rate_at_or_above_one_rejected() {
        let mut cfg = default_config();
        cfg.marketplace_fee_rate = dec!(0.95);
        cfg.refund_reserve_rate = dec!(0.05);
        assert!(compute(&xl_input(), &cfg, &[]).is_err());
    }

    #[test]
    fn profit_rate_is_profit_over_cost() {
        let b = compute(&xl_input(), &default_config(), &[]).unwrap();
        // 3660.42 / 18300.00 = 0.20002...
        assert_eq!(b.profit_rate, dec!(0.2000));
    }
}
