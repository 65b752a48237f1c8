//! Pricing rule engine: banded overrides of the minimum-profit thresholds.
//!
//! Rules match a candidate on a source-price or weight band and overwrite
//! either the minimum absolute profit or the minimum profit rate. Rules
//! are evaluated strictly in descending priority (ties broken by id
//! ascending), every matching rule applies, and the last assignment wins
//! per field.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::DbId;

// ---------------------------------------------------------------------------
// Rule definition
// ---------------------------------------------------------------------------

/// What a rule matches against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleCondition {
    SourcePrice,
    Weight,
}

impl RuleCondition {
    pub fn as_str(&self) -> &'static str {
        match self {
            RuleCondition::SourcePrice => "source_price",
            RuleCondition::Weight => "weight",
        }
    }

    pub fn parse(s: &str) -> Result<Self, CoreError> {
        match s {
            "source_price" => Ok(RuleCondition::SourcePrice),
            "weight" => Ok(RuleCondition::Weight),
            other => Err(CoreError::Validation(format!(
                "Unknown rule condition: '{other}'. Valid conditions: source_price, weight"
            ))),
        }
    }
}

/// Which minimum-profit field a rule overrides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleTarget {
    MinProfitAmount,
    MinProfitRate,
}

impl RuleTarget {
    pub fn as_str(&self) -> &'static str {
        match self {
            RuleTarget::MinProfitAmount => "min_profit_amount",
            RuleTarget::MinProfitRate => "min_profit_rate",
        }
    }

    pub fn parse(s: &str) -> Result<Self, CoreError> {
        match s {
            "min_profit_amount" => Ok(RuleTarget::MinProfitAmount),
            "min_profit_rate" => Ok(RuleTarget::MinProfitRate),
            other => Err(CoreError::Validation(format!(
                "Unknown rule target: '{other}'. Valid targets: min_profit_amount, min_profit_rate"
            ))),
        }
    }
}

/// A single override rule. `min_value` is inclusive, `max_value`
/// exclusive; either bound may be open.
#[derive(Debug, Clone)]
pub struct PricingRule {
    pub id: DbId,
    pub condition: RuleCondition,
    pub min_value: Option<Decimal>,
    pub max_value: Option<Decimal>,
    pub target: RuleTarget,
    pub override_value: Decimal,
    pub priority: i32,
}

impl PricingRule {
    /// Whether this rule's band contains the given value.
    pub fn matches(&self, value: Decimal) -> bool {
        if let Some(min) = self.min_value {
            if value < min {
                return false;
            }
        }
        if let Some(max) = self.max_value {
            if value >= max {
                return false;
            }
        }
        true
    }
}

// ---------------------------------------------------------------------------
// Evaluation
// ---------------------------------------------------------------------------

/// Minimum-profit thresholds after rule application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProfitThresholds {
    pub min_amount: Decimal,
    pub min_rate: Decimal,
}

/// Apply override rules to the configured base thresholds.
///
/// `rules` must already be sorted priority DESC, id ASC (the repository
/// query guarantees this). Every matching rule is applied in that order,
/// so within a target field the last applied rule — the lowest-priority
/// match — wins.
pub fn apply_rules(
    base: ProfitThresholds,
    rules: &[PricingRule],
    source_price: Decimal,
    weight_kg: Decimal,
) -> ProfitThresholds {
    let mut out = base;
    for rule in rules {
        let value = match rule.condition {
            RuleCondition::SourcePrice => source_price,
            RuleCondition::Weight => weight_kg,
        };
        if !rule.matches(value) {
            continue;
        }
        match rule.target {
            RuleTarget::MinProfitAmount => out.min_amount = rule.override_value,
            RuleTarget::MinProfitRate => out.min_rate = rule.override_value,
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn rule(
        id: DbId,
        condition: RuleCondition,
        min: Option<Decimal>,
        max: Option<Decimal>,
        target: RuleTarget,
        value: Decimal,
        priority: i32,
    ) -> PricingRule {
        PricingRule {
            id,
            condition,
            min_value: min,
            max_value: max,
            target,
            override_value: value,
            priority,
        }
    }

    fn base() -> ProfitThresholds {
        ProfitThresholds {
            min_amount: dec!(2000),
            min_rate: dec!(0.20),
        }
    }

    // -- band matching --

    #[test]
    fn inclusive_min_exclusive_max() {
        let r = rule(
            1,
            RuleCondition::SourcePrice,
            Some(dec!(1000)),
            Some(dec!(5000)),
            RuleTarget::MinProfitAmount,
            dec!(1500),
            0,
        );
        assert!(r.matches(dec!(1000)));
        assert!(r.matches(dec!(4999.99)));
        assert!(!r.matches(dec!(5000)));
        assert!(!r.matches(dec!(999.99)));
    }

    #[test]
    fn open_bounds_match_everything_on_that_side() {
        let r = rule(
            1,
            RuleCondition::Weight,
            None,
            Some(dec!(2)),
            RuleTarget::MinProfitRate,
            dec!(0.15),
            0,
        );
        assert!(r.matches(dec!(0)));
        assert!(!r.matches(dec!(2)));

        let r = rule(
            2,
            RuleCondition::Weight,
            Some(dec!(5)),
            None,
            RuleTarget::MinProfitRate,
            dec!(0.30),
            0,
        );
        assert!(r.matches(dec!(100)));
        assert!(!r.matches(dec!(4.9)));
    }

    // -- application order --

    #[test]
    fn no_matching_rules_keeps_base() {
        let rules = vec![rule(
            1,
            RuleCondition::SourcePrice,
            Some(dec!(50000)),
            None,
            RuleTarget::MinProfitAmount,
            dec!(9000),
            10,
        )];
        let out = apply_rules(base(), &rules, dec!(10000), dec!(1));
        assert_eq!(out, base());
    }

    #[test]
    fn single_match_overrides_one_field() {
        let rules = vec![rule(
            1,
            RuleCondition::Weight,
            Some(dec!(3)),
            None,
            RuleTarget::MinProfitRate,
            dec!(0.30),
            0,
        )];
        let out = apply_rules(base(), &rules, dec!(10000), dec!(4));
        assert_eq!(out.min_rate, dec!(0.30));
        assert_eq!(out.min_amount, dec!(2000));
    }

    #[test]
    fn last_applied_wins_within_a_field() {
        // Sorted priority DESC: the priority-10 rule applies first, then
        // the priority-1 rule overwrites it.
        let rules = vec![
            rule(
                1,
                RuleCondition::SourcePrice,
                None,
                None,
                RuleTarget::MinProfitAmount,
                dec!(5000),
                10,
            ),
            rule(
                2,
                RuleCondition::SourcePrice,
                None,
                None,
                RuleTarget::MinProfitAmount,
                dec!(3000),
                1,
            ),
        ];
        let out = apply_rules(base(), &rules, dec!(10000), dec!(1));
        assert_eq!(out.min_amount, dec!(3000));
    }

    #[test]
    fn different_fields_do_not_interfere() {
        let rules = vec![
            rule(
                1,
                RuleCondition::SourcePrice,
                None,
                None,
                RuleTarget::MinProfitAmount,
                dec!(5000),
                10,
            ),
            rule(
                2,
                RuleCondition::Weight,
                None,
                None,
                RuleTarget::MinProfitRate,
                dec!(0.10),
                5,
            ),
        ];
        let out = apply_rules(base(), &rules, dec!(10000), dec!(1));
        assert_eq!(out.min_amount, dec!(5000));
        assert_eq!(out.min_rate, dec!(0.10));
    }

    #[test]
    fn non_matching_lower_priority_does_not_clobber() {
        let rules = vec![
            rule(
                1,
                RuleCondition::SourcePrice,
                Some(dec!(5000)),
                None,
                RuleTarget::MinProfitAmount,
                dec!(4000),
                10,
            ),
            rule(
                2,
                RuleCondition::SourcePrice,
                None,
                Some(dec!(5000)),
                RuleTarget::MinProfitAmount,
                dec!(1000),
                1,
            ),
        ];
        // source price 10000: only the first band matches.
        let out = apply_rules(base(), &rules, dec!(10000), dec!(1));
        assert_eq!(out.min_amount, dec!(4000));
    }

    // -- parsing --

    #[test]
    fn condition_and_target_round_trip() {
        for c in [RuleCondition::SourcePrice, RuleCondition::Weight] {
            assert_eq!(RuleCondition::parse(c.as_str()).unwrap(), c);
        }
        for t in [RuleTarget::MinProfitAmount, RuleTarget::MinProfitRate] {
            assert_eq!(RuleTarget::parse(t.as_str()).unwrap(), t);
        }
        assert!(RuleCondition::parse("bogus").is_err());
        assert!(RuleTarget::parse("bogus").is_err());
    }
}
