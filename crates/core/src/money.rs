//! Fixed-point money rounding helpers.
//!
//! All monetary values in the pipeline are `rust_decimal::Decimal`
//! (Postgres `NUMERIC`); floating point is never used for money.
//! Intermediate amounts round half-up to two decimal places; the final
//! recommended sell price rounds *up* so the recommendation never
//! undershoots the required profit.

use rust_decimal::{Decimal, RoundingStrategy};

/// Round to two decimal places, half-up (normal money rounding).
pub fn round_half_up_2dp(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Round up to two decimal places (ceiling).
pub fn ceil_2dp(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::ToPositiveInfinity)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn half_up_rounds_midpoint_away() {
        assert_eq!(round_half_up_2dp(dec!(1.005)), dec!(1.01));
        assert_eq!(round_half_up_2dp(dec!(1.004)), dec!(1.00));
    }

    #[test]
    fn half_up_leaves_exact_values() {
        assert_eq!(round_half_up_2dp(dec!(18300.00)), dec!(18300.00));
    }

    #[test]
    fn ceil_rounds_up() {
        assert_eq!(ceil_2dp(dec!(183.7965)), dec!(183.80));
        assert_eq!(ceil_2dp(dec!(183.791)), dec!(183.80));
    }

    #[test]
    fn ceil_leaves_exact_values() {
        assert_eq!(ceil_2dp(dec!(183.80)), dec!(183.80));
    }
}
