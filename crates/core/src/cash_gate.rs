//! Cash-availability gate for new sourcing commitments.
//!
//! Pure computation over a snapshot of the current financial position
//! plus the ledger's open commitments. The working-capital cap throttles
//! reliance on credit during rapid expansion; when cash alone fully
//! covers the new commitment the cap is not binding. Returns the verdict
//! together with every intermediate figure so operators can see exactly
//! which constraint bound.

use rust_decimal::Decimal;
use serde::Serialize;

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Inputs
// ---------------------------------------------------------------------------

/// Snapshot of the financial position, resolved from config.
#[derive(Debug, Clone)]
pub struct CashSnapshot {
    pub cash: Decimal,
    pub credit_limit: Decimal,
    pub credit_used: Decimal,
    pub unconfirmed_cost: Decimal,
    pub fixed_reserve: Decimal,
    pub trailing_sales_30d: Decimal,
    pub refund_reserve_ratio: Decimal,
    pub working_capital_cap_ratio: Decimal,
    /// Minimum cushion that must remain after taking the commitment.
    pub safety_buffer: Decimal,
}

// ---------------------------------------------------------------------------
// Verdict
// ---------------------------------------------------------------------------

/// Gate verdict plus all intermediate figures.
#[derive(Debug, Clone, Serialize)]
pub struct CashVerdict {
    pub new_cost: Decimal,
    pub open_commitments: Decimal,
    pub credit_available: Decimal,
    pub refund_reserve: Decimal,
    pub working_capital_available: Decimal,
    pub cap_limit: Decimal,
    pub pure_cash_available: Decimal,
    pub cap_ok: bool,
    pub covered_by_cash_alone: bool,
    pub ok: bool,
}

// ---------------------------------------------------------------------------
// Evaluation
// ---------------------------------------------------------------------------

/// Evaluate whether a proposed new commitment is affordable.
///
/// `ok = (cap_ok OR covered_by_cash_alone) AND working_capital_available
/// >= new_cost + safety_buffer`. No side effects.
pub fn evaluate(
    snapshot: &CashSnapshot,
    open_commitments: Decimal,
    new_cost: Decimal,
) -> Result<CashVerdict, CoreError> {
    if new_cost < Decimal::ZERO {
        return Err(CoreError::Validation(format!(
            "new_cost must be >= 0, got {new_cost}"
        )));
    }
    if open_commitments < Decimal::ZERO {
        return Err(CoreError::Validation(format!(
            "open_commitments must be >= 0, got {open_commitments}"
        )));
    }

    let credit_available = (snapshot.credit_limit - snapshot.credit_used).max(Decimal::ZERO);
    let refund_reserve = snapshot
        .fixed_reserve
        .max(snapshot.trailing_sales_30d * snapshot.refund_reserve_ratio);

    let working_capital_available = snapshot.cash + credit_available
        - snapshot.unconfirmed_cost
        - refund_reserve
        - open_commitments;
    let pure_cash_available =
        snapshot.cash - snapshot.unconfirmed_cost - refund_reserve - open_commitments;

    let cap_limit = snapshot.trailing_sales_30d * snapshot.working_capital_cap_ratio;
    let required = new_cost + snapshot.safety_buffer;

    let cap_ok = open_commitments + new_cost <= cap_limit;
    let covered_by_cash_alone = pure_cash_available >= required;
    let ok = (cap_ok || covered_by_cash_alone) && working_capital_available >= required;

    Ok(CashVerdict {
        new_cost,
        open_commitments,
        credit_available,
        refund_reserve,
        working_capital_available,
        cap_limit,
        pure_cash_available,
        cap_ok,
        covered_by_cash_alone,
        ok,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn snapshot() -> CashSnapshot {
        CashSnapshot {
            cash: dec!(30000),
            credit_limit: dec!(0),
            credit_used: dec!(0),
            unconfirmed_cost: dec!(0),
            fixed_reserve: dec!(10000),
            trailing_sales_30d: dec!(0),
            refund_reserve_ratio: dec!(0.08),
            working_capital_cap_ratio: dec!(0.5),
            safety_buffer: dec!(50000),
        }
    }

    // -- worked example: thin cash position refuses a 5000 commitment --

    #[test]
    fn thin_position_refused() {
        let v = evaluate(&snapshot(), dec!(0), dec!(5000)).unwrap();
        assert_eq!(v.pure_cash_available, dec!(20000));
        assert_eq!(v.working_capital_available, dec!(20000));
        // available 20000 < 5000 + 50000 buffer
        assert!(!v.covered_by_cash_alone);
        assert!(!v.cap_ok);
        assert!(!v.ok);
    }

    #[test]
    fn deep_cash_passes_without_cap() {
        let mut s = snapshot();
        s.cash = dec!(500000);
        let v = evaluate(&s, dec!(0), dec!(5000)).unwrap();
        assert!(v.covered_by_cash_alone);
        assert!(v.ok);
    }

    #[test]
    fn cap_admits_credit_backed_commitment() {
        let mut s = snapshot();
        s.cash = dec!(10000);
        s.credit_limit = dec!(300000);
        s.trailing_sales_30d = dec!(400000);
        // cap limit 200000; reserve = max(10000, 32000) = 32000
        let v = evaluate(&s, dec!(50000), dec!(20000)).unwrap();
        assert!(v.cap_ok);
        assert_eq!(v.refund_reserve, dec!(32000.00));
        // wc = 10000 + 300000 - 32000 - 50000 = 228000 >= 70000
        assert!(v.ok);
        assert!(!v.covered_by_cash_alone);
    }

    #[test]
    fn cap_exceeded_and_cash_short_refused() {
        let mut s = snapshot();
        s.cash = dec!(10000);
        s.credit_limit = dec!(300000);
        s.trailing_sales_30d = dec!(100000);
        // cap limit 50000, open 50000 + new 20000 > cap; pure cash negative
        let v = evaluate(&s, dec!(50000), dec!(20000)).unwrap();
        assert!(!v.cap_ok);
        assert!(!v.covered_by_cash_alone);
        assert!(!v.ok);
    }

    // -- stated properties --

    #[test]
    fn ok_implies_working_capital_covers_cost() {
        let mut s = snapshot();
        s.cash = dec!(500000);
        for new_cost in [dec!(0), dec!(5000), dec!(100000)] {
            let v = evaluate(&s, dec!(10000), new_cost).unwrap();
            if v.ok {
                assert!(v.working_capital_available >= v.new_cost);
            }
        }
    }

    #[test]
    fn covered_by_cash_alone_implies_ok() {
        // Working capital is always >= pure cash (credit_available >= 0),
        // so cash-alone coverage can never coincide with a refusal.
        let mut s = snapshot();
        s.cash = dec!(200000);
        s.credit_limit = dec!(50000);
        let v = evaluate(&s, dec!(0), dec!(5000)).unwrap();
        assert!(v.covered_by_cash_alone);
        assert!(v.ok);
    }

    #[test]
    fn credit_overdraw_clamps_to_zero() {
        let mut s = snapshot();
        s.credit_limit = dec!(10000);
        s.credit_used = dec!(25000);
        let v = evaluate(&s, dec!(0), dec!(0)).unwrap();
        assert_eq!(v.credit_available, dec!(0));
    }

    #[test]
    fn reserve_takes_larger_of_fixed_and_ratio() {
        let mut s = snapshot();
        s.fixed_reserve = dec!(10000);
        s.trailing_sales_30d = dec!(50000);
        // ratio reserve = 4000 < fixed 10000
        let v = evaluate(&s, dec!(0), dec!(0)).unwrap();
        assert_eq!(v.refund_reserve, dec!(10000));

        s.trailing_sales_30d = dec!(500000);
        // ratio reserve = 40000 > fixed
        let v = evaluate(&s, dec!(0), dec!(0)).unwrap();
        assert_eq!(v.refund_reserve, dec!(40000.00));
    }

    #[test]
    fn negative_new_cost_rejected() {
        assert!(evaluate(&snapshot(), dec!(0), dec!(-1)).is_err());
    }

    #[test]
    fn negative_open_commitments_rejected() {
        assert!(evaluate(&snapshot(), dec!(-1), dec!(0)).is_err());
    }

    #[test]
    fn zero_cost_still_requires_buffer() {
        // Even a zero-cost commitment needs the cushion intact.
        let v = evaluate(&snapshot(), dec!(0), dec!(0)).unwrap();
        assert!(!v.ok);
    }
}
