//! Size tiers and the international shipping cost table.
//!
//! Shipping cost is a pure function of (size tier, weight): each tier
//! carries a base charge plus a per-kilogram rate, in JPY.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// SizeTier
// ---------------------------------------------------------------------------

/// Package size tier for a candidate item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SizeTier {
    S,
    M,
    L,
    Xl,
}

impl SizeTier {
    /// String representation for database storage.
    pub fn as_str(&self) -> &'static str {
        match self {
            SizeTier::S => "S",
            SizeTier::M => "M",
            SizeTier::L => "L",
            SizeTier::Xl => "XL",
        }
    }

    /// Parse from a stored string.
    pub fn parse(s: &str) -> Result<Self, CoreError> {
        match s {
            "S" => Ok(SizeTier::S),
            "M" => Ok(SizeTier::M),
            "L" => Ok(SizeTier::L),
            "XL" => Ok(SizeTier::Xl),
            other => Err(CoreError::Validation(format!(
                "Unknown size tier: '{other}'. Valid tiers: S, M, L, XL"
            ))),
        }
    }

    /// Base charge for this tier, JPY.
    fn base(&self) -> Decimal {
        match self {
            SizeTier::S => dec!(1200),
            SizeTier::M => dec!(1800),
            SizeTier::L => dec!(2500),
            SizeTier::Xl => dec!(3500),
        }
    }

    /// Per-kilogram rate for this tier, JPY.
    fn per_kg(&self) -> Decimal {
        match self {
            SizeTier::S => dec!(800),
            SizeTier::M => dec!(1000),
            SizeTier::L => dec!(1500),
            SizeTier::Xl => dec!(2000),
        }
    }
}

// ---------------------------------------------------------------------------
// Cost table
// ---------------------------------------------------------------------------

/// International shipping cost for a package: `base + per_kg * weight`.
///
/// Weight must be non-negative; fractional kilograms are charged
/// proportionally.
pub fn shipping_cost(tier: SizeTier, weight_kg: Decimal) -> Result<Decimal, CoreError> {
    if weight_kg < Decimal::ZERO {
        return Err(CoreError::Validation(format!(
            "weight_kg must be >= 0, got {weight_kg}"
        )));
    }
    Ok(tier.base() + tier.per_kg() * weight_kg)
}
