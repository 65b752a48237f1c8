//! Candidate entity model and DTOs.
//!
//! A candidate is a sourced item under profitability evaluation. It is
//! created on intake, mutated by pricing and publishing, and never
//! deleted — rejection is soft-terminal via `state`.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use flipline_core::types::{DbId, Timestamp};

/// A sourced item under evaluation. `state` holds only the current
/// lifecycle state; history lives in `state_transitions`.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Candidate {
    pub id: DbId,
    pub source_url: String,
    /// Acquisition price, JPY.
    pub source_price: Decimal,
    pub weight_kg: Option<Decimal>,
    pub size_tier: Option<String>,
    pub memo: Option<String>,
    pub state: String,
    pub reject_reason_code: Option<String>,
    pub reject_reason_detail: Option<String>,
    pub last_priced_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for candidate intake.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateCandidate {
    pub source_url: String,
    pub source_price: Decimal,
    pub weight_kg: Option<Decimal>,
    pub size_tier: Option<String>,
    pub memo: Option<String>,
}
