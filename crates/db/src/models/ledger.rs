//! Ledger entry model.
//!
//! Financial commitments incurred by the pipeline. An entry is *open*
//! until `settled_at` is stamped; the sum of open entries is the "open
//! commitments" figure the cash gate reads.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use flipline_core::types::{DbId, Timestamp};

/// A financial commitment row.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct LedgerEntry {
    pub id: DbId,
    pub entity_type: String,
    pub entity_id: DbId,
    /// Committed amount, JPY.
    pub amount: Decimal,
    pub memo: Option<String>,
    pub settled_at: Option<Timestamp>,
    pub created_at: Timestamp,
}

/// DTO for recording a commitment.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateLedgerEntry {
    pub entity_type: String,
    pub entity_id: DbId,
    pub amount: Decimal,
    pub memo: Option<String>,
}
