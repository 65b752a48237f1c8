//! Draft listing model.

use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::FromRow;

use flipline_core::types::{DbId, Timestamp};

/// The external marketplace listing representation for a candidate.
///
/// `sku` is derived deterministically from the candidate id and is the
/// idempotency key for all external publish calls. `ebay_offer_id`
/// stays null until the offer is created.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Draft {
    pub id: DbId,
    pub candidate_id: DbId,
    pub sku: String,
    pub ebay_offer_id: Option<String>,
    /// Listing price, USD.
    pub listing_price_usd: Decimal,
    pub state: String,
    pub last_error: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}
