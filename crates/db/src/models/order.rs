//! Order and fulfillment models.
//!
//! Tracking retry state (attempt count, start time, last error) lives on
//! the order row so a restart never resets the retry budget.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use flipline_core::types::{DbId, Timestamp};

// ---------------------------------------------------------------------------
// Order entity
// ---------------------------------------------------------------------------

/// A marketplace order created from a sale notification.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Order {
    pub id: DbId,
    /// Marketplace order key used on all external tracking calls.
    pub ebay_order_key: String,
    pub candidate_id: Option<DbId>,
    /// Sale price, USD.
    pub sale_price_usd: Decimal,
    pub state: String,
    pub tracking_attempts: i32,
    pub tracking_started_at: Option<Timestamp>,
    pub tracking_last_attempt_at: Option<Timestamp>,
    pub tracking_last_error: Option<String>,
    pub tracking_terminal_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for order ingestion.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateOrder {
    pub ebay_order_key: String,
    pub candidate_id: Option<DbId>,
    pub sale_price_usd: Decimal,
}

// ---------------------------------------------------------------------------
// Fulfillment
// ---------------------------------------------------------------------------

/// Outbound shipment details for an order. Required before any tracking
/// upload is attempted.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Fulfillment {
    pub id: DbId,
    pub order_id: DbId,
    pub carrier: String,
    pub tracking_number: String,
    pub shipped_at: Timestamp,
    pub created_at: Timestamp,
}

/// DTO for recording a fulfillment.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateFulfillment {
    pub order_id: DbId,
    pub carrier: String,
    pub tracking_number: String,
    pub shipped_at: Timestamp,
}
