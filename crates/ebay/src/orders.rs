//! Order-side contract: tracking upload and verification.

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::EbayError;

/// Order details as returned by the marketplace.
#[derive(Debug, Clone, Deserialize)]
pub struct OrderDetails {
    pub order_key: String,
    pub buyer_username: Option<String>,
    pub fulfillment_started: bool,
}

/// Fulfillment-side marketplace operations.
///
/// `check_tracking_uploaded` must be safe to call any number of times;
/// the reconciliation loop uses it to disambiguate timed-out uploads.
#[async_trait]
pub trait OrderClient: Send + Sync {
    /// Upload carrier + tracking number for an order.
    async fn upload_tracking(
        &self,
        order_key: &str,
        carrier: &str,
        tracking_number: &str,
    ) -> Result<(), EbayError>;

    /// Whether tracking is already recorded for an order.
    async fn check_tracking_uploaded(&self, order_key: &str) -> Result<bool, EbayError>;

    /// Fetch order details.
    async fn get_order(&self, order_key: &str) -> Result<OrderDetails, EbayError>;
}
