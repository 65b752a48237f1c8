//! Inventory-side contract: item upsert, offer creation, offer lookup.

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::error::EbayError;

/// Payload for the inventory item upsert, keyed by SKU.
#[derive(Debug, Clone, Serialize)]
pub struct InventoryItem {
    pub title: String,
    pub description: String,
    /// Package weight in kilograms, for shipping calculation.
    pub weight_kg: Decimal,
}

/// Payload for offer creation.
#[derive(Debug, Clone, Serialize)]
pub struct OfferRequest {
    /// Listing price, USD.
    pub price_usd: Decimal,
    pub category_id: String,
    pub listing_description: String,
}

/// Listing-side marketplace operations.
///
/// `put_inventory_item` must be an upsert on the SKU: calling it twice
/// with the same SKU must never create a second item. Offer creation is
/// not idempotent on the marketplace side, which is why the caller
/// records the returned offer id before anything else can fail.
#[async_trait]
pub trait ItemClient: Send + Sync {
    /// Create or replace the inventory item for a SKU.
    async fn put_inventory_item(&self, sku: &str, item: &InventoryItem) -> Result<(), EbayError>;

    /// Create an offer for a SKU, returning the marketplace offer id.
    async fn create_offer(&self, sku: &str, offer: &OfferRequest) -> Result<String, EbayError>;

    /// Whether an offer still exists on the marketplace.
    async fn check_offer_exists(&self, offer_id: &str) -> Result<bool, EbayError>;
}
