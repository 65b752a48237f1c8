//! REST implementation of the marketplace contracts.
//!
//! Wraps the eBay Sell Inventory and Fulfillment APIs using [`reqwest`].
//! Every request runs under the client-wide timeout; a timed-out call
//! surfaces as a retryable [`EbayError::Transport`].

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::EbayError;
use crate::inventory::{InventoryItem, ItemClient, OfferRequest};
use crate::orders::{OrderClient, OrderDetails};

/// Default per-request timeout. A deployment parameter, not a contract.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// HTTP client for one eBay seller account.
pub struct EbayApi {
    client: reqwest::Client,
    base_url: String,
    token: String,
}

#[derive(Debug, Deserialize)]
struct CreateOfferResponse {
    #[serde(rename = "offerId")]
    offer_id: String,
}

#[derive(Debug, Deserialize)]
struct FulfillmentList {
    #[serde(default)]
    fulfillments: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct OrderResponse {
    #[serde(rename = "orderId")]
    order_id: String,
    #[serde(rename = "buyerUsername")]
    buyer_username: Option<String>,
    #[serde(rename = "fulfillmentStartedInstant", default)]
    fulfillment_started: Option<String>,
}

impl EbayApi {
    /// Create a client with the default request timeout.
    ///
    /// * `base_url` - API root, e.g. `https://api.ebay.com`.
    /// * `token`    - OAuth bearer token for the seller account.
    pub fn new(base_url: String, token: String) -> Result<Self, EbayError> {
        Self::with_timeout(base_url, token, DEFAULT_TIMEOUT)
    }

    /// Create a client with an explicit request timeout.
    pub fn with_timeout(
        base_url: String,
        token: String,
        timeout: Duration,
    ) -> Result<Self, EbayError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| EbayError::Transport(e.to_string()))?;
        Ok(Self {
            client,
            base_url,
            token,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Map a non-2xx response to the error taxonomy. `offer_layer`
    /// controls whether the failure is classified for compensation.
    async fn error_from(response: reqwest::Response, offer_layer: bool) -> EbayError {
        let status = response.status().as_u16();
        match status {
            401 | 403 => {
                EbayError::Auth(format!("status {status}"))
            }
            429 => EbayError::RateLimited,
            _ => {
                let body = response.text().await.unwrap_or_default();
                if offer_layer {
                    EbayError::Offer { status, body }
                } else {
                    EbayError::Api { status, body }
                }
            }
        }
    }
}

#[async_trait]
impl ItemClient for EbayApi {
    async fn put_inventory_item(&self, sku: &str, item: &InventoryItem) -> Result<(), EbayError> {
        let response = self
            .client
            .put(self.url(&format!("/sell/inventory/v1/inventory_item/{sku}")))
            .bearer_auth(&self.token)
            .json(item)
            .send()
            .await
            .map_err(|e| EbayError::Transport(e.to_string()))?;

        if response.status().is_success() {
            tracing::debug!(sku, "Inventory item upserted");
            Ok(())
        } else {
            Err(Self::error_from(response, false).await)
        }
    }

    async fn create_offer(&self, sku: &str, offer: &OfferRequest) -> Result<String, EbayError> {
        let body = serde_json::json!({
            "sku": sku,
            "marketplaceId": "EBAY_US",
            "format": "FIXED_PRICE",
            "pricingSummary": { "price": { "value": offer.price_usd, "currency": "USD" } },
            "categoryId": offer.category_id,
            "listingDescription": offer.listing_description,
        });

        let response = self
            .client
            .post(self.url("/sell/inventory/v1/offer"))
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await
            .map_err(|e| EbayError::Transport(e.to_string()))?;

        if response.status().is_success() {
            let parsed: CreateOfferResponse = response
                .json()
                .await
                .map_err(|e| EbayError::Transport(e.to_string()))?;
            tracing::debug!(sku, offer_id = %parsed.offer_id, "Offer created");
            Ok(parsed.offer_id)
        } else {
            Err(Self::error_from(response, true).await)
        }
    }

    async fn check_offer_exists(&self, offer_id: &str) -> Result<bool, EbayError> {
        let response = self
            .client
            .get(self.url(&format!("/sell/inventory/v1/offer/{offer_id}")))
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| EbayError::Transport(e.to_string()))?;

        match response.status().as_u16() {
            200 => Ok(true),
            404 => Ok(false),
            _ => Err(Self::error_from(response, true).await),
        }
    }
}

#[async_trait]
impl OrderClient for EbayApi {
    async fn upload_tracking(
        &self,
        order_key: &str,
        carrier: &str,
        tracking_number: &str,
    ) -> Result<(), EbayError> {
        let body = serde_json::json!({
            "trackingNumber": tracking_number,
            "shippingCarrierCode": carrier,
        });

        let response = self
            .client
            .post(self.url(&format!(
                "/sell/fulfillment/v1/order/{order_key}/shipping_fulfillment"
            )))
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await
            .map_err(|e| EbayError::Transport(e.to_string()))?;

        if response.status().is_success() {
            tracing::debug!(order_key, carrier, "Tracking uploaded");
            Ok(())
        } else {
            Err(Self::error_from(response, false).await)
        }
    }

    async fn check_tracking_uploaded(&self, order_key: &str) -> Result<bool, EbayError> {
        let response = self
            .client
            .get(self.url(&format!(
                "/sell/fulfillment/v1/order/{order_key}/shipping_fulfillment"
            )))
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| EbayError::Transport(e.to_string()))?;

        if response.status().is_success() {
            let parsed: FulfillmentList = response
                .json()
                .await
                .map_err(|e| EbayError::Transport(e.to_string()))?;
            Ok(!parsed.fulfillments.is_empty())
        } else {
            Err(Self::error_from(response, false).await)
        }
    }

    async fn get_order(&self, order_key: &str) -> Result<OrderDetails, EbayError> {
        let response = self
            .client
            .get(self.url(&format!("/sell/fulfillment/v1/order/{order_key}")))
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| EbayError::Transport(e.to_string()))?;

        if response.status().is_success() {
            let parsed: OrderResponse = response
                .json()
                .await
                .map_err(|e| EbayError::Transport(e.to_string()))?;
            Ok(OrderDetails {
                order_key: parsed.order_id,
                buyer_username: parsed.buyer_username,
                fulfillment_started: parsed.fulfillment_started.is_some(),
            })
        } else {
            Err(Self::error_from(response, false).await)
        }
    }
}
