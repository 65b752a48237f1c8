//! Repository for the `fulfillments` table.

use sqlx::PgExecutor;

use flipline_core::types::DbId;

use crate::models::order::{CreateFulfillment, Fulfillment};

/// Column list for `fulfillments` SELECT queries.
const COLUMNS: &str = "id, order_id, carrier, tracking_number, shipped_at, created_at";

/// Provides operations for outbound shipment records.
pub struct FulfillmentRepo;

impl FulfillmentRepo {
    /// Record the outbound shipment for an order.
    pub async fn create<'e>(
        exec: impl PgExecutor<'e>,
        dto: &CreateFulfillment,
    ) -> Result<Fulfillment, sqlx::Error> {
        let query = format!(
            "INSERT INTO fulfillments (order_id, carrier, tracking_number, shipped_at) \
             VALUES ($1, $2, $3, $4) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Fulfillment>(&query)
            .bind(dto.order_id)
            .bind(&dto.carrier)
            .bind(&dto.tracking_number)
            .bind(dto.shipped_at)
            .fetch_one(exec)
            .await
    }

    /// Find the fulfillment for an order, if recorded.
    pub async fn find_by_order<'e>(
        exec: impl PgExecutor<'e>,
        order_id: DbId,
    ) -> Result<Option<Fulfillment>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM fulfillments WHERE order_id = $1");
        sqlx::query_as::<_, Fulfillment>(&query)
            .bind(order_id)
            .fetch_optional(exec)
            .await
    }
}
