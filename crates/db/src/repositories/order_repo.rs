//! Repository for the `orders` table.

use sqlx::PgExecutor;

use flipline_core::types::{DbId, Timestamp};

use crate::models::order::{CreateOrder, Order};

/// Column list for `orders` SELECT queries.
const COLUMNS: &str = "\
    id, ebay_order_key, candidate_id, sale_price_usd, state, \
    tracking_attempts, tracking_started_at, tracking_last_attempt_at, \
    tracking_last_error, tracking_terminal_at, created_at, updated_at";

/// Provides query and mutation operations for orders.
pub struct OrderRepo;

impl OrderRepo {
    /// Insert a new order in the initial state.
    pub async fn create<'e>(
        exec: impl PgExecutor<'e>,
        dto: &CreateOrder,
        state: &str,
    ) -> Result<Order, sqlx::Error> {
        let query = format!(
            "INSERT INTO orders (ebay_order_key, candidate_id, sale_price_usd, state) \
             VALUES ($1, $2, $3, $4) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Order>(&query)
            .bind(&dto.ebay_order_key)
            .bind(dto.candidate_id)
            .bind(dto.sale_price_usd)
            .bind(state)
            .fetch_one(exec)
            .await
    }

    /// Find an order by id.
    pub async fn find_by_id<'e>(
        exec: impl PgExecutor<'e>,
        id: DbId,
    ) -> Result<Option<Order>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM orders WHERE id = $1");
        sqlx::query_as::<_, Order>(&query)
            .bind(id)
            .fetch_optional(exec)
            .await
    }

    /// Find an order by its marketplace key.
    pub async fn find_by_key<'e>(
        exec: impl PgExecutor<'e>,
        ebay_order_key: &str,
    ) -> Result<Option<Order>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM orders WHERE ebay_order_key = $1");
        sqlx::query_as::<_, Order>(&query)
            .bind(ebay_order_key)
            .fetch_optional(exec)
            .await
    }

    /// Update lifecycle state.
    pub async fn update_state<'e>(
        exec: impl PgExecutor<'e>,
        id: DbId,
        state: &str,
    ) -> Result<Option<Order>, sqlx::Error> {
        let query = format!(
            "UPDATE orders SET state = $2, updated_at = NOW() WHERE id = $1 RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Order>(&query)
            .bind(id)
            .bind(state)
            .fetch_optional(exec)
            .await
    }

    /// Record a failed tracking attempt: bump the counter, stamp the
    /// attempt time (and the start time on the first attempt), keep the
    /// error text.
    pub async fn record_attempt<'e>(
        exec: impl PgExecutor<'e>,
        id: DbId,
        at: Timestamp,
        error: &str,
    ) -> Result<Option<Order>, sqlx::Error> {
        let query = format!(
            "UPDATE orders \
             SET tracking_attempts = tracking_attempts + 1, \
                 tracking_started_at = COALESCE(tracking_started_at, $2), \
                 tracking_last_attempt_at = $2, \
                 tracking_last_error = $3, \
                 updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Order>(&query)
            .bind(id)
            .bind(at)
            .bind(error)
            .fetch_optional(exec)
            .await
    }

    /// Mark an order terminally failed. It is never selected again.
    pub async fn mark_terminal<'e>(
        exec: impl PgExecutor<'e>,
        id: DbId,
        state: &str,
        at: Timestamp,
    ) -> Result<Option<Order>, sqlx::Error> {
        let query = format!(
            "UPDATE orders \
             SET state = $2, tracking_terminal_at = $3, updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Order>(&query)
            .bind(id)
            .bind(state)
            .bind(at)
            .fetch_optional(exec)
            .await
    }

    /// Orders due for a tracking attempt: in the given state, not
    /// terminal, and never attempted or last attempted at or before
    /// `cutoff`. Most recently updated first, bounded by `limit`.
    pub async fn list_due_for_tracking<'e>(
        exec: impl PgExecutor<'e>,
        state: &str,
        cutoff: Timestamp,
        limit: i64,
    ) -> Result<Vec<Order>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM orders \
             WHERE state = $1 \
               AND tracking_terminal_at IS NULL \
               AND (tracking_last_attempt_at IS NULL OR tracking_last_attempt_at <= $2) \
             ORDER BY updated_at DESC \
             LIMIT $3"
        );
        sqlx::query_as::<_, Order>(&query)
            .bind(state)
            .bind(cutoff)
            .bind(limit)
            .fetch_all(exec)
            .await
    }
}
