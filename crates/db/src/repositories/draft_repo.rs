//! Repository for the `drafts` table.

use rust_decimal::Decimal;
use sqlx::PgExecutor;

use flipline_core::types::DbId;

use crate::models::draft::Draft;

/// Column list for `drafts` SELECT queries.
const COLUMNS: &str = "\
    id, candidate_id, sku, ebay_offer_id, listing_price_usd, state, \
    last_error, created_at, updated_at";

/// Provides query and mutation operations for drafts.
pub struct DraftRepo;

impl DraftRepo {
    /// Ensure a draft row exists for the candidate, refreshing the
    /// listing price. The SKU never changes once assigned.
    pub async fn upsert_for_candidate<'e>(
        exec: impl PgExecutor<'e>,
        candidate_id: DbId,
        sku: &str,
        listing_price_usd: Decimal,
        initial_state: &str,
    ) -> Result<Draft, sqlx::Error> {
        let query = format!(
            "INSERT INTO drafts (candidate_id, sku, listing_price_usd, state) \
             VALUES ($1, $2, $3, $4) \
             ON CONFLICT (candidate_id) \
             DO UPDATE SET \
                listing_price_usd = EXCLUDED.listing_price_usd, \
                updated_at = NOW() \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Draft>(&query)
            .bind(candidate_id)
            .bind(sku)
            .bind(listing_price_usd)
            .bind(initial_state)
            .fetch_one(exec)
            .await
    }

    /// Find the draft for a candidate, if any.
    pub async fn find_by_candidate<'e>(
        exec: impl PgExecutor<'e>,
        candidate_id: DbId,
    ) -> Result<Option<Draft>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM drafts WHERE candidate_id = $1");
        sqlx::query_as::<_, Draft>(&query)
            .bind(candidate_id)
            .fetch_optional(exec)
            .await
    }

    /// Record the external offer id once the marketplace assigns one.
    pub async fn set_offer_id<'e>(
        exec: impl PgExecutor<'e>,
        id: DbId,
        offer_id: &str,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE drafts SET ebay_offer_id = $2, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(offer_id)
            .execute(exec)
            .await
            .map(|_| ())
    }

    /// Clear a dangling offer id after the compensating existence check
    /// found the offer gone, so the next attempt recreates it.
    pub async fn clear_offer_id<'e>(exec: impl PgExecutor<'e>, id: DbId) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE drafts SET ebay_offer_id = NULL, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .execute(exec)
            .await
            .map(|_| ())
    }

    /// Update lifecycle state and the last error text.
    pub async fn update_state<'e>(
        exec: impl PgExecutor<'e>,
        id: DbId,
        state: &str,
        last_error: Option<&str>,
    ) -> Result<Option<Draft>, sqlx::Error> {
        let query = format!(
            "UPDATE drafts \
             SET state = $2, last_error = $3, updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Draft>(&query)
            .bind(id)
            .bind(state)
            .bind(last_error)
            .fetch_optional(exec)
            .await
    }
}
