//! Repository for the `ledger_entries` table.

use rust_decimal::Decimal;
use sqlx::PgExecutor;

use flipline_core::types::{DbId, Timestamp};

use crate::models::ledger::{CreateLedgerEntry, LedgerEntry};

/// Column list for `ledger_entries` SELECT queries.
const COLUMNS: &str = "id, entity_type, entity_id, amount, memo, settled_at, created_at";

/// Provides operations for financial commitments.
pub struct LedgerRepo;

impl LedgerRepo {
    /// Record a new open commitment.
    pub async fn create<'e>(
        exec: impl PgExecutor<'e>,
        dto: &CreateLedgerEntry,
    ) -> Result<LedgerEntry, sqlx::Error> {
        let query = format!(
            "INSERT INTO ledger_entries (entity_type, entity_id, amount, memo) \
             VALUES ($1, $2, $3, $4) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, LedgerEntry>(&query)
            .bind(&dto.entity_type)
            .bind(dto.entity_id)
            .bind(dto.amount)
            .bind(&dto.memo)
            .fetch_one(exec)
            .await
    }

    /// Sum of all open (unsettled) commitments.
    pub async fn open_total<'e>(exec: impl PgExecutor<'e>) -> Result<Decimal, sqlx::Error> {
        sqlx::query_scalar::<_, Decimal>(
            "SELECT COALESCE(SUM(amount), 0) FROM ledger_entries WHERE settled_at IS NULL",
        )
        .fetch_one(exec)
        .await
    }

    /// The open commitment for one entity, if any.
    pub async fn find_open_for_entity<'e>(
        exec: impl PgExecutor<'e>,
        entity_type: &str,
        entity_id: DbId,
    ) -> Result<Option<LedgerEntry>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM ledger_entries \
             WHERE entity_type = $1 AND entity_id = $2 AND settled_at IS NULL \
             ORDER BY id DESC LIMIT 1"
        );
        sqlx::query_as::<_, LedgerEntry>(&query)
            .bind(entity_type)
            .bind(entity_id)
            .fetch_optional(exec)
            .await
    }

    /// Settle the open commitment for one entity, if any.
    pub async fn settle_open_for_entity<'e>(
        exec: impl PgExecutor<'e>,
        entity_type: &str,
        entity_id: DbId,
        at: Timestamp,
    ) -> Result<Option<LedgerEntry>, sqlx::Error> {
        let query = format!(
            "UPDATE ledger_entries SET settled_at = $3 \
             WHERE entity_type = $1 AND entity_id = $2 AND settled_at IS NULL \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, LedgerEntry>(&query)
            .bind(entity_type)
            .bind(entity_id)
            .bind(at)
            .fetch_optional(exec)
            .await
    }

    /// Settle a commitment.
    pub async fn settle<'e>(
        exec: impl PgExecutor<'e>,
        id: DbId,
        at: Timestamp,
    ) -> Result<Option<LedgerEntry>, sqlx::Error> {
        let query =
            format!("UPDATE ledger_entries SET settled_at = $2 WHERE id = $1 RETURNING {COLUMNS}");
        sqlx::query_as::<_, LedgerEntry>(&query)
            .bind(id)
            .bind(at)
            .fetch_optional(exec)
            .await
    }
}
