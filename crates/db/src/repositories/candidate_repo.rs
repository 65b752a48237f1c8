//! Repository for the `candidates` table.

use sqlx::PgExecutor;

use flipline_core::types::{DbId, Timestamp};

use crate::models::candidate::{Candidate, CreateCandidate};

/// Column list for `candidates` SELECT queries.
const COLUMNS: &str = "\
    id, source_url, source_price, weight_kg, size_tier, memo, state, \
    reject_reason_code, reject_reason_detail, last_priced_at, \
    created_at, updated_at";

/// Provides query and mutation operations for candidates.
pub struct CandidateRepo;

impl CandidateRepo {
    /// Insert a new candidate in the initial state.
    pub async fn create<'e>(
        exec: impl PgExecutor<'e>,
        dto: &CreateCandidate,
        state: &str,
    ) -> Result<Candidate, sqlx::Error> {
        let query = format!(
            "INSERT INTO candidates \
                 (source_url, source_price, weight_kg, size_tier, memo, state) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Candidate>(&query)
            .bind(&dto.source_url)
            .bind(dto.source_price)
            .bind(dto.weight_kg)
            .bind(&dto.size_tier)
            .bind(&dto.memo)
            .bind(state)
            .fetch_one(exec)
            .await
    }

    /// Find a candidate by id.
    pub async fn find_by_id<'e>(
        exec: impl PgExecutor<'e>,
        id: DbId,
    ) -> Result<Option<Candidate>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM candidates WHERE id = $1");
        sqlx::query_as::<_, Candidate>(&query)
            .bind(id)
            .fetch_optional(exec)
            .await
    }

    /// Update lifecycle state and reject reason in one statement.
    ///
    /// Passing `None` reasons clears any previous rejection.
    pub async fn update_state<'e>(
        exec: impl PgExecutor<'e>,
        id: DbId,
        state: &str,
        reject_reason_code: Option<&str>,
        reject_reason_detail: Option<&str>,
    ) -> Result<Option<Candidate>, sqlx::Error> {
        let query = format!(
            "UPDATE candidates \
             SET state = $2, reject_reason_code = $3, reject_reason_detail = $4, \
                 updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Candidate>(&query)
            .bind(id)
            .bind(state)
            .bind(reject_reason_code)
            .bind(reject_reason_detail)
            .fetch_optional(exec)
            .await
    }

    /// Stamp `last_priced_at` after a pricing run.
    pub async fn touch_priced<'e>(
        exec: impl PgExecutor<'e>,
        id: DbId,
        at: Timestamp,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE candidates SET last_priced_at = $2 WHERE id = $1")
            .bind(id)
            .bind(at)
            .execute(exec)
            .await
            .map(|_| ())
    }

    /// List candidates in a given state, most recently updated first.
    pub async fn list_in_state<'e>(
        exec: impl PgExecutor<'e>,
        state: &str,
        limit: i64,
    ) -> Result<Vec<Candidate>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM candidates WHERE state = $1 \
             ORDER BY updated_at DESC LIMIT $2"
        );
        sqlx::query_as::<_, Candidate>(&query)
            .bind(state)
            .bind(limit)
            .fetch_all(exec)
            .await
    }
}
