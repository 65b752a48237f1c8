//! Repository for the append-only `state_transitions` table.
//!
//! There are no update or delete operations here on purpose: the
//! transition log is the sole source of historical truth.

use sqlx::PgExecutor;

use flipline_core::types::DbId;

use crate::models::transition::{CreateStateTransition, StateTransition};

/// Column list for `state_transitions` SELECT queries.
const COLUMNS: &str = "\
    id, entity_type, entity_id, from_state, to_state, reason_code, \
    reason_detail, actor, correlation_id, integrity_hash, created_at";

/// Provides append and query operations for the transition log.
pub struct TransitionRepo;

impl TransitionRepo {
    /// Append one transition entry.
    pub async fn append<'e>(
        exec: impl PgExecutor<'e>,
        dto: &CreateStateTransition,
    ) -> Result<StateTransition, sqlx::Error> {
        let query = format!(
            "INSERT INTO state_transitions \
                 (entity_type, entity_id, from_state, to_state, reason_code, \
                  reason_detail, actor, correlation_id, integrity_hash) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, StateTransition>(&query)
            .bind(&dto.entity_type)
            .bind(dto.entity_id)
            .bind(&dto.from_state)
            .bind(&dto.to_state)
            .bind(&dto.reason_code)
            .bind(&dto.reason_detail)
            .bind(&dto.actor)
            .bind(&dto.correlation_id)
            .bind(&dto.integrity_hash)
            .fetch_one(exec)
            .await
    }

    /// Integrity hash of the most recent entry, for chaining.
    pub async fn find_last_hash<'e>(
        exec: impl PgExecutor<'e>,
    ) -> Result<Option<String>, sqlx::Error> {
        sqlx::query_scalar::<_, String>(
            "SELECT integrity_hash FROM state_transitions ORDER BY id DESC LIMIT 1",
        )
        .fetch_optional(exec)
        .await
    }

    /// History for one entity, newest first.
    pub async fn list_for_entity<'e>(
        exec: impl PgExecutor<'e>,
        entity_type: &str,
        entity_id: DbId,
        limit: i64,
    ) -> Result<Vec<StateTransition>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM state_transitions \
             WHERE entity_type = $1 AND entity_id = $2 \
             ORDER BY id DESC LIMIT $3"
        );
        sqlx::query_as::<_, StateTransition>(&query)
            .bind(entity_type)
            .bind(entity_id)
            .bind(limit)
            .fetch_all(exec)
            .await
    }

    /// All entries ordered by id ASC, for sequential chain verification.
    pub async fn list_for_integrity_check<'e>(
        exec: impl PgExecutor<'e>,
    ) -> Result<Vec<StateTransition>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM state_transitions ORDER BY id ASC");
        sqlx::query_as::<_, StateTransition>(&query)
            .fetch_all(exec)
            .await
    }
}
