//! Transition recorder and chain verification.
//!
//! Every entity state change goes through [`record`], inside the same
//! transaction as the entity write, so an entry exists for exactly the
//! transitions that committed. Entries are hash-chained; [`verify_chain`]
//! recomputes the chain to detect tampering.

use serde::Serialize;
use sqlx::{PgPool, Postgres, Transaction};

use flipline_core::audit::{canonical_entry, compute_integrity_hash};
use flipline_core::types::DbId;
use flipline_db::models::transition::{CreateStateTransition, StateTransition};
use flipline_db::repositories::TransitionRepo;

use crate::error::PipelineError;

/// One transition to record.
#[derive(Debug, Clone, Copy)]
pub struct TransitionRecord<'a> {
    pub entity_type: &'a str,
    pub entity_id: DbId,
    /// `None` for entity creation.
    pub from_state: Option<&'a str>,
    pub to_state: &'a str,
    pub reason_code: Option<&'a str>,
    pub reason_detail: Option<&'a str>,
    pub actor: &'a str,
    pub correlation_id: &'a str,
}

/// Append one hash-chained entry within the caller's transaction.
pub async fn record(
    tx: &mut Transaction<'_, Postgres>,
    rec: TransitionRecord<'_>,
) -> Result<StateTransition, PipelineError> {
    let prev_hash = TransitionRepo::find_last_hash(&mut **tx).await?;
    let entry_data = canonical_entry(
        rec.entity_type,
        rec.entity_id,
        rec.from_state,
        rec.to_state,
        rec.reason_code,
        rec.actor,
        rec.correlation_id,
    );
    let integrity_hash = compute_integrity_hash(prev_hash.as_deref(), &entry_data);

    let created = TransitionRepo::append(
        &mut **tx,
        &CreateStateTransition {
            entity_type: rec.entity_type.to_string(),
            entity_id: rec.entity_id,
            from_state: rec.from_state.map(str::to_string),
            to_state: rec.to_state.to_string(),
            reason_code: rec.reason_code.map(str::to_string),
            reason_detail: rec.reason_detail.map(str::to_string),
            actor: rec.actor.to_string(),
            correlation_id: rec.correlation_id.to_string(),
            integrity_hash,
        },
    )
    .await?;

    tracing::debug!(
        entity_type = rec.entity_type,
        entity_id = rec.entity_id,
        from = rec.from_state.unwrap_or("-"),
        to = rec.to_state,
        reason = rec.reason_code.unwrap_or("-"),
        correlation_id = rec.correlation_id,
        "Transition recorded",
    );

    Ok(created)
}

/// Result of a transition-log integrity verification.
#[derive(Debug, Clone, Serialize)]
pub struct ChainVerification {
    /// Number of entries verified.
    pub verified_entries: i64,
    /// Whether the entire chain is valid.
    pub chain_valid: bool,
    /// ID of the first entry where the chain breaks, if any.
    pub first_break: Option<DbId>,
}

/// Recompute the full hash chain and report the first break, if any.
pub async fn verify_chain(pool: &PgPool) -> Result<ChainVerification, PipelineError> {
    let entries = TransitionRepo::list_for_integrity_check(pool).await?;

    let mut prev_hash: Option<String> = None;
    let mut verified = 0i64;
    for entry in &entries {
        let entry_data = canonical_entry(
            &entry.entity_type,
            entry.entity_id,
            entry.from_state.as_deref(),
            &entry.to_state,
            entry.reason_code.as_deref(),
            &entry.actor,
            &entry.correlation_id,
        );
        let expected = compute_integrity_hash(prev_hash.as_deref(), &entry_data);
        if expected != entry.integrity_hash {
            return Ok(ChainVerification {
                verified_entries: verified,
                chain_valid: false,
                first_break: Some(entry.id),
            });
        }
        verified += 1;
        prev_hash = Some(entry.integrity_hash.clone());
    }

    Ok(ChainVerification {
        verified_entries: verified,
        chain_valid: true,
        first_break: None,
    })
}
