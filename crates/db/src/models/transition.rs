//! Transition log entity model and DTOs.
//!
//! The append-only audit trail for every entity state change. Rows have
//! no `updated_at` and are never updated or deleted.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use flipline_core::types::{DbId, Timestamp};

/// A single transition log entry. Immutable once created.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct StateTransition {
    pub id: DbId,
    pub entity_type: String,
    pub entity_id: DbId,
    /// Null for entity creation.
    pub from_state: Option<String>,
    pub to_state: String,
    pub reason_code: Option<String>,
    pub reason_detail: Option<String>,
    pub actor: String,
    pub correlation_id: String,
    pub integrity_hash: String,
    pub created_at: Timestamp,
}

/// DTO for appending a transition.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateStateTransition {
    pub entity_type: String,
    pub entity_id: DbId,
    pub from_state: Option<String>,
    pub to_state: String,
    pub reason_code: Option<String>,
    pub reason_detail: Option<String>,
    pub actor: String,
    pub correlation_id: String,
    pub integrity_hash: String,
}
