use crate::types::DbId;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: DbId },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    /// The global kill switch is set. Mutating operations must refuse
    /// to proceed before any side effect.
    #[error("System paused: {0}")]
    Paused(String),

    #[error("Internal error: {0}")]
    Internal(String),
}
