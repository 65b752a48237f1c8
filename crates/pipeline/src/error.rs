use flipline_core::error::CoreError;

/// Errors surfaced by orchestration operations.
///
/// Gate failures and publish/tracking outcomes are result values, not
/// errors; this type covers inputs and state that make an operation
/// impossible, plus storage failures.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl PipelineError {
    /// Whether this is the kill-switch refusal.
    pub fn is_paused(&self) -> bool {
        matches!(self, PipelineError::Core(CoreError::Paused(_)))
    }

    /// Whether this is a state-conflict error the caller can retry
    /// after correcting the precondition.
    pub fn is_conflict(&self) -> bool {
        matches!(self, PipelineError::Core(CoreError::Conflict(_)))
    }
}
