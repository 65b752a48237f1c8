//! Candidate intake.

use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use flipline_core::audit::{entity_types, reason_codes};
use flipline_core::candidate_state::CandidateState;
use flipline_core::error::CoreError;
use flipline_core::shipping::SizeTier;
use flipline_db::models::candidate::{Candidate, CreateCandidate};
use flipline_db::repositories::CandidateRepo;

use crate::audit::{self, TransitionRecord};
use crate::config::{ensure_not_paused, ConfigProvider};
use crate::error::PipelineError;

/// Create a candidate in the initial state, with an audited creation
/// entry (`from = NULL`).
pub async fn create_candidate(
    pool: &PgPool,
    config: &dyn ConfigProvider,
    dto: &CreateCandidate,
    actor: &str,
) -> Result<Candidate, PipelineError> {
    ensure_not_paused(config).await?;

    if dto.source_url.trim().is_empty() {
        return Err(CoreError::Validation("source_url must not be empty".into()).into());
    }
    if dto.source_price <= Decimal::ZERO {
        return Err(CoreError::Validation(format!(
            "source_price must be positive, got {}",
            dto.source_price
        ))
        .into());
    }
    if let Some(weight) = dto.weight_kg {
        if weight < Decimal::ZERO {
            return Err(
                CoreError::Validation(format!("weight_kg must be >= 0, got {weight}")).into(),
            );
        }
    }
    if let Some(ref tier) = dto.size_tier {
        SizeTier::parse(tier).map_err(PipelineError::from)?;
    }

    let correlation_id = Uuid::new_v4().to_string();
    let initial = CandidateState::Candidate;

    let mut tx = pool.begin().await?;
    let candidate = CandidateRepo::create(&mut *tx, dto, initial.as_str()).await?;
    audit::record(
        &mut tx,
        TransitionRecord {
            entity_type: entity_types::CANDIDATE,
            entity_id: candidate.id,
            from_state: None,
            to_state: initial.as_str(),
            reason_code: Some(reason_codes::INTAKE),
            reason_detail: None,
            actor,
            correlation_id: &correlation_id,
        },
    )
    .await?;
    tx.commit().await?;

    tracing::info!(
        candidate_id = candidate.id,
        source_price = %candidate.source_price,
        "Candidate created",
    );

    Ok(candidate)
}
