//! Draft publisher: idempotent external listing creation.
//!
//! The external system is not transactional, so the publish sequence is
//! a small saga keyed on the candidate's deterministic SKU: the
//! inventory upsert is idempotent by contract, the offer id is persisted
//! the moment the marketplace returns it, and an offer-layer failure
//! with a recorded offer id triggers a compensating existence check so a
//! dangling reference can never wedge the draft permanently. A retried
//! publish therefore never creates a second listing for the same SKU.

use chrono::Duration;
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use flipline_core::audit::{entity_types, reason_codes};
use flipline_core::candidate_state::{self, CandidateState};
use flipline_core::error::CoreError;
use flipline_core::sku::candidate_sku;
use flipline_core::types::DbId;
use flipline_db::models::candidate::Candidate;
use flipline_db::models::draft::Draft;
use flipline_db::models::ledger::CreateLedgerEntry;
use flipline_db::models::pricing::PricingResult;
use flipline_db::repositories::{CandidateRepo, DraftRepo, LedgerRepo, PricingRepo};
use flipline_ebay::{EbayError, InventoryItem, ItemClient, OfferRequest};

use crate::audit::{self, TransitionRecord};
use crate::config::{self, ensure_not_paused, ConfigProvider};
use crate::error::PipelineError;

// ---------------------------------------------------------------------------
// Draft states
// ---------------------------------------------------------------------------

/// Draft lifecycle values stored in `drafts.state`.
pub mod draft_states {
    pub const PENDING: &str = "PENDING";
    pub const CREATED: &str = "CREATED";
    pub const FAILED: &str = "FAILED";
}

/// Pricing older than the candidate's last modification by more than
/// this is considered stale and must be recomputed before publishing.
fn freshness_tolerance() -> Duration {
    Duration::seconds(5)
}

/// Default listing category when none is configured.
const DEFAULT_CATEGORY_ID: &str = "99";

// ---------------------------------------------------------------------------
// Outcome
// ---------------------------------------------------------------------------

/// Result of one publish attempt.
#[derive(Debug, Clone, Serialize)]
pub enum PublishOutcome {
    /// Draft and candidate were already in the created state; no
    /// external calls were made.
    AlreadyPublished { draft: Draft },
    /// Listing created (or completed after a partial earlier attempt).
    Published { draft: Draft, candidate: Candidate },
    /// External failure, recorded on the draft and candidate.
    Failed { draft: Draft, error: String },
}

// ---------------------------------------------------------------------------
// Operation
// ---------------------------------------------------------------------------

/// Publish a candidate's draft listing to the marketplace.
///
/// Preconditions: candidate in `DRAFT_READY`, `EBAY_DRAFT_FAILED`, or
/// `EBAY_DRAFT_CREATED`; a pricing snapshot with both gates passed; and
/// the snapshot no older than the candidate's last modification (within
/// tolerance). External failures become local state plus audit entries,
/// not errors.
pub async fn publish_draft(
    pool: &PgPool,
    config: &dyn ConfigProvider,
    items: &dyn ItemClient,
    candidate_id: DbId,
    actor: &str,
) -> Result<PublishOutcome, PipelineError> {
    ensure_not_paused(config).await?;

    let candidate = CandidateRepo::find_by_id(pool, candidate_id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "candidate",
            id: candidate_id,
        })?;
    let state = CandidateState::parse(&candidate.state)?;

    if !matches!(
        state,
        CandidateState::DraftReady | CandidateState::EbayDraftFailed | CandidateState::EbayDraftCreated
    ) {
        return Err(CoreError::Conflict(format!(
            "Candidate {candidate_id} is not publishable in state {}",
            state.as_str()
        ))
        .into());
    }

    let pricing = PricingRepo::find_by_candidate(pool, candidate_id)
        .await?
        .ok_or_else(|| {
            CoreError::Conflict(format!("Candidate {candidate_id} has no pricing result"))
        })?;
    if !(pricing.profit_ok && pricing.cash_ok) {
        return Err(CoreError::Conflict(format!(
            "Candidate {candidate_id} has not passed both gates"
        ))
        .into());
    }

    // Freshness: a price superseded by a later candidate edit must be
    // recomputed (and re-gated) before it may be published.
    if pricing.created_at + freshness_tolerance() < candidate.updated_at {
        return Err(CoreError::Conflict(format!(
            "Pricing for candidate {candidate_id} is stale (priced {}, modified {})",
            pricing.created_at, candidate.updated_at
        ))
        .into());
    }

    let sku = candidate_sku(candidate_id);
    let draft =
        DraftRepo::upsert_for_candidate(pool, candidate_id, &sku, pricing.sell_price_usd, draft_states::PENDING)
            .await?;

    // Idempotent short-circuit: both ends already terminal-success.
    if draft.state == draft_states::CREATED && state == CandidateState::EbayDraftCreated {
        tracing::debug!(candidate_id, sku = %draft.sku, "Draft already published");
        return Ok(PublishOutcome::AlreadyPublished { draft });
    }

    let cfg = config::pricing_config(config).await?;
    let weight_kg = candidate.weight_kg.unwrap_or(cfg.default_weight_kg);
    let item = InventoryItem {
        title: candidate.memo.clone().unwrap_or_else(|| sku.clone()),
        description: candidate.source_url.clone(),
        weight_kg,
    };

    // (a) Upsert the inventory item for the SKU.
    if let Err(e) = items.put_inventory_item(&sku, &item).await {
        return record_failure(pool, items, &candidate, state, &draft, &e, actor).await;
    }

    // (b) Create the offer only when none is recorded yet. The id is
    // persisted immediately so a later crash cannot lose it.
    let draft = if draft.ebay_offer_id.is_none() {
        match items
            .create_offer(
                &sku,
                &OfferRequest {
                    price_usd: pricing.sell_price_usd,
                    category_id: DEFAULT_CATEGORY_ID.to_string(),
                    listing_description: candidate.source_url.clone(),
                },
            )
            .await
        {
            Ok(offer_id) => {
                DraftRepo::set_offer_id(pool, draft.id, &offer_id).await?;
                DraftRepo::find_by_candidate(pool, candidate_id)
                    .await?
                    .ok_or(CoreError::NotFound {
                        entity: "draft",
                        id: draft.id,
                    })?
            }
            Err(e) => {
                return record_failure(pool, items, &candidate, state, &draft, &e, actor).await;
            }
        }
    } else {
        draft
    };

    record_success(pool, &candidate, state, &draft, &pricing, actor).await
}

/// Batch summary for a publish pass.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PublishBatchSummary {
    pub selected: usize,
    pub published: usize,
    pub failed: usize,
    pub skipped: usize,
}

/// Publish every `DRAFT_READY` candidate, most recently updated first,
/// bounded by the configured batch size. Candidates are processed
/// sequentially; a conflict (stale pricing, concurrent state change)
/// skips that candidate without aborting the pass.
pub async fn publish_batch(
    pool: &PgPool,
    config: &dyn ConfigProvider,
    items: &dyn ItemClient,
    actor: &str,
) -> Result<PublishBatchSummary, PipelineError> {
    ensure_not_paused(config).await?;

    let limit = config::publish_batch_size(config).await?;
    let candidates =
        CandidateRepo::list_in_state(pool, CandidateState::DraftReady.as_str(), limit).await?;

    let mut summary = PublishBatchSummary {
        selected: candidates.len(),
        ..Default::default()
    };

    for candidate in candidates {
        match publish_draft(pool, config, items, candidate.id, actor).await {
            Ok(PublishOutcome::Published { .. }) | Ok(PublishOutcome::AlreadyPublished { .. }) => {
                summary.published += 1;
            }
            Ok(PublishOutcome::Failed { error, .. }) => {
                summary.failed += 1;
                tracing::warn!(candidate_id = candidate.id, error = %error, "Publish failed");
            }
            Err(e) if e.is_conflict() => {
                summary.skipped += 1;
                tracing::warn!(candidate_id = candidate.id, error = %e, "Publish skipped");
            }
            Err(e) => return Err(e),
        }
    }

    Ok(summary)
}

// ---------------------------------------------------------------------------
// Success / failure recording
// ---------------------------------------------------------------------------

async fn record_success(
    pool: &PgPool,
    candidate: &Candidate,
    from_state: CandidateState,
    draft: &Draft,
    pricing: &PricingResult,
    actor: &str,
) -> Result<PublishOutcome, PipelineError> {
    let to_state = CandidateState::EbayDraftCreated;
    candidate_state::validate_transition(from_state, to_state)?;

    let correlation_id = Uuid::new_v4().to_string();
    let mut tx = pool.begin().await?;

    let updated_draft = DraftRepo::update_state(&mut *tx, draft.id, draft_states::CREATED, None)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "draft",
            id: draft.id,
        })?;
    let updated_candidate =
        CandidateRepo::update_state(&mut *tx, candidate.id, to_state.as_str(), None, None)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "candidate",
                id: candidate.id,
            })?;

    // The sourcing cost becomes an open commitment the moment the
    // listing exists; settled when the sale is ingested.
    let open = LedgerRepo::find_open_for_entity(&mut *tx, entity_types::CANDIDATE, candidate.id).await?;
    if open.is_none() {
        LedgerRepo::create(
            &mut *tx,
            &CreateLedgerEntry {
                entity_type: entity_types::CANDIDATE.to_string(),
                entity_id: candidate.id,
                amount: pricing.total_cost,
                memo: Some(format!("sourcing commitment for {}", draft.sku)),
            },
        )
        .await?;
    }

    audit::record(
        &mut tx,
        TransitionRecord {
            entity_type: entity_types::DRAFT,
            entity_id: draft.id,
            from_state: Some(&draft.state),
            to_state: draft_states::CREATED,
            reason_code: Some(reason_codes::PUBLISH_OK),
            reason_detail: None,
            actor,
            correlation_id: &correlation_id,
        },
    )
    .await?;
    audit::record(
        &mut tx,
        TransitionRecord {
            entity_type: entity_types::CANDIDATE,
            entity_id: candidate.id,
            from_state: Some(from_state.as_str()),
            to_state: to_state.as_str(),
            reason_code: Some(reason_codes::PUBLISH_OK),
            reason_detail: None,
            actor,
            correlation_id: &correlation_id,
        },
    )
    .await?;
    tx.commit().await?;

    tracing::info!(
        candidate_id = candidate.id,
        sku = %updated_draft.sku,
        offer_id = updated_draft.ebay_offer_id.as_deref().unwrap_or("-"),
        "Draft published",
    );

    Ok(PublishOutcome::Published {
        draft: updated_draft,
        candidate: updated_candidate,
    })
}

async fn record_failure(
    pool: &PgPool,
    items: &dyn ItemClient,
    candidate: &Candidate,
    from_state: CandidateState,
    draft: &Draft,
    error: &EbayError,
    actor: &str,
) -> Result<PublishOutcome, PipelineError> {
    // Compensation: an offer-layer failure with a recorded offer id may
    // mean the offer vanished externally. Clear the local id when the
    // marketplace confirms it is gone, so the next attempt recreates it.
    if error.is_offer_layer() {
        if let Some(offer_id) = draft.ebay_offer_id.as_deref() {
            match items.check_offer_exists(offer_id).await {
                Ok(false) => {
                    DraftRepo::clear_offer_id(pool, draft.id).await?;
                    tracing::warn!(
                        candidate_id = candidate.id,
                        offer_id,
                        "Dangling offer reference cleared",
                    );
                }
                Ok(true) => {}
                Err(check_err) => {
                    tracing::warn!(
                        candidate_id = candidate.id,
                        offer_id,
                        error = %check_err,
                        "Offer existence check failed; keeping recorded id",
                    );
                }
            }
        }
    }

    let to_state = CandidateState::EbayDraftFailed;
    candidate_state::validate_transition(from_state, to_state)?;

    let message = error.to_string();
    let correlation_id = Uuid::new_v4().to_string();
    let mut tx = pool.begin().await?;

    let updated_draft =
        DraftRepo::update_state(&mut *tx, draft.id, draft_states::FAILED, Some(&message))
            .await?
            .ok_or(CoreError::NotFound {
                entity: "draft",
                id: draft.id,
            })?;
    CandidateRepo::update_state(&mut *tx, candidate.id, to_state.as_str(), None, None)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "candidate",
            id: candidate.id,
        })?;

    audit::record(
        &mut tx,
        TransitionRecord {
            entity_type: entity_types::DRAFT,
            entity_id: draft.id,
            from_state: Some(&draft.state),
            to_state: draft_states::FAILED,
            reason_code: Some(reason_codes::PUBLISH_FAILED),
            reason_detail: Some(&message),
            actor,
            correlation_id: &correlation_id,
        },
    )
    .await?;
    audit::record(
        &mut tx,
        TransitionRecord {
            entity_type: entity_types::CANDIDATE,
            entity_id: candidate.id,
            from_state: Some(from_state.as_str()),
            to_state: to_state.as_str(),
            reason_code: Some(reason_codes::PUBLISH_FAILED),
            reason_detail: Some(&message),
            actor,
            correlation_id: &correlation_id,
        },
    )
    .await?;
    tx.commit().await?;

    tracing::warn!(
        candidate_id = candidate.id,
        sku = %draft.sku,
        error = %message,
        "Draft publish failed",
    );

    Ok(PublishOutcome::Failed {
        draft: updated_draft,
        error: message,
    })
}
