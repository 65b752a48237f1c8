//! Pricing orchestration: compute, gate, persist, transition, audit —
//! one transaction for everything that mutates state.

use chrono::Utc;
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use flipline_core::audit::{entity_types, reason_codes};
use flipline_core::candidate_state::{self, CandidateState};
use flipline_core::cash_gate::{self, CashVerdict};
use flipline_core::error::CoreError;
use flipline_core::pricing::{self, PricingBreakdown, PricingInput};
use flipline_core::rules::{PricingRule, RuleCondition, RuleTarget};
use flipline_core::shipping::SizeTier;
use flipline_core::types::DbId;
use flipline_db::models::candidate::Candidate;
use flipline_db::models::pricing::{PricingResult, UpsertPricingResult};
use flipline_db::repositories::{CandidateRepo, PricingRepo};

use crate::audit::{self, TransitionRecord};
use crate::config::{self, ensure_not_paused, ConfigProvider};
use crate::error::PipelineError;
use crate::fx::FxProvider;
use crate::ledger::LedgerProvider;

// ---------------------------------------------------------------------------
// Outcome
// ---------------------------------------------------------------------------

/// Change relative to the candidate's previous pricing snapshot.
#[derive(Debug, Clone, Serialize)]
pub struct PricingDelta {
    pub previous_sell_usd: Decimal,
    pub sell_delta_usd: Decimal,
    pub previous_profit: Decimal,
    pub profit_delta: Decimal,
}

/// Result of one pricing run.
#[derive(Debug, Clone, Serialize)]
pub struct PricingOutcome {
    pub candidate: Candidate,
    pub breakdown: PricingBreakdown,
    pub cash: CashVerdict,
    pub result: PricingResult,
    pub new_state: CandidateState,
    pub reason_code: &'static str,
    /// Present when the candidate had a prior snapshot.
    pub delta: Option<PricingDelta>,
}

/// Reason code for a gate outcome.
fn gate_reason(profit_ok: bool, cash_ok: bool) -> &'static str {
    match (profit_ok, cash_ok) {
        (true, true) => reason_codes::GATES_PASSED,
        (false, true) => reason_codes::GATE_PROFIT,
        (true, false) => reason_codes::GATE_CASH,
        (false, false) => reason_codes::GATE_BOTH,
    }
}

/// Map rule rows into core rules, rejecting rows with unknown fields.
fn map_rules(rows: &[flipline_db::models::pricing::PricingRuleRow]) -> Result<Vec<PricingRule>, PipelineError> {
    rows.iter()
        .map(|row| {
            Ok(PricingRule {
                id: row.id,
                condition: RuleCondition::parse(&row.condition_type)?,
                min_value: row.min_value,
                max_value: row.max_value,
                target: RuleTarget::parse(&row.target_field)?,
                override_value: row.override_value,
                priority: row.priority,
            })
        })
        .collect::<Result<Vec<_>, CoreError>>()
        .map_err(PipelineError::from)
}

// ---------------------------------------------------------------------------
// Operation
// ---------------------------------------------------------------------------

/// Price a candidate and advance its state through the gates.
///
/// Recomputes the full breakdown, evaluates both gates, replaces the
/// pricing snapshot, transitions the candidate, and appends the audit
/// entry — all state writes in one transaction. A failed gate is a
/// normal outcome; the candidate moves to `REJECTED` with the gate
/// reason, never an error.
pub async fn price_candidate(
    pool: &PgPool,
    config: &dyn ConfigProvider,
    fx: &dyn FxProvider,
    ledger: &dyn LedgerProvider,
    candidate_id: DbId,
    target_sell_usd: Option<Decimal>,
    actor: &str,
) -> Result<PricingOutcome, PipelineError> {
    ensure_not_paused(config).await?;

    let candidate = CandidateRepo::find_by_id(pool, candidate_id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "candidate",
            id: candidate_id,
        })?;
    let from_state = CandidateState::parse(&candidate.state)?;

    let cfg = config::pricing_config(config).await?;
    let fx_rate = fx.current_rate().await?;
    let rule_rows = PricingRepo::list_rules(pool).await?;
    let rules = map_rules(&rule_rows)?;

    let size_tier = match &candidate.size_tier {
        Some(raw) => Some(SizeTier::parse(raw)?),
        None => None,
    };
    let input = PricingInput {
        source_price: candidate.source_price,
        weight_kg: candidate.weight_kg,
        size_tier,
        fx_rate: fx_rate.rate,
        target_sell_usd,
    };
    let breakdown = pricing::compute(&input, &cfg, &rules)?;

    let snapshot = config::cash_snapshot(config).await?;
    let open_commitments = ledger.open_commitments().await?;
    let cash = cash_gate::evaluate(&snapshot, open_commitments, breakdown.total_cost)?;

    let new_state = if breakdown.profit_ok && cash.ok {
        CandidateState::DraftReady
    } else {
        CandidateState::Rejected
    };
    let reason_code = gate_reason(breakdown.profit_ok, cash.ok);

    // Invalid from-states (a published listing, say) fail before any write.
    candidate_state::validate_transition(from_state, new_state)?;

    let reason_detail = if new_state == CandidateState::Rejected {
        Some(format!(
            "profit={} (ok={}), working_capital_available={} (ok={})",
            breakdown.profit_amount, breakdown.profit_ok, cash.working_capital_available, cash.ok,
        ))
    } else {
        None
    };

    // Capture the prior snapshot before the upsert replaces it.
    let previous = PricingRepo::find_by_candidate(pool, candidate_id).await?;
    let delta = previous.map(|prev| PricingDelta {
        previous_sell_usd: prev.sell_price_usd,
        sell_delta_usd: breakdown.sell_price_usd - prev.sell_price_usd,
        previous_profit: prev.profit_amount,
        profit_delta: breakdown.profit_amount - prev.profit_amount,
    });

    let correlation_id = Uuid::new_v4().to_string();
    let now = Utc::now();

    let mut tx = pool.begin().await?;
    let result = PricingRepo::upsert_result(
        &mut *tx,
        &UpsertPricingResult {
            candidate_id,
            fx_rate: breakdown.fx_rate,
            buffered_fx_rate: breakdown.buffered_fx_rate,
            sell_price_usd: breakdown.sell_price_usd,
            sell_price_jpy: breakdown.sell_price_jpy,
            total_cost: breakdown.total_cost,
            fee_amount: breakdown.fee_amount,
            reserve_amount: breakdown.reserve_amount,
            profit_amount: breakdown.profit_amount,
            profit_rate: breakdown.profit_rate,
            profit_ok: breakdown.profit_ok,
            cash_ok: cash.ok,
        },
    )
    .await?;

    let (reject_code, reject_detail) = if new_state == CandidateState::Rejected {
        (Some(reason_code), reason_detail.as_deref())
    } else {
        (None, None)
    };
    let updated = CandidateRepo::update_state(
        &mut *tx,
        candidate_id,
        new_state.as_str(),
        reject_code,
        reject_detail,
    )
    .await?
    .ok_or(CoreError::NotFound {
        entity: "candidate",
        id: candidate_id,
    })?;
    CandidateRepo::touch_priced(&mut *tx, candidate_id, now).await?;

    audit::record(
        &mut tx,
        TransitionRecord {
            entity_type: entity_types::CANDIDATE,
            entity_id: candidate_id,
            from_state: Some(from_state.as_str()),
            to_state: new_state.as_str(),
            reason_code: Some(reason_code),
            reason_detail: reason_detail.as_deref(),
            actor,
            correlation_id: &correlation_id,
        },
    )
    .await?;
    tx.commit().await?;

    if breakdown.below_recommendation {
        tracing::warn!(
            candidate_id,
            target = %breakdown.sell_price_usd,
            recommended = %breakdown.recommended_sell_usd,
            "Target sell price below recommendation",
        );
    }
    tracing::info!(
        candidate_id,
        state = new_state.as_str(),
        reason = reason_code,
        profit = %breakdown.profit_amount,
        "Candidate priced",
    );

    Ok(PricingOutcome {
        candidate: updated,
        breakdown,
        cash,
        result,
        new_state,
        reason_code,
        delta,
    })
}
