//! Tracking reconciliation pass.
//!
//! Selects shipped orders whose next-retry time has elapsed and pushes
//! their tracking to the marketplace, bounded by the configured batch
//! size. Retry state is durable on the order row; the pass only decides
//! terminal / attempt / wait. An ambiguous (retryable) upload failure is
//! disambiguated with the idempotent tracking-uploaded check before it
//! consumes an attempt.

use chrono::Utc;
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use flipline_core::audit::{entity_types, reason_codes};
use flipline_core::error::CoreError;
use flipline_core::order_state::OrderState;
use flipline_core::retry::{self, RetryDecision};
use flipline_db::models::order::Order;
use flipline_db::repositories::{FulfillmentRepo, OrderRepo};
use flipline_ebay::OrderClient;

use crate::audit::{self, TransitionRecord};
use crate::config::{self, ensure_not_paused, ConfigProvider};
use crate::error::PipelineError;

/// Counters for one reconciliation pass.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TrackingPassSummary {
    pub selected: usize,
    pub uploaded: usize,
    /// Successes discovered via the tracking-uploaded check after an
    /// ambiguous failure. Kept separate so operators can see them.
    pub recovered: usize,
    pub failed_attempts: usize,
    pub terminal: usize,
    pub skipped_no_fulfillment: usize,
}

/// Run one reconciliation pass over due orders.
pub async fn run_tracking_pass(
    pool: &PgPool,
    config: &dyn ConfigProvider,
    client: &dyn OrderClient,
    actor: &str,
) -> Result<TrackingPassSummary, PipelineError> {
    ensure_not_paused(config).await?;

    let policy = config::retry_policy(config).await?;
    let batch_size = config::tracking_batch_size(config).await?;
    let now = Utc::now();
    let cutoff = now - policy.retry_interval;

    let due = OrderRepo::list_due_for_tracking(
        pool,
        OrderState::ShippedIntl.as_str(),
        cutoff,
        batch_size,
    )
    .await?;

    let mut summary = TrackingPassSummary {
        selected: due.len(),
        ..Default::default()
    };

    for order in due {
        match retry::decide(&policy, order.tracking_attempts, order.tracking_started_at, now) {
            RetryDecision::Terminal => {
                let detail = format!(
                    "retry budget exhausted: attempts={}, started_at={}, last_error={}",
                    order.tracking_attempts,
                    order
                        .tracking_started_at
                        .map(|t| t.to_rfc3339())
                        .unwrap_or_else(|| "-".into()),
                    order.tracking_last_error.as_deref().unwrap_or("-"),
                );
                mark_terminal(pool, &order, reason_codes::TRACKING_EXHAUSTED, &detail, actor).await?;
                summary.terminal += 1;
            }
            RetryDecision::Attempt => {
                let Some(fulfillment) = FulfillmentRepo::find_by_order(pool, order.id).await? else {
                    tracing::warn!(order_id = order.id, "No fulfillment recorded; skipping");
                    summary.skipped_no_fulfillment += 1;
                    continue;
                };

                match client
                    .upload_tracking(
                        &order.ebay_order_key,
                        &fulfillment.carrier,
                        &fulfillment.tracking_number,
                    )
                    .await
                {
                    Ok(()) => {
                        complete(pool, &order, reason_codes::TRACKING_UPLOADED, None, actor).await?;
                        summary.uploaded += 1;
                    }
                    Err(e) if e.is_retryable() => {
                        // The upload may have landed despite the error
                        // (timeout after commit). Verify before burning
                        // an attempt.
                        let recovered = client
                            .check_tracking_uploaded(&order.ebay_order_key)
                            .await
                            .unwrap_or(false);
                        if recovered {
                            complete(
                                pool,
                                &order,
                                reason_codes::TRACKING_RECOVERED,
                                Some(&format!("upload error recovered: {e}")),
                                actor,
                            )
                            .await?;
                            summary.recovered += 1;
                        } else {
                            let updated =
                                OrderRepo::record_attempt(pool, order.id, now, &e.to_string())
                                    .await?;
                            summary.failed_attempts += 1;
                            tracing::warn!(
                                order_id = order.id,
                                attempts = updated.map(|o| o.tracking_attempts).unwrap_or_default(),
                                error = %e,
                                "Tracking upload failed; will retry",
                            );
                        }
                    }
                    Err(e) => {
                        // Non-retryable failures are terminal immediately.
                        let detail = format!(
                            "non-retryable upload error after {} attempts: {e}",
                            order.tracking_attempts
                        );
                        mark_terminal(pool, &order, reason_codes::TRACKING_REJECTED, &detail, actor)
                            .await?;
                        summary.terminal += 1;
                    }
                }
            }
        }
    }

    tracing::info!(
        selected = summary.selected,
        uploaded = summary.uploaded,
        recovered = summary.recovered,
        failed = summary.failed_attempts,
        terminal = summary.terminal,
        "Tracking pass complete",
    );

    Ok(summary)
}

async fn complete(
    pool: &PgPool,
    order: &Order,
    reason_code: &'static str,
    reason_detail: Option<&str>,
    actor: &str,
) -> Result<(), PipelineError> {
    let to = OrderState::TrackingUploaded;
    let correlation_id = Uuid::new_v4().to_string();

    let mut tx = pool.begin().await?;
    OrderRepo::update_state(&mut *tx, order.id, to.as_str())
        .await?
        .ok_or(CoreError::NotFound {
            entity: "order",
            id: order.id,
        })?;
    audit::record(
        &mut tx,
        TransitionRecord {
            entity_type: entity_types::ORDER,
            entity_id: order.id,
            from_state: Some(&order.state),
            to_state: to.as_str(),
            reason_code: Some(reason_code),
            reason_detail,
            actor,
            correlation_id: &correlation_id,
        },
    )
    .await?;
    tx.commit().await?;

    tracing::info!(order_id = order.id, reason = reason_code, "Tracking uploaded");
    Ok(())
}

async fn mark_terminal(
    pool: &PgPool,
    order: &Order,
    reason_code: &'static str,
    detail: &str,
    actor: &str,
) -> Result<(), PipelineError> {
    let to = OrderState::TrackingFailed;
    let correlation_id = Uuid::new_v4().to_string();
    let now = Utc::now();

    let mut tx = pool.begin().await?;
    OrderRepo::mark_terminal(&mut *tx, order.id, to.as_str(), now)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "order",
            id: order.id,
        })?;
    audit::record(
        &mut tx,
        TransitionRecord {
            entity_type: entity_types::ORDER,
            entity_id: order.id,
            from_state: Some(&order.state),
            to_state: to.as_str(),
            reason_code: Some(reason_code),
            reason_detail: Some(detail),
            actor,
            correlation_id: &correlation_id,
        },
    )
    .await?;
    tx.commit().await?;

    tracing::warn!(order_id = order.id, detail, "Tracking terminally failed");
    Ok(())
}
