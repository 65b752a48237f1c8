//! Order lifecycle: sale ingestion, fulfillment, shipping.

use chrono::Utc;
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use flipline_core::audit::{entity_types, reason_codes};
use flipline_core::error::CoreError;
use flipline_core::order_state::{self, OrderState};
use flipline_core::types::DbId;
use flipline_db::models::order::{CreateFulfillment, CreateOrder, Fulfillment, Order};
use flipline_db::repositories::{FulfillmentRepo, LedgerRepo, OrderRepo};

use crate::audit::{self, TransitionRecord};
use crate::config::{ensure_not_paused, ConfigProvider};
use crate::error::PipelineError;

/// Create an order from a sale notification.
///
/// Idempotent on the marketplace order key: a repeated notification
/// returns the existing order unchanged. The order insert, the
/// settlement of the candidate's open sourcing commitment, and the
/// audit entry commit together.
pub async fn ingest_sale(
    pool: &PgPool,
    config: &dyn ConfigProvider,
    dto: &CreateOrder,
    actor: &str,
) -> Result<Order, PipelineError> {
    ensure_not_paused(config).await?;

    if dto.ebay_order_key.trim().is_empty() {
        return Err(CoreError::Validation("ebay_order_key must not be empty".into()).into());
    }
    if dto.sale_price_usd <= Decimal::ZERO {
        return Err(CoreError::Validation(format!(
            "sale_price_usd must be positive, got {}",
            dto.sale_price_usd
        ))
        .into());
    }

    if let Some(existing) = OrderRepo::find_by_key(pool, &dto.ebay_order_key).await? {
        tracing::debug!(order_id = existing.id, key = %existing.ebay_order_key, "Sale already ingested");
        return Ok(existing);
    }

    let correlation_id = Uuid::new_v4().to_string();
    let now = Utc::now();
    let initial = OrderState::Created;

    let mut tx = pool.begin().await?;
    let order = OrderRepo::create(&mut *tx, dto, initial.as_str()).await?;

    // The sale actualizes the candidate's sourcing commitment.
    if let Some(candidate_id) = dto.candidate_id {
        let settled =
            LedgerRepo::settle_open_for_entity(&mut *tx, entity_types::CANDIDATE, candidate_id, now)
                .await?;
        if let Some(entry) = settled {
            tracing::debug!(candidate_id, amount = %entry.amount, "Sourcing commitment settled");
        }
    }

    audit::record(
        &mut tx,
        TransitionRecord {
            entity_type: entity_types::ORDER,
            entity_id: order.id,
            from_state: None,
            to_state: initial.as_str(),
            reason_code: Some(reason_codes::SALE),
            reason_detail: None,
            actor,
            correlation_id: &correlation_id,
        },
    )
    .await?;
    tx.commit().await?;

    tracing::info!(
        order_id = order.id,
        key = %order.ebay_order_key,
        sale_price = %order.sale_price_usd,
        "Order ingested",
    );

    Ok(order)
}

/// Record the outbound shipment for an order. Required before the order
/// can be marked shipped or tracking can be uploaded.
pub async fn record_fulfillment(
    pool: &PgPool,
    config: &dyn ConfigProvider,
    dto: &CreateFulfillment,
    _actor: &str,
) -> Result<Fulfillment, PipelineError> {
    ensure_not_paused(config).await?;

    if dto.carrier.trim().is_empty() || dto.tracking_number.trim().is_empty() {
        return Err(
            CoreError::Validation("carrier and tracking_number must not be empty".into()).into(),
        );
    }
    OrderRepo::find_by_id(pool, dto.order_id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "order",
            id: dto.order_id,
        })?;
    if FulfillmentRepo::find_by_order(pool, dto.order_id).await?.is_some() {
        return Err(CoreError::Conflict(format!(
            "Order {} already has a fulfillment",
            dto.order_id
        ))
        .into());
    }

    let fulfillment = FulfillmentRepo::create(pool, dto).await?;
    tracing::info!(
        order_id = fulfillment.order_id,
        carrier = %fulfillment.carrier,
        "Fulfillment recorded",
    );
    Ok(fulfillment)
}

/// Move an order into the internationally-shipped state, making it
/// eligible for tracking reconciliation. Requires a recorded
/// fulfillment.
pub async fn mark_shipped(
    pool: &PgPool,
    config: &dyn ConfigProvider,
    order_id: DbId,
    actor: &str,
) -> Result<Order, PipelineError> {
    ensure_not_paused(config).await?;

    let order = OrderRepo::find_by_id(pool, order_id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "order",
            id: order_id,
        })?;
    let from = OrderState::parse(&order.state)?;
    let to = OrderState::ShippedIntl;
    order_state::validate_transition(from, to)?;

    if FulfillmentRepo::find_by_order(pool, order_id).await?.is_none() {
        return Err(CoreError::Conflict(format!(
            "Order {order_id} has no fulfillment recorded"
        ))
        .into());
    }

    let correlation_id = Uuid::new_v4().to_string();
    let mut tx = pool.begin().await?;
    let updated = OrderRepo::update_state(&mut *tx, order_id, to.as_str())
        .await?
        .ok_or(CoreError::NotFound {
            entity: "order",
            id: order_id,
        })?;
    audit::record(
        &mut tx,
        TransitionRecord {
            entity_type: entity_types::ORDER,
            entity_id: order_id,
            from_state: Some(from.as_str()),
            to_state: to.as_str(),
            reason_code: Some(reason_codes::SHIPPED),
            reason_detail: None,
            actor,
            correlation_id: &correlation_id,
        },
    )
    .await?;
    tx.commit().await?;

    tracing::info!(order_id, "Order marked shipped");
    Ok(updated)
}
