//! Order lifecycle state machine.
//!
//! Orders are created from sale notifications and move through shipping
//! and tracking reconciliation. `TrackingUploaded` and `TrackingFailed`
//! are terminal.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Lifecycle state of a marketplace order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderState {
    /// Sale recorded, not yet shipped.
    Created,
    /// Shipped internationally; tracking upload pending.
    ShippedIntl,
    /// Tracking accepted by the marketplace. Terminal.
    TrackingUploaded,
    /// Tracking upload retries exhausted. Terminal.
    TrackingFailed,
}

impl OrderState {
    /// String representation for database storage.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderState::Created => "CREATED",
            OrderState::ShippedIntl => "SHIPPED_INTL",
            OrderState::TrackingUploaded => "TRACKING_UPLOADED",
            OrderState::TrackingFailed => "TRACKING_FAILED",
        }
    }

    /// Parse from a stored string.
    pub fn parse(s: &str) -> Result<Self, CoreError> {
        match s {
            "CREATED" => Ok(OrderState::Created),
            "SHIPPED_INTL" => Ok(OrderState::ShippedIntl),
            "TRACKING_UPLOADED" => Ok(OrderState::TrackingUploaded),
            "TRACKING_FAILED" => Ok(OrderState::TrackingFailed),
            other => Err(CoreError::Validation(format!(
                "Unknown order state: '{other}'"
            ))),
        }
    }
}

/// Reachable states from `from` (excluding the self no-op).
pub fn valid_transitions(from: OrderState) -> &'static [OrderState] {
    use OrderState::*;
    match from {
        Created => &[ShippedIntl],
        ShippedIntl => &[TrackingUploaded, TrackingFailed],
        TrackingUploaded | TrackingFailed => &[],
    }
}

/// Check whether `from -> to` is allowed. Self-transitions always are.
pub fn can_transition(from: OrderState, to: OrderState) -> bool {
    from == to || valid_transitions(from).contains(&to)
}

/// Validate a transition, returning a conflict for invalid ones.
pub fn validate_transition(from: OrderState, to: OrderState) -> Result<(), CoreError> {
    if can_transition(from, to) {
        Ok(())
    } else {
        Err(CoreError::Conflict(format!(
            "Invalid order transition: {} -> {}",
            from.as_str(),
            to.as_str()
        )))
    }
}
