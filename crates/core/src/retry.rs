//! Bounded-retry policy for tracking reconciliation.
//!
//! Retry state (attempt count, start time) lives on the order row so it
//! survives restarts; this module only decides what the next pass should
//! do with it.

use chrono::Duration;
use serde::Serialize;

use crate::types::Timestamp;

/// Limits for the tracking retry loop, resolved from config.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Attempts after which the order is declared terminally failed.
    pub max_attempts: i32,
    /// Age since the first attempt after which the order is declared
    /// terminally failed regardless of attempt count.
    pub max_age: Duration,
    /// Minimum spacing between attempts.
    pub retry_interval: Duration,
}

/// What the reconciliation pass should do with an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RetryDecision {
    /// Budget exhausted: mark terminal failure, never select again.
    Terminal,
    /// Budget remains: attempt the upload.
    Attempt,
}

/// Decide whether an order still has retry budget.
///
/// `started_at` is the time of the first attempt (`None` before any
/// attempt has been made).
pub fn decide(
    policy: &RetryPolicy,
    attempt_count: i32,
    started_at: Option<Timestamp>,
    now: Timestamp,
) -> RetryDecision {
    if attempt_count >= policy.max_attempts {
        return RetryDecision::Terminal;
    }
    if let Some(started) = started_at {
        if now - started >= policy.max_age {
            return RetryDecision::Terminal;
        }
    }
    RetryDecision::Attempt
}

/// Whether an order is due for another attempt.
///
/// Due when it has never been attempted, or when the last attempt is at
/// least one retry interval old.
pub fn is_due(policy: &RetryPolicy, last_attempt_at: Option<Timestamp>, now: Timestamp) -> bool {
    match last_attempt_at {
        None => true,
        Some(last) => now - last >= policy.retry_interval,
    }
}
