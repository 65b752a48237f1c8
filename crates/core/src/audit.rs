//! Transition-log constants and integrity hashing.
//!
//! Every entity state change is appended to the `state_transitions`
//! table and never updated or deleted; the log is the sole source of
//! historical truth. Entries are chained with a SHA-256 integrity hash
//! so tampering is detectable.

use crate::hashing;

// ---------------------------------------------------------------------------
// Entity type constants
// ---------------------------------------------------------------------------

/// Known entity types for transition log entries.
pub mod entity_types {
    pub const CANDIDATE: &str = "candidate";
    pub const DRAFT: &str = "draft";
    pub const ORDER: &str = "order";
}

// ---------------------------------------------------------------------------
// Reason code constants
// ---------------------------------------------------------------------------

/// Known reason codes for transition log entries.
pub mod reason_codes {
    /// Candidate created on intake.
    pub const INTAKE: &str = "INTAKE";
    /// Both gates passed after pricing.
    pub const GATES_PASSED: &str = "GATES_PASSED";
    /// Profit gate failed.
    pub const GATE_PROFIT: &str = "GATE_PROFIT";
    /// Cash gate failed.
    pub const GATE_CASH: &str = "GATE_CASH";
    /// Both gates failed.
    pub const GATE_BOTH: &str = "GATE_BOTH";
    /// External listing created.
    pub const PUBLISH_OK: &str = "PUBLISH_OK";
    /// External listing attempt failed.
    pub const PUBLISH_FAILED: &str = "PUBLISH_FAILED";
    /// Order created from a sale notification.
    pub const SALE: &str = "SALE";
    /// Order shipped internationally.
    pub const SHIPPED: &str = "SHIPPED";
    /// Tracking accepted by the marketplace.
    pub const TRACKING_UPLOADED: &str = "TRACKING_UPLOADED";
    /// Tracking confirmed present after an ambiguous upload failure.
    pub const TRACKING_RECOVERED: &str = "TRACKING_RECOVERED";
    /// Tracking retry budget exhausted.
    pub const TRACKING_EXHAUSTED: &str = "TRACKING_EXHAUSTED";
    /// Tracking upload failed with a non-retryable error.
    pub const TRACKING_REJECTED: &str = "TRACKING_REJECTED";
    /// Operator-driven change.
    pub const MANUAL: &str = "MANUAL";
}

// ---------------------------------------------------------------------------
// Integrity hash computation
// ---------------------------------------------------------------------------

/// Known seed value for the first entry in the hash chain.
const CHAIN_SEED: &str = "TRANSITION_LOG_CHAIN_SEED_V1";

/// Compute the SHA-256 integrity hash for a transition log entry.
///
/// `prev_hash` is the integrity hash of the previous entry, or `None`
/// for the first entry in the chain (which uses a known seed value).
/// `entry_data` is a canonical string representation of the entry's
/// content.
pub fn compute_integrity_hash(prev_hash: Option<&str>, entry_data: &str) -> String {
    let prev = prev_hash.unwrap_or(CHAIN_SEED);
    let combined = format!("{prev}|{entry_data}");
    hashing::sha256_hex(combined.as_bytes())
}

/// Canonical string representation of a transition for hashing.
pub fn canonical_entry(
    entity_type: &str,
    entity_id: i64,
    from_state: Option<&str>,
    to_state: &str,
    reason_code: Option<&str>,
    actor: &str,
    correlation_id: &str,
) -> String {
    format!(
        "{entity_type}:{entity_id}:{}:{to_state}:{}:{actor}:{correlation_id}",
        from_state.unwrap_or(""),
        reason_code.unwrap_or(""),
    )
}
