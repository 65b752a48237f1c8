//! Deterministic SKU derivation.
//!
//! The SKU is the idempotency key for external publishing: the same
//! candidate always yields the same SKU, so a retried publish can never
//! create a second listing.

use crate::types::DbId;

/// Derive the marketplace SKU for a candidate.
pub fn candidate_sku(candidate_id: DbId) -> String {
    format!("CAND-{candidate_id:08}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sku_is_zero_padded() {
        assert_eq!(candidate_sku(42), "CAND-00000042");
    }

    #[test]
    fn sku_is_deterministic() {
        assert_eq!(candidate_sku(7), candidate_sku(7));
    }

    #[test]
    fn wide_ids_keep_full_digits() {
        assert_eq!(candidate_sku(123456789), "CAND-123456789");
    }
}
