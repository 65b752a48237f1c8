//! Candidate lifecycle state machine.
//!
//! The entity holds only its current state; history lives exclusively in
//! the transition log. Self-transitions are always permitted no-ops.
//! Anything outside the table fails with a conflict and must not mutate
//! the entity.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// States
// ---------------------------------------------------------------------------

/// Lifecycle state of a sourced candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CandidateState {
    /// Initial state: costed but not yet gated.
    Candidate,
    /// Both gates passed; ready for listing.
    DraftReady,
    /// A gate failed; soft-terminal until re-priced.
    Rejected,
    /// Listing draft exists on eBay.
    EbayDraftCreated,
    /// Listing attempt failed; eligible for retry.
    EbayDraftFailed,
}

impl CandidateState {
    /// String representation for database storage.
    pub fn as_str(&self) -> &'static str {
        match self {
            CandidateState::Candidate => "CANDIDATE",
            CandidateState::DraftReady => "DRAFT_READY",
            CandidateState::Rejected => "REJECTED",
            CandidateState::EbayDraftCreated => "EBAY_DRAFT_CREATED",
            CandidateState::EbayDraftFailed => "EBAY_DRAFT_FAILED",
        }
    }

    /// Parse from a stored string.
    pub fn parse(s: &str) -> Result<Self, CoreError> {
        match s {
            "CANDIDATE" => Ok(CandidateState::Candidate),
            "DRAFT_READY" => Ok(CandidateState::DraftReady),
            "REJECTED" => Ok(CandidateState::Rejected),
            "EBAY_DRAFT_CREATED" => Ok(CandidateState::EbayDraftCreated),
            "EBAY_DRAFT_FAILED" => Ok(CandidateState::EbayDraftFailed),
            other => Err(CoreError::Validation(format!(
                "Unknown candidate state: '{other}'"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// Transition table
// ---------------------------------------------------------------------------

/// Returns the set of states reachable from `from` (excluding the
/// always-allowed self-transition).
pub fn valid_transitions(from: CandidateState) -> &'static [CandidateState] {
    use CandidateState::*;
    match from {
        Candidate => &[DraftReady, Rejected],
        DraftReady => &[EbayDraftCreated, EbayDraftFailed, Rejected, Candidate],
        Rejected => &[Candidate],
        EbayDraftFailed => &[DraftReady, EbayDraftCreated, Rejected, Candidate],
        EbayDraftCreated => &[EbayDraftFailed],
    }
}

/// Check whether `from -> to` is allowed. Self-transitions always are.
pub fn can_transition(from: CandidateState, to: CandidateState) -> bool {
    from == to || valid_transitions(from).contains(&to)
}

/// Validate a transition, returning a conflict for invalid ones.
pub fn validate_transition(from: CandidateState, to: CandidateState) -> Result<(), CoreError> {
    if can_transition(from, to) {
        Ok(())
    } else {
        Err(CoreError::Conflict(format!(
            "Invalid candidate transition: {} -> {}",
            from.as_str(),
            to.as_str()
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use CandidateState::*;

    // -----------------------------------------------------------------------
    // Valid transitions
    // -----------------------------------------------------------------------

    #[test]
    fn candidate_to_draft_ready() {
        assert!(can_transition(Candidate, DraftReady));
    }

    #[test]
    fn candidate_to_rejected() {
        assert!(can_transition(Candidate, Rejected));
    }

    #[test]
    fn draft_ready_to_created_failed_rejected_candidate() {
        assert!(can_transition(DraftReady, EbayDraftCreated));
        assert!(can_transition(DraftReady, EbayDraftFailed));
        assert!(can_transition(DraftReady, Rejected));
        assert!(can_transition(DraftReady, Candidate));
    }

    #[test]
    fn rejected_back_to_candidate() {
        assert!(can_transition(Rejected, Candidate));
    }

    #[test]
    fn failed_draft_can_retry_or_give_up() {
        assert!(can_transition(EbayDraftFailed, DraftReady));
        assert!(can_transition(EbayDraftFailed, EbayDraftCreated));
        assert!(can_transition(EbayDraftFailed, Rejected));
        assert!(can_transition(EbayDraftFailed, Candidate));
    }

    #[test]
    fn created_draft_can_only_fail() {
        assert!(can_transition(EbayDraftCreated, EbayDraftFailed));
    }

    // -----------------------------------------------------------------------
    // Self-transitions are permitted no-ops
    // -----------------------------------------------------------------------

    #[test]
    fn self_transitions_always_allowed() {
        for s in [Candidate, DraftReady, Rejected, EbayDraftCreated, EbayDraftFailed] {
            assert!(can_transition(s, s));
        }
    }

    // -----------------------------------------------------------------------
    // Invalid transitions
    // -----------------------------------------------------------------------

    #[test]
    fn created_to_rejected_invalid() {
        assert!(!can_transition(EbayDraftCreated, Rejected));
    }

    #[test]
    fn created_to_draft_ready_invalid() {
        assert!(!can_transition(EbayDraftCreated, DraftReady));
    }

    #[test]
    fn created_to_candidate_invalid() {
        assert!(!can_transition(EbayDraftCreated, Candidate));
    }

    #[test]
    fn candidate_to_created_invalid() {
        assert!(!can_transition(Candidate, EbayDraftCreated));
    }

    #[test]
    fn candidate_to_failed_invalid() {
        assert!(!can_transition(Candidate, EbayDraftFailed));
    }

    #[test]
    fn rejected_to_draft_ready_invalid() {
        assert!(!can_transition(Rejected, DraftReady));
    }

    #[test]
    fn every_pair_outside_table_is_rejected() {
        let all = [Candidate, DraftReady, Rejected, EbayDraftCreated, EbayDraftFailed];
        for from in all {
            for to in all {
                let allowed = from == to || valid_transitions(from).contains(&to);
                assert_eq!(can_transition(from, to), allowed);
                assert_eq!(validate_transition(from, to).is_ok(), allowed);
            }
        }
    }

    // -----------------------------------------------------------------------
    // validate_transition error shape
    // -----------------------------------------------------------------------

    #[test]
    fn validate_transition_reports_both_states() {
        let err = validate_transition(EbayDraftCreated, Rejected).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("EBAY_DRAFT_CREATED"));
        assert!(msg.contains("REJECTED"));
    }

    // -----------------------------------------------------------------------
    // Storage round-trip
    // -----------------------------------------------------------------------

    #[test]
    fn as_str_round_trips() {
        for s in [Candidate, DraftReady, Rejected, EbayDraftCreated, EbayDraftFailed] {
            assert_eq!(CandidateState::parse(s.as_str()).unwrap(), s);
        }
    }

    #[test]
    fn unknown_state_string_rejected() {
        assert!(CandidateState::parse("LISTED").is_err());
    }
}
