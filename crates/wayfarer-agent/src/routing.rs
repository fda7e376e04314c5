//! Routing predicates. Each is a pure function of the merged state.

use wayfarer_core::state::WorkflowState;

/// Below this score a plan goes to the traveller for approval.
pub const CONFIDENCE_THRESHOLD: f64 = 0.7;

pub const CONTINUE: &str = "continue";
pub const ASK_HUMAN: &str = "ask_human";
pub const APPROVED: &str = "approved";
pub const REJECTED: &str = "rejected";
pub const RETRY: &str = "retry";
pub const FAIL: &str = "fail";

/// Planner never branches today; the seam stays so a gate can be added
/// without touching the topology.
pub fn after_planner(_state: &WorkflowState) -> &'static str {
    CONTINUE
}

/// Low confidence asks the traveller, unless they already accepted this draft.
pub fn after_confidence(state: &WorkflowState) -> &'static str {
    if state.is_approved {
        CONTINUE
    } else if state.confidence_score < CONFIDENCE_THRESHOLD {
        ASK_HUMAN
    } else {
        CONTINUE
    }
}

pub fn after_ask_human(state: &WorkflowState) -> &'static str {
    if state.is_approved {
        APPROVED
    } else if state.retries_exhausted() {
        FAIL
    } else {
        REJECTED
    }
}

/// Approval wins over an exhausted retry count.
pub fn after_critic(state: &WorkflowState) -> &'static str {
    if state.is_approved {
        APPROVED
    } else if state.retries_exhausted() {
        FAIL
    } else {
        RETRY
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use wayfarer_core::state::MAX_RETRIES;

    fn state(approved: bool, retries: u32, confidence: f64) -> WorkflowState {
        WorkflowState {
            is_approved: approved,
            retry_count: retries,
            confidence_score: confidence,
            ..WorkflowState::default()
        }
    }

    #[test]
    fn test_after_planner_always_continues() {
        assert_eq!(after_planner(&state(false, 3, 0.0)), CONTINUE);
    }

    #[test]
    fn test_after_confidence_threshold() {
        assert_eq!(after_confidence(&state(false, 0, 0.0)), ASK_HUMAN);
        assert_eq!(after_confidence(&state(false, 0, 0.69)), ASK_HUMAN);
        assert_eq!(after_confidence(&state(false, 0, 0.7)), CONTINUE);
        assert_eq!(after_confidence(&state(false, 0, 0.8)), CONTINUE);
        // Accepted by the traveller: do not ask twice.
        assert_eq!(after_confidence(&state(true, 0, 0.4)), CONTINUE);
    }

    #[test]
    fn test_after_ask_human() {
        assert_eq!(after_ask_human(&state(true, 0, 0.4)), APPROVED);
        assert_eq!(after_ask_human(&state(true, MAX_RETRIES, 0.4)), APPROVED);
        assert_eq!(after_ask_human(&state(false, 1, 0.4)), REJECTED);
        assert_eq!(after_ask_human(&state(false, MAX_RETRIES, 0.4)), FAIL);
    }

    #[test]
    fn test_after_critic_table() {
        assert_eq!(after_critic(&state(false, 0, 0.9)), RETRY);
        assert_eq!(after_critic(&state(false, 2, 0.9)), RETRY);
        assert_eq!(after_critic(&state(false, 3, 0.9)), FAIL);
        assert_eq!(after_critic(&state(true, 3, 0.9)), APPROVED);
        assert_eq!(after_critic(&state(true, 7, 0.9)), APPROVED);
    }

    proptest! {
        #[test]
        fn prop_after_critic_fail_iff_exhausted_and_rejected(approved in any::<bool>(), retries in 0u32..10) {
            let label = after_critic(&state(approved, retries, 0.5));
            prop_assert_eq!(label == FAIL, retries >= MAX_RETRIES && !approved);
            prop_assert_eq!(label == APPROVED, approved);
        }

        #[test]
        fn prop_no_replanning_at_bound(approved in any::<bool>(), confidence in 0.0f64..=1.0) {
            let s = state(approved, MAX_RETRIES, confidence);
            prop_assert_ne!(after_critic(&s), RETRY);
            prop_assert_ne!(after_ask_human(&s), REJECTED);
        }
    }
}
