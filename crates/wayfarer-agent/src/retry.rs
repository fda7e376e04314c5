use wayfarer_core::event::WorkflowEvent;
use wayfarer_core::state::{StateUpdate, WorkflowState};
use wayfarer_core::trip::place_names;

use crate::graph::NodeContext;

/// Update applied when a critic or the traveller rejects the current plan.
///
/// Increments `retry_count`, bans every place of the rejected itinerary and
/// carries the reason, unmodified, to the next planner run.
pub fn rejection_update(state: &WorkflowState, feedback: &str) -> StateUpdate {
    StateUpdate::new()
        .with_approval(false)
        .with_retry_count(state.retry_count + 1)
        .with_banned_places(place_names(&state.itinerary))
        .with_feedback(Some(feedback.to_string()))
}

/// [`rejection_update`] plus the `RetryScheduled` event.
pub fn reject(ctx: &NodeContext, state: &WorkflowState, feedback: &str) -> StateUpdate {
    let update = rejection_update(state, feedback);
    let banned = state
        .banned_places
        .union(&place_names(&state.itinerary))
        .count();
    ctx.publish(WorkflowEvent::RetryScheduled {
        retry_count: state.retry_count + 1,
        banned,
        feedback: feedback.to_string(),
    });
    ctx.thought(format!(
        "Plan rejected (attempt {}): {}",
        state.retry_count + 1,
        feedback
    ));
    update
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    use proptest::prelude::*;
    use wayfarer_core::trip::{DayPlan, Place};

    use crate::graph::merge;

    fn itinerary(names: &[String]) -> Vec<DayPlan> {
        vec![DayPlan {
            day_number: 1,
            focus: "x".into(),
            places: names.iter().map(|n| Place::unverified(n.as_str(), "")).collect(),
        }]
    }

    #[test]
    fn test_rejection_update_fields() {
        let mut state = WorkflowState::new();
        state.retry_count = 1;
        state.is_approved = true;
        state.itinerary = itinerary(&["Colosseo".to_string(), "Pantheon".to_string()]);
        let update = rejection_update(&state, "Too much walking");
        assert_eq!(update.retry_count, Some(2));
        assert_eq!(update.is_approved, Some(false));
        assert_eq!(update.critic_feedback, Some(Some("Too much walking".into())));
        assert_eq!(update.banned_places.unwrap().len(), 2);
    }

    proptest! {
        #[test]
        fn prop_banned_places_cover_every_rejected_cycle(
            cycles in prop::collection::vec(prop::collection::vec("[A-Z][a-z]{2,6}", 1..4), 1..4)
        ) {
            let mut state = WorkflowState::new();
            let mut seen = BTreeSet::new();
            for names in cycles {
                state = merge(state, StateUpdate::new().with_itinerary(itinerary(&names))).unwrap();
                let before = state.banned_places.clone();
                let update = rejection_update(&state, "no");
                state = merge(state, update).unwrap();
                seen.extend(names.iter().cloned());
                prop_assert!(state.banned_places.is_superset(&before));
                prop_assert!(state.banned_places.is_superset(&seen));
            }
        }
    }
}
