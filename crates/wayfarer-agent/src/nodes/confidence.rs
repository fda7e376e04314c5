use futures::future::BoxFuture;

use wayfarer_core::error::Result;
use wayfarer_core::state::{StateUpdate, WorkflowState};

use crate::confidence::evaluate_confidence;
use crate::graph::{Node, NodeContext};
use crate::routing::CONFIDENCE_THRESHOLD;

/// Scores the verified itinerary. No collaborator calls.
pub struct ConfidenceNode;

impl Node for ConfidenceNode {
    fn name(&self) -> &str {
        super::CONFIDENCE
    }

    fn execute<'a>(
        &'a self,
        ctx: &'a NodeContext,
        state: &'a WorkflowState,
    ) -> BoxFuture<'a, Result<StateUpdate>> {
        Box::pin(async move {
            let trip = state.trip()?;
            let score = evaluate_confidence(&state.itinerary, trip.daily_budget());
            ctx.thought(format!(
                "Confidence {:.2} ({})",
                score,
                if score < CONFIDENCE_THRESHOLD {
                    "needs review"
                } else {
                    "good"
                }
            ));
            Ok(StateUpdate::new().with_confidence(score))
        })
    }
}
