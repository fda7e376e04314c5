use futures::future::BoxFuture;

use wayfarer_core::error::Result;
use wayfarer_core::state::{StateUpdate, WorkflowState};

use crate::graph::{Node, NodeContext};

/// Terminal failure stage: clears the itinerary and explains why.
pub struct FailureHandlerNode;

impl Node for FailureHandlerNode {
    fn name(&self) -> &str {
        super::FAILURE_HANDLER
    }

    fn execute<'a>(
        &'a self,
        ctx: &'a NodeContext,
        state: &'a WorkflowState,
    ) -> BoxFuture<'a, Result<StateUpdate>> {
        Box::pin(async move {
            let explanation = format!(
                "Validation failed after {} attempts. Last reason: {}",
                state.retry_count,
                state
                    .critic_feedback
                    .as_deref()
                    .unwrap_or("no reason recorded")
            );
            ctx.warning(explanation.clone());
            Ok(StateUpdate::new()
                .with_itinerary(vec![])
                .with_approval(false)
                .with_feedback(Some(explanation)))
        })
    }
}
