use std::sync::Arc;

use futures::future::BoxFuture;

use wayfarer_core::error::Result;
use wayfarer_core::state::{StateUpdate, WorkflowState};
use wayfarer_core::traits::HumanPort;
use wayfarer_core::trip::DayPlan;

use crate::answers::{is_no, is_yes, non_empty};
use crate::graph::{Node, NodeContext};
use crate::retry::reject;
use crate::routing::CONFIDENCE_THRESHOLD;

const NO_ANSWER: &str = "No answer from the traveller";
const DECLINED: &str = "The traveller rejected the plan without comment";

fn outline(itinerary: &[DayPlan]) -> String {
    if itinerary.is_empty() {
        return "  (no itinerary)".to_string();
    }
    itinerary
        .iter()
        .map(|day| {
            let places = day
                .places
                .iter()
                .map(|p| {
                    if p.is_verified() {
                        p.name.clone()
                    } else {
                        format!("{} (unverified)", p.name)
                    }
                })
                .collect::<Vec<_>>()
                .join(", ");
            format!("  Day {}: {} | {}", day.day_number, day.focus, places)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Low-confidence gate: the traveller approves the draft as-is or says
/// what to change.
pub struct AskHumanNode {
    human: Arc<dyn HumanPort>,
}

impl AskHumanNode {
    pub fn new(human: Arc<dyn HumanPort>) -> Self {
        Self { human }
    }
}

impl Node for AskHumanNode {
    fn name(&self) -> &str {
        super::ASK_HUMAN
    }

    fn execute<'a>(
        &'a self,
        ctx: &'a NodeContext,
        state: &'a WorkflowState,
    ) -> BoxFuture<'a, Result<StateUpdate>> {
        Box::pin(async move {
            let question = format!(
                "Plan confidence is {:.2} (below {:.2}).\n{}\nApprove this plan? (yes, or tell me what to change)",
                state.confidence_score,
                CONFIDENCE_THRESHOLD,
                outline(&state.itinerary)
            );

            let answer = match self.human.prompt(&question).await {
                Ok(answer) => answer,
                Err(e) => {
                    ctx.warning(format!("Approval prompt failed: {}", e));
                    return Ok(reject(ctx, state, NO_ANSWER));
                }
            };

            if is_yes(&answer) {
                ctx.thought("Traveller approved the draft");
                return Ok(StateUpdate::new().with_approval(true).with_feedback(None));
            }

            let feedback = match non_empty(&answer) {
                Some(text) if !is_no(&text) => text,
                _ => DECLINED.to_string(),
            };
            Ok(reject(ctx, state, &feedback))
        })
    }
}
