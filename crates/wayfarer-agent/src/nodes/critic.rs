use futures::future::BoxFuture;

use wayfarer_core::error::Result;
use wayfarer_core::state::{StateUpdate, WorkflowState};

use crate::graph::{Node, NodeContext};
use crate::json::try_parse;
use crate::llm::Generator;
use crate::prompts::{self, CriticVerdict};
use crate::retry::reject;

const EMPTY_ITINERARY: &str = "The itinerary has no days";
const NO_REASON: &str = "Rejected by the logistics review without a reason";

/// Logistics review. An unreadable verdict counts as approval.
pub struct CriticNode {
    generator: Generator,
}

impl CriticNode {
    pub fn new(generator: Generator) -> Self {
        Self { generator }
    }

    async fn verdict(&self, ctx: &NodeContext, state: &WorkflowState) -> Result<CriticVerdict> {
        let trip = state.trip()?;
        ctx.action("Reviewing logistics");
        let verdict = match self
            .generator
            .generate(prompts::SYSTEM, &prompts::critic(trip, &state.itinerary))
            .await
        {
            Ok(text) => try_parse::<CriticVerdict>(&text).unwrap_or_else(|| {
                ctx.warning("Unreadable review, approving as-is");
                CriticVerdict::default()
            }),
            Err(e) => {
                ctx.warning(format!("Review unavailable, approving as-is: {}", e));
                CriticVerdict::default()
            }
        };
        Ok(verdict)
    }
}

impl Node for CriticNode {
    fn name(&self) -> &str {
        super::CRITIC
    }

    fn execute<'a>(
        &'a self,
        ctx: &'a NodeContext,
        state: &'a WorkflowState,
    ) -> BoxFuture<'a, Result<StateUpdate>> {
        Box::pin(async move {
            if state.itinerary.is_empty() {
                return Ok(reject(ctx, state, EMPTY_ITINERARY));
            }

            let verdict = self.verdict(ctx, state).await?;
            if verdict.approved {
                ctx.thought("Itinerary approved");
                return Ok(StateUpdate::new().with_approval(true).with_feedback(None));
            }

            let critique = verdict
                .critique
                .map(|c| c.trim().to_string())
                .filter(|c| !c.is_empty())
                .unwrap_or_else(|| NO_REASON.to_string());
            Ok(reject(ctx, state, &critique))
        })
    }
}
