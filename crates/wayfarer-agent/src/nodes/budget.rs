use std::sync::Arc;

use futures::future::BoxFuture;

use wayfarer_core::error::Result;
use wayfarer_core::state::{StateUpdate, WorkflowState};
use wayfarer_core::traits::PriceSearch;

use crate::graph::{Node, NodeContext};

const UNAVAILABLE: &str = "Price information unavailable.";

/// One price lookup for the destination, fed to every planner run.
pub struct BudgetNode {
    search: Arc<dyn PriceSearch>,
}

impl BudgetNode {
    pub fn new(search: Arc<dyn PriceSearch>) -> Self {
        Self { search }
    }
}

impl Node for BudgetNode {
    fn name(&self) -> &str {
        super::BUDGET
    }

    fn execute<'a>(
        &'a self,
        ctx: &'a NodeContext,
        state: &'a WorkflowState,
    ) -> BoxFuture<'a, Result<StateUpdate>> {
        Box::pin(async move {
            let trip = state.trip()?;
            ctx.action(format!("Searching prices in {}", trip.destination));

            let context = match self
                .search
                .search_prices(&format!("in {}", trip.destination))
                .await
            {
                Ok(text) if !text.trim().is_empty() => text.trim().to_string(),
                Ok(_) => {
                    ctx.thought("No price information found");
                    UNAVAILABLE.to_string()
                }
                Err(e) => {
                    ctx.warning(format!("Price search failed: {}", e));
                    UNAVAILABLE.to_string()
                }
            };
            Ok(StateUpdate::new().with_budget_context(context))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wayfarer_test_utils::{rome_request, MockPriceSearch};

    use crate::nodes::testing::ctx;

    fn state() -> WorkflowState {
        WorkflowState {
            request: Some(rome_request()),
            ..WorkflowState::default()
        }
    }

    #[tokio::test]
    async fn test_stores_search_text() {
        let search = Arc::new(MockPriceSearch::new("- Colosseum 18 EUR"));
        let node = BudgetNode::new(search.clone());
        let update = node.execute(&ctx("budget"), &state()).await.unwrap();
        assert_eq!(update.budget_context, Some(Some("- Colosseum 18 EUR".into())));
        assert_eq!(search.calls(), 1);
    }

    #[tokio::test]
    async fn test_failure_and_empty_degrade_to_fixed_text() {
        for search in [MockPriceSearch::failing(), MockPriceSearch::new("  ")] {
            let node = BudgetNode::new(Arc::new(search));
            let update = node.execute(&ctx("budget"), &state()).await.unwrap();
            assert_eq!(update.budget_context, Some(Some(UNAVAILABLE.into())));
        }
    }
}
