use std::sync::Arc;

use futures::future::BoxFuture;

use wayfarer_core::error::Result;
use wayfarer_core::state::{StateUpdate, WorkflowState};
use wayfarer_core::traits::{FlightSearch, HumanPort};

use crate::flights::FlightNegotiator;
use crate::graph::{Node, NodeContext};

/// Runs the flight negotiation once per trip. Never blocks the itinerary:
/// every outcome, including none, is committed as state.
pub struct FlightsNode {
    search: Arc<dyn FlightSearch>,
    human: Arc<dyn HumanPort>,
    max_attempts: u32,
}

impl FlightsNode {
    pub fn new(search: Arc<dyn FlightSearch>, human: Arc<dyn HumanPort>, max_attempts: u32) -> Self {
        Self {
            search,
            human,
            max_attempts,
        }
    }
}

impl Node for FlightsNode {
    fn name(&self) -> &str {
        super::FLIGHTS
    }

    fn execute<'a>(
        &'a self,
        ctx: &'a NodeContext,
        state: &'a WorkflowState,
    ) -> BoxFuture<'a, Result<StateUpdate>> {
        Box::pin(async move {
            let trip = state.trip()?;
            let negotiator =
                FlightNegotiator::new(self.search.as_ref(), self.human.as_ref(), self.max_attempts);
            let outcome = negotiator.negotiate(ctx, trip).await;
            Ok(outcome.into_update())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wayfarer_core::trip::TripRequest;
    use wayfarer_test_utils::{offer, MockFlightSearch, ScriptedHuman};

    use crate::nodes::testing::ctx;

    #[tokio::test]
    async fn test_no_origin_no_calls() {
        let search = Arc::new(MockFlightSearch::new().then(vec![offer("never", None)]));
        let node = FlightsNode::new(search.clone(), Arc::new(ScriptedHuman::new(&[])), 3);
        let mut state = WorkflowState::new();
        state.request = Some(TripRequest::new("Rome", 2).with_origin(""));

        let update = node.execute(&ctx("flights"), &state).await.unwrap();
        assert_eq!(update.flight_options, Some(vec![]));
        assert_eq!(update.flight_confidence_score, Some(0.0));
        assert_eq!(search.calls(), 0);
    }

    #[tokio::test]
    async fn test_requires_trip_request() {
        let node = FlightsNode::new(
            Arc::new(MockFlightSearch::new()),
            Arc::new(ScriptedHuman::new(&[])),
            3,
        );
        assert!(node.execute(&ctx("flights"), &WorkflowState::new()).await.is_err());
    }
}
