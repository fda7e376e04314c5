//! The canonical itinerary workflow.
//!
//! ```text
//! init -> flights -> router -> budget -> planner -> finder -> confidence
//! confidence  ask_human: ask_human | continue: critic
//! ask_human   approved: finder | rejected: planner | fail: failure_handler
//! critic      approved: publisher | retry: planner | fail: failure_handler
//! publisher -> END, failure_handler -> END
//! ```

use std::sync::Arc;

use tracing::info;

use wayfarer_core::aliases::DestinationAliases;
use wayfarer_core::error::Result;
use wayfarer_core::event::EventBus;
use wayfarer_core::state::WorkflowState;
use wayfarer_core::traits::{FlightSearch, HumanPort, PlaceLookup, PriceSearch, ReportRenderer};
use wayfarer_core::types::RunId;

use crate::graph::{ExecutionResult, GraphExecutor, END};
use crate::llm::Generator;
use crate::nodes::*;
use crate::routing;

/// Entry node of every run.
pub const ENTRY: &str = INIT;

/// Collaborators and knobs the workflow nodes need.
pub struct WorkflowDeps {
    pub generator: Generator,
    pub places: Arc<dyn PlaceLookup>,
    pub prices: Arc<dyn PriceSearch>,
    pub flights: Arc<dyn FlightSearch>,
    pub renderer: Arc<dyn ReportRenderer>,
    pub human: Arc<dyn HumanPort>,
    pub aliases: Arc<DestinationAliases>,
    pub draft: TripDraft,
    pub max_flight_attempts: u32,
    pub max_steps: usize,
}

/// Register the nodes and edges of the canonical topology and validate it.
pub fn build_workflow(deps: WorkflowDeps, events: Arc<EventBus>) -> Result<GraphExecutor> {
    let mut graph = GraphExecutor::new(events).with_max_steps(deps.max_steps);

    graph.register(InitNode::new(deps.human.clone(), deps.draft))?;
    graph.register(FlightsNode::new(
        deps.flights,
        deps.human.clone(),
        deps.max_flight_attempts,
    ))?;
    graph.register(RouterNode::new(deps.generator.clone()))?;
    graph.register(BudgetNode::new(deps.prices))?;
    graph.register(PlannerNode::new(deps.generator.clone()))?;
    graph.register(FinderNode::new(deps.places, deps.aliases))?;
    graph.register(ConfidenceNode)?;
    graph.register(AskHumanNode::new(deps.human))?;
    graph.register(CriticNode::new(deps.generator))?;
    graph.register(PublisherNode::new(deps.renderer))?;
    graph.register(FailureHandlerNode)?;

    graph.add_edge(INIT, FLIGHTS)?;
    graph.add_edge(FLIGHTS, ROUTER)?;
    graph.add_edge(ROUTER, BUDGET)?;
    graph.add_edge(BUDGET, PLANNER)?;
    graph.add_conditional_edge(PLANNER, routing::after_planner, &[(routing::CONTINUE, FINDER)])?;
    graph.add_edge(FINDER, CONFIDENCE)?;
    graph.add_conditional_edge(
        CONFIDENCE,
        routing::after_confidence,
        &[(routing::ASK_HUMAN, ASK_HUMAN), (routing::CONTINUE, CRITIC)],
    )?;
    graph.add_conditional_edge(
        ASK_HUMAN,
        routing::after_ask_human,
        &[
            (routing::APPROVED, FINDER),
            (routing::REJECTED, PLANNER),
            (routing::FAIL, FAILURE_HANDLER),
        ],
    )?;
    graph.add_conditional_edge(
        CRITIC,
        routing::after_critic,
        &[
            (routing::APPROVED, PUBLISHER),
            (routing::RETRY, PLANNER),
            (routing::FAIL, FAILURE_HANDLER),
        ],
    )?;
    graph.add_edge(PUBLISHER, END)?;
    graph.add_edge(FAILURE_HANDLER, END)?;

    graph.validate(ENTRY)?;
    info!(nodes = graph.node_names().len(), "Workflow graph built");
    Ok(graph)
}

/// Run the workflow from a fresh state.
pub async fn run_workflow(graph: &GraphExecutor, run_id: RunId) -> Result<ExecutionResult> {
    graph.run(run_id, ENTRY, WorkflowState::new()).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    use wayfarer_core::state::MAX_RETRIES;
    use wayfarer_test_utils::{
        MockFlightSearch, MockPlaceLookup, MockPriceSearch, RecordingRenderer, ScriptedHuman,
        ScriptedLlm,
    };

    use crate::nodes::testing::generator;

    fn graph() -> GraphExecutor {
        let deps = WorkflowDeps {
            generator: generator(Arc::new(ScriptedLlm::new())),
            places: Arc::new(MockPlaceLookup::new()),
            prices: Arc::new(MockPriceSearch::new("")),
            flights: Arc::new(MockFlightSearch::new()),
            renderer: Arc::new(RecordingRenderer::new()),
            human: Arc::new(ScriptedHuman::new(&[])),
            aliases: Arc::new(DestinationAliases::new()),
            draft: TripDraft::default(),
            max_flight_attempts: 3,
            max_steps: 64,
        };
        build_workflow(deps, Arc::new(EventBus::default())).unwrap()
    }

    #[test]
    fn test_topology_registers_all_nodes() {
        let graph = graph();
        assert_eq!(
            graph.node_names(),
            vec![
                ASK_HUMAN,
                BUDGET,
                CONFIDENCE,
                CRITIC,
                FAILURE_HANDLER,
                FINDER,
                FLIGHTS,
                INIT,
                PLANNER,
                PUBLISHER,
                ROUTER
            ]
        );
    }

    /// With the retry bound reached, every node must reach END without
    /// revisiting a node, whatever the approval and confidence.
    #[test]
    fn test_forward_progress_at_retry_bound() {
        let graph = graph();
        let names: Vec<String> = graph.node_names().iter().map(|s| s.to_string()).collect();

        for approved in [false, true] {
            for confidence in [0.0, 0.5, 0.7, 1.0] {
                let state = WorkflowState {
                    is_approved: approved,
                    confidence_score: confidence,
                    retry_count: MAX_RETRIES,
                    ..WorkflowState::default()
                };
                for start in &names {
                    let mut visited = HashSet::new();
                    let mut current = start.clone();
                    while current != END {
                        assert!(
                            visited.insert(current.clone()),
                            "cycle from {} through {} (approved={}, confidence={})",
                            start,
                            current,
                            approved,
                            confidence
                        );
                        let (_, next) = graph
                            .transition(&current)
                            .unwrap()
                            .resolve(&state)
                            .unwrap();
                        current = next.to_string();
                    }
                }
            }
        }
    }

    #[test]
    fn test_approval_never_routes_to_failure() {
        let graph = graph();
        let state = WorkflowState {
            is_approved: true,
            retry_count: MAX_RETRIES + 1,
            ..WorkflowState::default()
        };
        for from in [ASK_HUMAN, CRITIC] {
            let (label, next) = graph.transition(from).unwrap().resolve(&state).unwrap();
            assert_eq!(label, Some(routing::APPROVED));
            assert_ne!(next, FAILURE_HANDLER);
        }
    }
}
