//! The workflow stages. Each one converts collaborator faults into state
//! and returns only the fields it changed.

pub mod ask_human;
pub mod budget;
pub mod confidence;
pub mod critic;
pub mod failure;
pub mod finder;
pub mod flights;
pub mod init;
pub mod planner;
pub mod publisher;
pub mod router;

pub use ask_human::AskHumanNode;
pub use budget::BudgetNode;
pub use confidence::ConfidenceNode;
pub use critic::CriticNode;
pub use failure::FailureHandlerNode;
pub use finder::FinderNode;
pub use flights::FlightsNode;
pub use init::{InitNode, TripDraft};
pub use planner::PlannerNode;
pub use publisher::PublisherNode;
pub use router::RouterNode;

pub const INIT: &str = "init";
pub const FLIGHTS: &str = "flights";
pub const ROUTER: &str = "router";
pub const BUDGET: &str = "budget";
pub const PLANNER: &str = "planner";
pub const FINDER: &str = "finder";
pub const CONFIDENCE: &str = "confidence";
pub const ASK_HUMAN: &str = "ask_human";
pub const CRITIC: &str = "critic";
pub const PUBLISHER: &str = "publisher";
pub const FAILURE_HANDLER: &str = "failure_handler";

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Arc;

    use wayfarer_core::config::ModelConfig;
    use wayfarer_core::event::EventBus;
    use wayfarer_core::traits::LlmClient;
    use wayfarer_core::types::RunId;

    use crate::graph::NodeContext;
    use crate::llm::Generator;

    pub fn ctx(node: &str) -> NodeContext {
        NodeContext::new(RunId::new("test-run"), node, Arc::new(EventBus::default()))
    }

    pub fn generator(client: Arc<dyn LlmClient>) -> Generator {
        Generator::new(
            client,
            ModelConfig {
                provider: "groq".into(),
                model_id: "test".into(),
                api_key: None,
                base_url: None,
                max_tokens: 256,
                temperature: 0.0,
                retry: None,
            },
        )
    }
}
