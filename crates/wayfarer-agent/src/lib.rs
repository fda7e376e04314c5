pub mod answers;
pub mod confidence;
pub mod flights;
pub mod graph;
pub mod json;
pub mod llm;
pub mod nodes;
pub mod prompts;
pub mod retry;
pub mod routing;
pub mod run_log;
pub mod workflow;

pub use confidence::evaluate_confidence;
pub use flights::{FlightNegotiator, FlightOutcome};
pub use graph::{ExecutionResult, GraphExecutor, Node, NodeContext, StepRecord, END};
pub use llm::Generator;
pub use nodes::TripDraft;
pub use run_log::RunLogger;
pub use workflow::{build_workflow, run_workflow, WorkflowDeps, ENTRY};
