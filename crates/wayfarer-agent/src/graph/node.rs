use std::sync::Arc;

use futures::future::BoxFuture;
use tracing::{info, warn};

use wayfarer_core::error::Result;
use wayfarer_core::event::{EventBus, WorkflowEvent};
use wayfarer_core::state::{StateUpdate, WorkflowState};
use wayfarer_core::types::RunId;

/// A single workflow stage.
///
/// Reads a snapshot of the state, may call one collaborator, and returns
/// only the fields it changed. Collaborator faults are turned into state
/// here; `Err` is reserved for faults the run cannot continue from.
pub trait Node: Send + Sync {
    /// Registry name, unique within a graph.
    fn name(&self) -> &str;

    fn execute<'a>(
        &'a self,
        ctx: &'a NodeContext,
        state: &'a WorkflowState,
    ) -> BoxFuture<'a, Result<StateUpdate>>;
}

/// What a node gets besides the state: the run identity and the event port.
#[derive(Clone)]
pub struct NodeContext {
    run_id: RunId,
    node: String,
    events: Arc<EventBus>,
}

impl NodeContext {
    pub fn new(run_id: RunId, node: impl Into<String>, events: Arc<EventBus>) -> Self {
        Self {
            run_id,
            node: node.into(),
            events,
        }
    }

    pub fn run_id(&self) -> &RunId {
        &self.run_id
    }

    pub fn node(&self) -> &str {
        &self.node
    }

    pub fn events(&self) -> &Arc<EventBus> {
        &self.events
    }

    /// Reasoning worth surfacing to the operator.
    pub fn thought(&self, message: impl Into<String>) {
        let message = message.into();
        info!(node = %self.node, "{}", message);
        self.events.publish(WorkflowEvent::Thought {
            node: self.node.clone(),
            message,
        });
    }

    /// A collaborator call about to happen.
    pub fn action(&self, message: impl Into<String>) {
        let message = message.into();
        info!(node = %self.node, action = %message, "Calling collaborator");
        self.events.publish(WorkflowEvent::Action {
            node: self.node.clone(),
            message,
        });
    }

    /// A degraded-but-handled condition.
    pub fn warning(&self, message: impl Into<String>) {
        let message = message.into();
        warn!(node = %self.node, "{}", message);
        self.events.publish(WorkflowEvent::Warning {
            node: self.node.clone(),
            message,
        });
    }

    pub fn publish(&self, event: WorkflowEvent) {
        self.events.publish(event);
    }
}

type UpdateFn = dyn Fn(&WorkflowState) -> Result<StateUpdate> + Send + Sync;

/// Node backed by a synchronous closure. Handy for tests and trivial stages.
pub struct FnNode {
    name: String,
    f: Box<UpdateFn>,
}

impl FnNode {
    pub fn new<F>(name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&WorkflowState) -> Result<StateUpdate> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            f: Box::new(f),
        }
    }
}

impl Node for FnNode {
    fn name(&self) -> &str {
        &self.name
    }

    fn execute<'a>(
        &'a self,
        _ctx: &'a NodeContext,
        state: &'a WorkflowState,
    ) -> BoxFuture<'a, Result<StateUpdate>> {
        Box::pin(async move { (self.f)(state) })
    }
}
