use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, error, info};

use wayfarer_core::error::{Result, WayfarerError};
use wayfarer_core::event::{EventBus, WorkflowEvent};
use wayfarer_core::state::WorkflowState;
use wayfarer_core::types::RunId;

use super::edge::{RoutingFn, Transition, END};
use super::node::{Node, NodeContext};
use super::reducer::merge;

/// Default cap on executed nodes per run.
pub const DEFAULT_MAX_STEPS: usize = 64;

/// One executed node.
#[derive(Debug, Clone)]
pub struct StepRecord {
    pub node: String,
    /// Fields the node's update touched.
    pub fields: Vec<&'static str>,
    /// Label chosen by the routing predicate, if the edge was conditional.
    pub label: Option<&'static str>,
    pub next: String,
    pub elapsed_ms: u64,
}

/// Result of a completed run.
#[derive(Debug, Clone)]
pub struct ExecutionResult {
    pub run_id: RunId,
    /// State as left by the terminal node.
    pub state: WorkflowState,
    /// Per-node records in execution order.
    pub steps: Vec<StepRecord>,
    pub total_elapsed_ms: u64,
}

impl ExecutionResult {
    /// Names of the executed nodes, in order.
    pub fn path(&self) -> Vec<&str> {
        self.steps.iter().map(|s| s.node.as_str()).collect()
    }

    /// The last node that ran before the run ended.
    pub fn terminal_node(&self) -> Option<&str> {
        self.steps.last().map(|s| s.node.as_str())
    }
}

/// Single-threaded workflow executor.
///
/// Holds a node registry and one outgoing transition per node. `run` walks
/// from the entry node, merging each node's update before resolving the
/// next hop, until a transition reaches [`END`]. All branching lives in the
/// routing predicates; the executor itself carries none.
pub struct GraphExecutor {
    nodes: HashMap<String, Arc<dyn Node>>,
    transitions: HashMap<String, Transition>,
    events: Arc<EventBus>,
    max_steps: usize,
}

impl GraphExecutor {
    pub fn new(events: Arc<EventBus>) -> Self {
        Self {
            nodes: HashMap::new(),
            transitions: HashMap::new(),
            events,
            max_steps: DEFAULT_MAX_STEPS,
        }
    }

    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps.max(1);
        self
    }

    /// Register a node under its own name.
    pub fn register(&mut self, node: impl Node + 'static) -> Result<()> {
        let name = node.name().to_string();
        if name == END {
            return Err(WayfarerError::InvalidGraph(format!("`{}` is reserved", END)));
        }
        if self.nodes.contains_key(&name) {
            return Err(WayfarerError::InvalidGraph(format!(
                "node `{}` registered twice",
                name
            )));
        }
        self.nodes.insert(name, Arc::new(node));
        Ok(())
    }

    /// Unconditional edge `from -> to`.
    pub fn add_edge(&mut self, from: &str, to: &str) -> Result<()> {
        self.set_transition(from, Transition::to(to))
    }

    /// Conditional edge: `router` picks a label, `labels` maps it to a node.
    pub fn add_conditional_edge(
        &mut self,
        from: &str,
        router: RoutingFn,
        labels: &[(&str, &str)],
    ) -> Result<()> {
        if labels.is_empty() {
            return Err(WayfarerError::InvalidGraph(format!(
                "conditional edge from `{}` has no labels",
                from
            )));
        }
        self.set_transition(from, Transition::conditional(router, labels))
    }

    fn set_transition(&mut self, from: &str, transition: Transition) -> Result<()> {
        if self.transitions.contains_key(from) {
            return Err(WayfarerError::InvalidGraph(format!(
                "node `{}` already has an outgoing transition",
                from
            )));
        }
        self.transitions.insert(from.to_string(), transition);
        Ok(())
    }

    pub fn node_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.nodes.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }

    pub fn transition(&self, from: &str) -> Option<&Transition> {
        self.transitions.get(from)
    }

    /// Check that the graph is closed: the entry exists, every node has a
    /// transition, and every target is a registered node or [`END`].
    pub fn validate(&self, entry: &str) -> Result<()> {
        if !self.nodes.contains_key(entry) {
            return Err(WayfarerError::NodeNotFound(entry.to_string()));
        }
        for name in self.nodes.keys() {
            if !self.transitions.contains_key(name) {
                return Err(WayfarerError::MissingTransition(name.clone()));
            }
        }
        for (from, transition) in &self.transitions {
            if !self.nodes.contains_key(from) {
                return Err(WayfarerError::InvalidGraph(format!(
                    "transition from unregistered node `{}`",
                    from
                )));
            }
            for target in transition.targets() {
                if target != END && !self.nodes.contains_key(target) {
                    return Err(WayfarerError::InvalidGraph(format!(
                        "`{}` routes to unregistered node `{}`",
                        from, target
                    )));
                }
            }
        }
        Ok(())
    }

    /// Run from `entry` until a transition reaches [`END`].
    pub async fn run(
        &self,
        run_id: RunId,
        entry: &str,
        initial: WorkflowState,
    ) -> Result<ExecutionResult> {
        match self.drive(&run_id, entry, initial).await {
            Ok(result) => {
                self.events.publish(WorkflowEvent::RunFinished {
                    approved: result.state.is_approved,
                    retry_count: result.state.retry_count,
                });
                Ok(result)
            }
            Err(e) => {
                error!(run_id = %run_id, error = %e, "Workflow run failed");
                self.events.publish(WorkflowEvent::RunFailed {
                    error: e.to_string(),
                });
                Err(e)
            }
        }
    }

    async fn drive(
        &self,
        run_id: &RunId,
        entry: &str,
        initial: WorkflowState,
    ) -> Result<ExecutionResult> {
        self.validate(entry)?;

        let start = Instant::now();
        let mut state = initial;
        let mut steps = Vec::new();
        let mut current = entry.to_string();

        info!(run_id = %run_id, entry = %entry, "Workflow run started");
        self.events.publish(WorkflowEvent::RunStarted {
            run_id: run_id.clone(),
            entry: entry.to_string(),
        });

        loop {
            if steps.len() >= self.max_steps {
                return Err(WayfarerError::StepLimitExceeded(self.max_steps));
            }

            let node = self
                .nodes
                .get(&current)
                .ok_or_else(|| WayfarerError::NodeNotFound(current.clone()))?;

            info!(node = %current, retry_count = state.retry_count, "Executing workflow node");
            self.events.publish(WorkflowEvent::NodeStarted {
                node: current.clone(),
            });

            let ctx = NodeContext::new(run_id.clone(), current.clone(), self.events.clone());
            let node_start = Instant::now();
            let update = node.execute(&ctx, &state).await?;
            let fields = update.touched_fields();

            state = merge(state, update).map_err(|e| {
                error!(node = %current, error = %e, "Rejected state update");
                e
            })?;

            let elapsed_ms = node_start.elapsed().as_millis() as u64;
            debug!(node = %current, elapsed_ms, fields = ?fields, "Node update merged");
            self.events.publish(WorkflowEvent::NodeFinished {
                node: current.clone(),
                elapsed_ms,
                fields: fields.iter().map(|f| f.to_string()).collect(),
            });

            let transition = self
                .transitions
                .get(&current)
                .ok_or_else(|| WayfarerError::MissingTransition(current.clone()))?;
            let (label, next) =
                transition
                    .resolve(&state)
                    .map_err(|label| WayfarerError::UnknownRoute {
                        node: current.clone(),
                        label: label.to_string(),
                    })?;
            let next = next.to_string();

            debug!(from = %current, label = ?label, to = %next, "Routed");
            self.events.publish(WorkflowEvent::Routed {
                from: current.clone(),
                label: label.map(String::from),
                to: next.clone(),
            });

            steps.push(StepRecord {
                node: current.clone(),
                fields,
                label,
                next: next.clone(),
                elapsed_ms,
            });

            if next == END {
                break;
            }
            current = next;
        }

        let total_elapsed_ms = start.elapsed().as_millis() as u64;
        info!(
            run_id = %run_id,
            steps = steps.len(),
            approved = state.is_approved,
            retry_count = state.retry_count,
            total_elapsed_ms,
            "Workflow run complete"
        );

        Ok(ExecutionResult {
            run_id: run_id.clone(),
            state,
            steps,
            total_elapsed_ms,
        })
    }
}
