//! Workflow graph engine.
//!
//! A workflow is a set of named [`Node`]s, each with exactly one outgoing
//! [`Transition`]: either a static hop or a routing predicate plus a label
//! table. The [`GraphExecutor`] threads one [`WorkflowState`] through the
//! nodes, merging every partial update with [`merge`] before the next hop
//! is resolved.
//!
//! [`WorkflowState`]: wayfarer_core::state::WorkflowState

pub mod edge;
pub mod executor;
pub mod node;
pub mod reducer;

pub use edge::{RoutingFn, Transition, END};
pub use executor::{ExecutionResult, GraphExecutor, StepRecord, DEFAULT_MAX_STEPS};
pub use node::{FnNode, Node, NodeContext};
pub use reducer::merge;
