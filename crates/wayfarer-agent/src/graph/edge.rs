use std::collections::BTreeMap;

use wayfarer_core::state::WorkflowState;

/// Pseudo-node that ends a run.
pub const END: &str = "__end__";

/// Pure function of the merged state selecting an outgoing label.
pub type RoutingFn = fn(&WorkflowState) -> &'static str;

/// How the executor leaves a node.
#[derive(Clone)]
pub enum Transition {
    /// Always go to `to`.
    Static { to: String },
    /// Ask `router` for a label, then map the label to a node.
    Conditional {
        router: RoutingFn,
        labels: BTreeMap<String, String>,
    },
}

impl Transition {
    pub fn to(to: impl Into<String>) -> Self {
        Self::Static { to: to.into() }
    }

    pub fn conditional(router: RoutingFn, labels: &[(&str, &str)]) -> Self {
        Self::Conditional {
            router,
            labels: labels
                .iter()
                .map(|(label, to)| (label.to_string(), to.to_string()))
                .collect(),
        }
    }

    /// Every node this transition can lead to.
    pub fn targets(&self) -> Vec<&str> {
        match self {
            Self::Static { to } => vec![to.as_str()],
            Self::Conditional { labels, .. } => labels.values().map(|s| s.as_str()).collect(),
        }
    }

    /// Resolve against the freshly merged state: `(label, next node)`.
    /// `Err` carries the unmapped label.
    pub fn resolve(
        &self,
        state: &WorkflowState,
    ) -> std::result::Result<(Option<&'static str>, &str), &'static str> {
        match self {
            Self::Static { to } => Ok((None, to.as_str())),
            Self::Conditional { router, labels } => {
                let label = router(state);
                labels
                    .get(label)
                    .map(|to| (Some(label), to.as_str()))
                    .ok_or(label)
            }
        }
    }
}
