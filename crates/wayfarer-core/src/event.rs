use serde::Serialize;

use crate::types::RunId;

/// Workflow event broadcast to all subscribers.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WorkflowEvent {
    /// Workflow run started.
    RunStarted { run_id: RunId, entry: String },
    /// A node is about to execute.
    NodeStarted { node: String },
    /// A node finished and its update was merged.
    NodeFinished {
        node: String,
        elapsed_ms: u64,
        fields: Vec<String>,
    },
    /// The executor picked the next node.
    Routed {
        from: String,
        label: Option<String>,
        to: String,
    },
    /// Reasoning surfaced by a node.
    Thought { node: String, message: String },
    /// A collaborator call made by a node.
    Action { node: String, message: String },
    /// A degraded-but-handled condition.
    Warning { node: String, message: String },
    /// A rejection sent the plan back for another attempt.
    RetryScheduled {
        retry_count: u32,
        banned: usize,
        feedback: String,
    },
    /// Run reached a terminal node.
    RunFinished { approved: bool, retry_count: u32 },
    /// Run aborted with an orchestration error.
    RunFailed { error: String },
}

/// Event bus using tokio broadcast channel.
/// All subscribers receive all events.
pub struct EventBus {
    tx: tokio::sync::broadcast::Sender<WorkflowEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = tokio::sync::broadcast::channel(capacity);
        Self { tx }
    }

    pub fn publish(&self, event: WorkflowEvent) {
        // Ignore error if no receivers
        let _ = self.tx.send(event);
    }

    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<WorkflowEvent> {
        self.tx.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(512)
    }
}
