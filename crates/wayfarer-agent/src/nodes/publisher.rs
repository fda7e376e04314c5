use std::sync::Arc;

use futures::future::BoxFuture;

use wayfarer_core::error::Result;
use wayfarer_core::state::{StateUpdate, WorkflowState};
use wayfarer_core::traits::ReportRenderer;

use crate::graph::{Node, NodeContext};

/// Terminal success stage. Renders once; a render failure is reported,
/// never retried.
pub struct PublisherNode {
    renderer: Arc<dyn ReportRenderer>,
}

impl PublisherNode {
    pub fn new(renderer: Arc<dyn ReportRenderer>) -> Self {
        Self { renderer }
    }
}

impl Node for PublisherNode {
    fn name(&self) -> &str {
        super::PUBLISHER
    }

    fn execute<'a>(
        &'a self,
        ctx: &'a NodeContext,
        state: &'a WorkflowState,
    ) -> BoxFuture<'a, Result<StateUpdate>> {
        Box::pin(async move {
            ctx.action("Rendering reports");
            let paths = match self.renderer.render(state).await {
                Ok(paths) => {
                    for path in &paths {
                        ctx.thought(format!("Report written to {}", path.display()));
                    }
                    paths
                }
                Err(e) => {
                    ctx.warning(format!("Report rendering failed: {}", e));
                    vec![]
                }
            };
            Ok(StateUpdate::new().with_report_paths(paths))
        })
    }
}
