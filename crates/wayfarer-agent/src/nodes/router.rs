use futures::future::BoxFuture;

use wayfarer_core::error::Result;
use wayfarer_core::state::{StateUpdate, WorkflowState};
use wayfarer_core::trip::TravelStyle;

use crate::graph::{Node, NodeContext};
use crate::json::safe_parse;
use crate::llm::Generator;
use crate::prompts::{self, StyleChoice};

/// Classifies the travel style. Falls back to `Relax` on any failure.
pub struct RouterNode {
    generator: Generator,
}

impl RouterNode {
    pub fn new(generator: Generator) -> Self {
        Self { generator }
    }
}

impl Node for RouterNode {
    fn name(&self) -> &str {
        super::ROUTER
    }

    fn execute<'a>(
        &'a self,
        ctx: &'a NodeContext,
        state: &'a WorkflowState,
    ) -> BoxFuture<'a, Result<StateUpdate>> {
        Box::pin(async move {
            let trip = state.trip()?;
            ctx.action("Classifying travel style");

            let choice = match self
                .generator
                .generate(prompts::SYSTEM, &prompts::router(trip))
                .await
            {
                Ok(text) => safe_parse(&text, StyleChoice::default()),
                Err(e) => {
                    ctx.warning(format!("Style classification failed: {}", e));
                    StyleChoice::default()
                }
            };

            let style = choice
                .style
                .as_deref()
                .map(TravelStyle::from_label)
                .unwrap_or_default();
            ctx.thought(format!(
                "Style {}: {}",
                style.label(),
                choice.reasoning.as_deref().unwrap_or("no reasoning given")
            ));
            Ok(StateUpdate::new().with_travel_style(style))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use wayfarer_test_utils::{rome_request, FailingLlm, ScriptedLlm};

    use crate::nodes::testing::{ctx, generator};

    fn state() -> WorkflowState {
        WorkflowState {
            request: Some(rome_request()),
            ..WorkflowState::default()
        }
    }

    #[tokio::test]
    async fn test_parses_style() {
        let llm = ScriptedLlm::new().on(
            "travel style",
            &[r#"```json
{"reasoning": "Ruins and museums", "style": "CULTURALE"}
```"#],
        );
        let node = RouterNode::new(generator(Arc::new(llm)));
        let update = node.execute(&ctx("router"), &state()).await.unwrap();
        assert_eq!(update.travel_style, Some(TravelStyle::Cultural));
    }

    #[tokio::test]
    async fn test_garbage_falls_back_to_relax() {
        let llm = ScriptedLlm::new().with_fallback("I think it is cultural!");
        let node = RouterNode::new(generator(Arc::new(llm)));
        let update = node.execute(&ctx("router"), &state()).await.unwrap();
        assert_eq!(update.travel_style, Some(TravelStyle::Relax));
    }

    #[tokio::test]
    async fn test_generation_failure_falls_back_to_relax() {
        let node = RouterNode::new(generator(Arc::new(FailingLlm)));
        let update = node.execute(&ctx("router"), &state()).await.unwrap();
        assert_eq!(update.travel_style, Some(TravelStyle::Relax));
    }
}
