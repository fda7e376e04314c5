use std::sync::Arc;

use futures::StreamExt;
use tracing::debug;

use wayfarer_core::config::ModelConfig;
use wayfarer_core::error::{Result, WayfarerError};
use wayfarer_core::traits::LlmClient;
use wayfarer_core::types::{ChatMessage, StreamDelta};

/// `generate(prompt) -> text` on top of the streaming client.
#[derive(Clone)]
pub struct Generator {
    client: Arc<dyn LlmClient>,
    config: ModelConfig,
}

impl Generator {
    pub fn new(client: Arc<dyn LlmClient>, config: ModelConfig) -> Self {
        Self { client, config }
    }

    /// Send one system + user exchange and collect the full text.
    pub async fn generate(&self, system: &str, user: &str) -> Result<String> {
        let messages = vec![ChatMessage::system(system), ChatMessage::user(user)];
        let mut stream = self.client.chat_stream(&self.config, messages).await?;

        let mut text = String::new();
        while let Some(delta) = stream.next().await {
            match delta {
                Ok(StreamDelta::TextDelta(chunk)) => text.push_str(&chunk),
                Ok(StreamDelta::Usage {
                    input_tokens,
                    output_tokens,
                }) => {
                    debug!(input_tokens, output_tokens, "Generation usage");
                }
                Ok(StreamDelta::Stop(reason)) => {
                    debug!(?reason, "Generation stopped");
                }
                Err(e) => return Err(WayfarerError::LlmStream(e.to_string())),
            }
        }
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wayfarer_test_utils::{FailingLlm, ScriptedLlm};

    fn config() -> ModelConfig {
        ModelConfig {
            provider: "groq".into(),
            model_id: "test".into(),
            api_key: None,
            base_url: None,
            max_tokens: 64,
            temperature: 0.0,
            retry: None,
        }
    }

    #[tokio::test]
    async fn test_generate_joins_deltas() {
        let llm = Arc::new(ScriptedLlm::new().on("style", &["Cultural trip"]));
        let generator = Generator::new(llm.clone(), config());
        let text = generator.generate("classify the style", "Rome").await.unwrap();
        assert_eq!(text, "Cultural trip");
        assert_eq!(llm.prompts().len(), 1);
        assert!(llm.prompts()[0].contains("Rome"));
    }

    #[tokio::test]
    async fn test_generate_propagates_request_error() {
        let generator = Generator::new(Arc::new(FailingLlm), config());
        let err = generator.generate("s", "u").await.unwrap_err();
        assert!(matches!(err, WayfarerError::LlmRequest(_)));
    }
}
