pub mod providers;
pub mod retry;
pub mod streaming;

use wayfarer_core::config::{AppConfig, ModelConfig};
use wayfarer_core::traits::LlmClient;

pub use providers::openai::OpenAiClient;
pub use retry::RetryingClient;

/// Create a generation client for the provider named in `config`.
///
/// Groq, Mistral, OpenAI and self-hosted servers all speak the
/// OpenAI chat-completions dialect, so one client covers them.
pub fn create_client(config: &ModelConfig) -> Box<dyn LlmClient> {
    tracing::debug!(provider = %config.provider, "Creating OpenAI-compatible client");
    Box::new(OpenAiClient::new())
}

/// Primary client wrapped with retries and the configured fallback models.
pub fn create_retrying_client(config: &AppConfig) -> Box<dyn LlmClient> {
    let fallbacks = config
        .fallback_models
        .iter()
        .map(|fb| (fb.clone(), create_client(fb)))
        .collect();
    Box::new(RetryingClient::new(
        create_client(&config.model),
        fallbacks,
        config.model.retry.clone().unwrap_or_default(),
    ))
}
