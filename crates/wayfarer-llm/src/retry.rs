use std::time::Duration;

use futures::future::BoxFuture;
use futures::stream::BoxStream;
use tracing::{info, warn};

use wayfarer_core::config::{ModelConfig, RetryConfig};
use wayfarer_core::error::{Result, WayfarerError};
use wayfarer_core::traits::LlmClient;
use wayfarer_core::types::*;

/// A generation client that retries transient failures, then walks the fallback models.
pub struct RetryingClient {
    primary: Box<dyn LlmClient>,
    fallbacks: Vec<(ModelConfig, Box<dyn LlmClient>)>,
    retry_config: RetryConfig,
}

impl RetryingClient {
    pub fn new(
        primary: Box<dyn LlmClient>,
        fallbacks: Vec<(ModelConfig, Box<dyn LlmClient>)>,
        retry_config: RetryConfig,
    ) -> Self {
        Self {
            primary,
            fallbacks,
            retry_config,
        }
    }
}

fn is_retryable(e: &WayfarerError) -> bool {
    match e {
        WayfarerError::LlmRequest(msg) => {
            let msg = msg.to_lowercase();
            ["429", "500", "502", "503", "timeout", "timed out", "connection"]
                .iter()
                .any(|needle| msg.contains(needle))
        }
        WayfarerError::LlmStream(_) => true,
        _ => false,
    }
}

fn calculate_backoff(attempt: u32, config: &RetryConfig) -> Duration {
    let factor = 2u64.saturating_pow(attempt);
    let ms = config
        .initial_backoff_ms
        .saturating_mul(factor)
        .min(config.max_backoff_ms);
    // Jitter: 0.8x to 1.2x
    let jitter = 0.8 + rand::random::<f64>() * 0.4;
    Duration::from_millis((ms as f64 * jitter) as u64)
}

impl LlmClient for RetryingClient {
    fn chat_stream(
        &self,
        config: &ModelConfig,
        messages: Vec<ChatMessage>,
    ) -> BoxFuture<'_, Result<BoxStream<'_, Result<StreamDelta>>>> {
        let config = config.clone();

        Box::pin(async move {
            let max_retries = self.retry_config.max_retries;

            let mut last_err = None;
            for attempt in 0..=max_retries {
                match self.primary.chat_stream(&config, messages.clone()).await {
                    Ok(stream) => return Ok(stream),
                    Err(e) => {
                        if is_retryable(&e) && attempt < max_retries {
                            let backoff = calculate_backoff(attempt, &self.retry_config);
                            warn!(
                                attempt = attempt + 1,
                                max_retries,
                                backoff_ms = backoff.as_millis() as u64,
                                error = %e,
                                "Retrying generation request"
                            );
                            tokio::time::sleep(backoff).await;
                            last_err = Some(e);
                            continue;
                        }
                        last_err = Some(e);
                        break;
                    }
                }
            }

            if !self.fallbacks.is_empty() {
                info!("Primary model exhausted, trying fallback models");
            }
            for (fb_config, fb_client) in &self.fallbacks {
                match fb_client.chat_stream(fb_config, messages.clone()).await {
                    Ok(stream) => {
                        info!(
                            model = %fb_config.model_id,
                            provider = %fb_config.provider,
                            "Fell back to alternative model"
                        );
                        return Ok(stream);
                    }
                    Err(e) => {
                        warn!(model = %fb_config.model_id, error = %e, "Fallback model also failed");
                    }
                }
            }

            Err(last_err
                .unwrap_or_else(|| WayfarerError::LlmRequest("All providers failed".into())))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use futures::StreamExt;

    /// Fails the first `failures` calls with `error`, then streams "ok".
    struct FlakyClient {
        calls: Arc<AtomicUsize>,
        failures: usize,
        error: fn() -> WayfarerError,
    }

    impl LlmClient for FlakyClient {
        fn chat_stream(
            &self,
            _config: &ModelConfig,
            _messages: Vec<ChatMessage>,
        ) -> BoxFuture<'_, Result<BoxStream<'_, Result<StreamDelta>>>> {
            Box::pin(async move {
                let n = self.calls.fetch_add(1, Ordering::SeqCst);
                if n < self.failures {
                    return Err((self.error)());
                }
                let deltas = vec![Ok(StreamDelta::TextDelta("ok".into()))];
                Ok(Box::pin(futures::stream::iter(deltas)) as BoxStream<'_, _>)
            })
        }
    }

    fn model() -> ModelConfig {
        ModelConfig {
            provider: "groq".into(),
            model_id: "primary".into(),
            api_key: None,
            base_url: None,
            max_tokens: 64,
            temperature: 0.0,
            retry: None,
        }
    }

    fn fast_retry(max_retries: u32) -> RetryConfig {
        RetryConfig {
            max_retries,
            initial_backoff_ms: 10,
            max_backoff_ms: 20,
        }
    }

    async fn first_text(stream: BoxStream<'_, Result<StreamDelta>>) -> String {
        let deltas: Vec<_> = stream.collect().await;
        match deltas.into_iter().next() {
            Some(Ok(StreamDelta::TextDelta(t))) => t,
            other => panic!("unexpected delta: {:?}", other),
        }
    }

    #[test]
    fn test_is_retryable() {
        assert!(is_retryable(&WayfarerError::LlmRequest("HTTP 429 Too Many Requests".into())));
        assert!(is_retryable(&WayfarerError::LlmRequest("Connection reset".into())));
        assert!(is_retryable(&WayfarerError::LlmStream("eof".into())));
        assert!(!is_retryable(&WayfarerError::LlmRequest("HTTP 401: bad key".into())));
        assert!(!is_retryable(&WayfarerError::Config("x".into())));
    }

    #[test]
    fn test_backoff_is_capped() {
        let config = RetryConfig {
            max_retries: 10,
            initial_backoff_ms: 1000,
            max_backoff_ms: 5000,
        };
        let first = calculate_backoff(0, &config).as_millis();
        assert!((800..=1200).contains(&first));
        let late = calculate_backoff(9, &config).as_millis();
        assert!(late <= 6000);
        // Large exponents must not overflow.
        let huge = calculate_backoff(200, &config).as_millis();
        assert!(huge <= 6000);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retries_transient_errors() {
        let calls = Arc::new(AtomicUsize::new(0));
        let client = RetryingClient::new(
            Box::new(FlakyClient {
                calls: calls.clone(),
                failures: 2,
                error: || WayfarerError::LlmRequest("HTTP 503".into()),
            }),
            vec![],
            fast_retry(3),
        );
        let stream = client.chat_stream(&model(), vec![]).await.unwrap();
        assert_eq!(first_text(stream).await, "ok");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_permanent_error_goes_to_fallback() {
        let primary_calls = Arc::new(AtomicUsize::new(0));
        let fallback_calls = Arc::new(AtomicUsize::new(0));
        let client = RetryingClient::new(
            Box::new(FlakyClient {
                calls: primary_calls.clone(),
                failures: usize::MAX,
                error: || WayfarerError::LlmRequest("HTTP 401".into()),
            }),
            vec![(
                model(),
                Box::new(FlakyClient {
                    calls: fallback_calls.clone(),
                    failures: 0,
                    error: || WayfarerError::LlmRequest("unused".into()),
                }) as Box<dyn LlmClient>,
            )],
            fast_retry(3),
        );
        let stream = client.chat_stream(&model(), vec![]).await.unwrap();
        assert_eq!(first_text(stream).await, "ok");
        assert_eq!(primary_calls.load(Ordering::SeqCst), 1);
        assert_eq!(fallback_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_all_failures_return_last_error() {
        let client = RetryingClient::new(
            Box::new(FlakyClient {
                calls: Arc::new(AtomicUsize::new(0)),
                failures: usize::MAX,
                error: || WayfarerError::LlmRequest("HTTP 500".into()),
            }),
            vec![],
            fast_retry(1),
        );
        let err = client.chat_stream(&model(), vec![]).await.err().unwrap();
        assert!(err.to_string().contains("500"));
    }
}
