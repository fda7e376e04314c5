use futures::future::BoxFuture;

use wayfarer_core::error::{Result, WayfarerError};
use wayfarer_core::traits::HumanPort;

/// Human port on the terminal. Each question blocks a worker thread, not
/// the runtime.
pub struct ConsoleHuman;

impl HumanPort for ConsoleHuman {
    fn prompt(&self, text: &str) -> BoxFuture<'_, Result<String>> {
        let text = text.to_string();
        Box::pin(async move {
            tokio::task::spawn_blocking(move || {
                dialoguer::Input::<String>::new()
                    .with_prompt(text)
                    .allow_empty(true)
                    .interact_text()
                    .map_err(|e| WayfarerError::HumanInput(e.to_string()))
            })
            .await
            .map_err(|e| WayfarerError::HumanInput(e.to_string()))?
        })
    }
}
