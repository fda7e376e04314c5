use std::path::PathBuf;

use chrono::Utc;
use serde::Serialize;
use tokio::io::AsyncWriteExt;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use wayfarer_core::event::{EventBus, WorkflowEvent};
use wayfarer_core::types::RunId;

/// JSONL run logger.
///
/// Subscribes to the EventBus and writes one JSON object per line. The
/// file is append-only and flushed per entry, so a crash keeps every line
/// already written.
pub struct RunLogger {
    log_dir: PathBuf,
    level: u8,
}

/// A single log entry written to the JSONL file.
#[derive(Serialize)]
struct LogEntry {
    timestamp: String,
    run_id: String,
    event_type: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    node: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    detail: Option<serde_json::Value>,
}

impl RunLogger {
    /// Logs go to `{log_dir}/{run_id}/{timestamp}.jsonl`.
    /// `level`: 1 = run summary, 2 = per node, 3 = node detail.
    pub fn new(log_dir: PathBuf, level: u8) -> Self {
        Self { log_dir, level }
    }

    /// Subscribe now, then log in a background task. Subscribing before
    /// the spawn means no event published after this call is missed.
    pub fn spawn(
        self,
        event_bus: &EventBus,
        run_id: RunId,
        cancel: CancellationToken,
    ) -> JoinHandle<()> {
        let rx = event_bus.subscribe();
        tokio::spawn(self.run(rx, run_id, cancel))
    }

    /// Write entries until cancellation, `RunFinished` or `RunFailed`.
    pub async fn run(
        self,
        mut rx: broadcast::Receiver<WorkflowEvent>,
        run_id: RunId,
        cancel: CancellationToken,
    ) {
        let run_dir = self.log_dir.join(&run_id.0);
        if let Err(e) = tokio::fs::create_dir_all(&run_dir).await {
            error!(error = %e, "Failed to create log directory");
            return;
        }

        let timestamp = Utc::now().format("%Y%m%d_%H%M%S").to_string();
        let log_path = run_dir.join(format!("{}.jsonl", timestamp));

        let file = match tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_path)
            .await
        {
            Ok(f) => f,
            Err(e) => {
                error!(error = %e, path = %log_path.display(), "Failed to open log file");
                return;
            }
        };

        info!(path = %log_path.display(), "RunLogger started");
        let mut writer = tokio::io::BufWriter::new(file);

        loop {
            tokio::select! {
                // Drain queued events before honouring cancellation.
                biased;
                result = rx.recv() => {
                    match result {
                        Ok(event) => {
                            if let Some(entry) = self.event_to_entry(&run_id.0, &event) {
                                if let Ok(json) = serde_json::to_string(&entry) {
                                    let line = format!("{}\n", json);
                                    if let Err(e) = writer.write_all(line.as_bytes()).await {
                                        error!(error = %e, "Failed to write log entry");
                                        break;
                                    }
                                    if let Err(e) = writer.flush().await {
                                        error!(error = %e, "Failed to flush log");
                                    }
                                }
                            }

                            if matches!(event, WorkflowEvent::RunFinished { .. } | WorkflowEvent::RunFailed { .. }) {
                                break;
                            }
                        }
                        Err(RecvError::Lagged(n)) => {
                            debug!(skipped = n, "RunLogger lagged, skipped events");
                        }
                        Err(RecvError::Closed) => {
                            debug!("EventBus closed, RunLogger stopping");
                            break;
                        }
                    }
                }
                _ = cancel.cancelled() => {
                    debug!("RunLogger cancelled");
                    break;
                }
            }
        }

        writer.flush().await.ok();
        debug!(path = %log_path.display(), "RunLogger finished");
    }

    /// `None` when the event is below the configured level.
    fn event_to_entry(&self, run_id: &str, event: &WorkflowEvent) -> Option<LogEntry> {
        let entry = |event_type: &'static str,
                     node: Option<&str>,
                     detail: Option<serde_json::Value>| LogEntry {
            timestamp: Utc::now().to_rfc3339(),
            run_id: run_id.to_string(),
            event_type,
            node: node.map(String::from),
            detail,
        };

        match event {
            // L1: run summary
            WorkflowEvent::RunStarted { entry: first, .. } => {
                Some(entry("run_started", Some(first.as_str()), None))
            }
            WorkflowEvent::RunFinished {
                approved,
                retry_count,
            } => Some(entry(
                "run_finished",
                None,
                Some(serde_json::json!({ "approved": approved, "retry_count": retry_count })),
            )),
            WorkflowEvent::RunFailed { error } => Some(entry(
                "run_failed",
                None,
                Some(serde_json::json!({ "error": error })),
            )),
            WorkflowEvent::RetryScheduled {
                retry_count,
                banned,
                feedback,
            } => Some(entry(
                "retry_scheduled",
                None,
                Some(serde_json::json!({
                    "retry_count": retry_count,
                    "banned": banned,
                    "feedback": truncate_str(feedback, 300),
                })),
            )),

            // L2: per node
            WorkflowEvent::NodeFinished {
                node,
                elapsed_ms,
                fields,
            } if self.level >= 2 => Some(entry(
                "node_finished",
                Some(node.as_str()),
                Some(serde_json::json!({ "elapsed_ms": elapsed_ms, "fields": fields })),
            )),
            WorkflowEvent::Routed { from, label, to } if self.level >= 2 => Some(entry(
                "routed",
                Some(from.as_str()),
                Some(serde_json::json!({ "label": label, "to": to })),
            )),
            WorkflowEvent::Warning { node, message } if self.level >= 2 => Some(entry(
                "warning",
                Some(node.as_str()),
                Some(serde_json::json!({ "message": truncate_str(message, 300) })),
            )),

            // L3: node detail
            WorkflowEvent::NodeStarted { node } if self.level >= 3 => {
                Some(entry("node_started", Some(node.as_str()), None))
            }
            WorkflowEvent::Thought { node, message } if self.level >= 3 => Some(entry(
                "thought",
                Some(node.as_str()),
                Some(serde_json::json!({ "message": truncate_str(message, 500) })),
            )),
            WorkflowEvent::Action { node, message } if self.level >= 3 => Some(entry(
                "action",
                Some(node.as_str()),
                Some(serde_json::json!({ "message": truncate_str(message, 500) })),
            )),

            _ => None,
        }
    }
}

/// Truncate on a char boundary.
fn truncate_str(s: &str, max_len: usize) -> &str {
    if s.len() <= max_len {
        return s;
    }
    let mut end = max_len;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}
