//! # Rebuild Module
//!
//! Drives the unified rebuild job: fixing broken links, linking orphans and
//! generating missing thumbnails in one server-side pass. The scan report's
//! opaque breakdown is echoed back on launch so the server can skip
//! re-deriving the categorization.

use crate::core::report::RebuildSummary;
use crate::core::strategy::ResolvedRebuild;
use crate::core::task::{CancelFlag, TaskClient, TaskTransport, TerminalOutcome};
use crate::core::EngineConfig;
use crate::error::RebuildError;
use crate::events::{Event, EventSender, RebuildEvent, RebuildOperationKind, RebuildProgress};
use crate::protocol::{RebuildProgressPayload, RebuildRequest};
use serde_json::Value;
use std::sync::Arc;

/// Launches the rebuild task and polls it to its terminal status.
pub struct RebuildCoordinator {
    client: TaskClient,
    transport: Arc<dyn TaskTransport>,
}

impl RebuildCoordinator {
    pub fn new(transport: Arc<dyn TaskTransport>, config: &EngineConfig) -> Self {
        Self {
            client: TaskClient::new(transport.clone(), config.poll_interval),
            transport,
        }
    }

    /// Run the rebuild to its terminal status.
    ///
    /// Both `completed` and `cancelled` produce a summary: a cancelled
    /// rebuild still did real work and its partial statistics are shown,
    /// not discarded. Progress counters along the way are display-only
    /// mirrors; the counts that matter are fixed from the terminal result.
    pub async fn run(
        &self,
        resolved: &ResolvedRebuild,
        scan_results: Value,
        events: &EventSender,
        cancel: &CancelFlag,
    ) -> Result<RebuildSummary, RebuildError> {
        let request = RebuildRequest {
            operations: resolved.operations,
            sizes: resolved.sizes.clone(),
            scan_results,
        };
        let handle = self
            .transport
            .launch_rebuild(&request)
            .await
            .map_err(|source| RebuildError::Launch { source })?;

        tracing::info!(
            task_id = %handle.task_id,
            operations = ?resolved.operations,
            "rebuild launched"
        );
        events.send(Event::Rebuild(RebuildEvent::Started {
            operations: resolved.operations,
            sizes: resolved.sizes.clone(),
        }));

        let mut last_operation: Option<RebuildOperationKind> = None;
        let outcome = self
            .client
            .poll(&handle.task_id, cancel, |raw| {
                let payload: RebuildProgressPayload = match serde_json::from_value(raw.clone()) {
                    Ok(payload) => payload,
                    Err(_) => return,
                };

                let operation = RebuildOperationKind::parse(&payload.operation);
                if let Some(operation) = operation {
                    if last_operation != Some(operation) {
                        last_operation = Some(operation);
                        events.send(Event::Rebuild(RebuildEvent::OperationChanged { operation }));
                    }
                }

                events.send(Event::Rebuild(RebuildEvent::Progress(RebuildProgress {
                    operation,
                    percentage: payload.percentage,
                    stats: payload.stats,
                    current_file: payload.current_file,
                })));
            })
            .await;

        match outcome {
            TerminalOutcome::Completed(result) => {
                let summary = RebuildSummary::from_terminal(result, false);
                tracing::info!(
                    completed = summary.completed,
                    failed = summary.stats.failed,
                    "rebuild completed"
                );
                events.send(Event::Rebuild(RebuildEvent::Completed {
                    summary: summary.clone(),
                }));
                Ok(summary)
            }
            TerminalOutcome::Cancelled(result) => {
                let summary = RebuildSummary::from_terminal(result, true);
                tracing::info!(completed = summary.completed, "rebuild cancelled");
                events.send(Event::Rebuild(RebuildEvent::Cancelled {
                    summary: summary.clone(),
                }));
                Ok(summary)
            }
            TerminalOutcome::Failed { message } => {
                let message = message.unwrap_or_else(|| "Rebuild failed".to_string());
                events.send(Event::Rebuild(RebuildEvent::Failed {
                    message: message.clone(),
                }));
                Err(RebuildError::Failed { message })
            }
        }
    }
}
