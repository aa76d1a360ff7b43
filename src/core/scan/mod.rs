//! # Scan Module
//!
//! Drives the comprehensive scan: database validation, then the disk scan,
//! then orphan matching. Each poll snapshot is translated into events; the
//! terminal `completed` envelope carries the categorized [`ScanReport`].

use crate::core::report::{ScanReport, ThumbSize};
use crate::core::task::{CancelFlag, TaskClient, TaskTransport, TerminalOutcome};
use crate::core::EngineConfig;
use crate::error::ScanError;
use crate::events::{Event, EventSender, ScanEvent, ScanPhase, ScanProgress};
use crate::protocol::{ScanProgressPayload, ScanRequest};
use std::sync::Arc;

/// Launches the scan task and polls it to its terminal status.
pub struct ScanCoordinator {
    client: TaskClient,
    transport: Arc<dyn TaskTransport>,
    sample_limit: u32,
}

impl ScanCoordinator {
    pub fn new(transport: Arc<dyn TaskTransport>, config: &EngineConfig) -> Self {
        Self {
            client: TaskClient::new(transport.clone(), config.poll_interval),
            transport,
            sample_limit: config.sample_limit,
        }
    }

    /// Run the scan to completion and extract its report.
    ///
    /// Cancellation surfaces as [`ScanError::Cancelled`]; the workflow maps
    /// it back to the closed state rather than an error banner.
    pub async fn run(
        &self,
        sizes: &[ThumbSize],
        events: &EventSender,
        cancel: &CancelFlag,
    ) -> Result<ScanReport, ScanError> {
        let request = ScanRequest {
            sizes: sizes.to_vec(),
            sample_limit: self.sample_limit,
        };
        let handle = self
            .transport
            .launch_scan(&request)
            .await
            .map_err(|source| ScanError::Launch { source })?;

        tracing::info!(task_id = %handle.task_id, ?sizes, "comprehensive scan launched");
        events.send(Event::Scan(ScanEvent::Started {
            sizes: sizes.to_vec(),
        }));

        let mut last_phase: Option<ScanPhase> = None;
        let outcome = self
            .client
            .poll(&handle.task_id, cancel, |raw| {
                let payload: ScanProgressPayload = match serde_json::from_value(raw.clone()) {
                    Ok(payload) => payload,
                    // A malformed snapshot is skipped; the next poll replaces it
                    Err(_) => return,
                };

                let phase = ScanPhase::parse(&payload.phase);
                if let Some(phase) = phase {
                    if last_phase != Some(phase) {
                        last_phase = Some(phase);
                        events.send(Event::Scan(ScanEvent::PhaseChanged { phase }));
                    }
                }

                events.send(Event::Scan(ScanEvent::Progress(ScanProgress {
                    phase,
                    percentage: payload.percentage,
                    current: payload.current,
                    total: payload.total,
                    message: payload.message,
                })));
            })
            .await;

        match outcome {
            TerminalOutcome::Completed(result) => {
                let value = result.ok_or(ScanError::MissingReport)?;
                let report: ScanReport = serde_json::from_value(value)
                    .map_err(|source| ScanError::BadReport { source })?;

                tracing::info!(
                    repairable = report.repairable_total(),
                    true_orphans = report.true_orphans.count,
                    "scan completed"
                );
                events.send(Event::Scan(ScanEvent::Completed {
                    repairable: report.repairable_total(),
                    true_orphans: report.true_orphans.count,
                }));
                Ok(report)
            }
            TerminalOutcome::Cancelled(_) => Err(ScanError::Cancelled),
            TerminalOutcome::Failed { message } => {
                let message = message.unwrap_or_else(|| "Scan failed".to_string());
                events.send(Event::Scan(ScanEvent::Failed {
                    message: message.clone(),
                }));
                Err(ScanError::Failed { message })
            }
        }
    }
}
