//! # Workflow Module
//!
//! The four-step controller: SCANNING → OPTIONS → PROCESSING → SUMMARY.
//!
//! One instance holds all workflow state in its fields and is constructed
//! per invocation; there is no shared module-level state. The `&mut self`
//! entry points make duplicate in-flight jobs of the same kind impossible
//! by construction: a second scan cannot start while `open` is still
//! driving the first.
//!
//! A terminal task failure is not a fifth state: the machine exits the
//! in-flight step (a failed scan falls back to closed, a failed rebuild
//! back to options, where the held report allows a manual retry) and
//! records an error banner alongside the step it landed in.

use crate::core::rebuild::RebuildCoordinator;
use crate::core::report::{RebuildSummary, ScanReport, ThumbSize};
use crate::core::scan::ScanCoordinator;
use crate::core::strategy::{resolve_rebuild, Strategy};
use crate::core::task::{CancelFlag, TaskTransport};
use crate::core::EngineConfig;
use crate::error::{MendError, ScanError, WorkflowError};
use crate::events::{Event, EventSender, WorkflowEvent};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// Steps of the reconciliation workflow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowState {
    /// No workflow is active; nothing is retained
    Closed,
    /// The comprehensive scan is in flight
    Scanning,
    /// A report is held and awaiting a strategy choice
    Options,
    /// The rebuild is in flight
    Processing,
    /// Terminal statistics are held for display
    Summary,
}

impl WorkflowState {
    pub fn name(&self) -> &'static str {
        match self {
            WorkflowState::Closed => "closed",
            WorkflowState::Scanning => "scanning",
            WorkflowState::Options => "options",
            WorkflowState::Processing => "processing",
            WorkflowState::Summary => "summary",
        }
    }
}

impl std::fmt::Display for WorkflowState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// The reconciliation workflow instance.
///
/// Construct one per invocation; reopening always starts a fresh scan, and
/// nothing survives `close`.
pub struct Workflow {
    transport: Arc<dyn TaskTransport>,
    config: EngineConfig,
    events: EventSender,
    cancel: CancelFlag,
    id: Uuid,
    state: WorkflowState,
    selected_sizes: Vec<ThumbSize>,
    report: Option<ScanReport>,
    summary: Option<RebuildSummary>,
    banner: Option<String>,
}

impl Workflow {
    pub fn new(
        transport: Arc<dyn TaskTransport>,
        config: EngineConfig,
        events: EventSender,
    ) -> Self {
        Self {
            transport,
            config,
            events,
            cancel: CancelFlag::new(),
            id: Uuid::new_v4(),
            state: WorkflowState::Closed,
            selected_sizes: Vec::new(),
            report: None,
            summary: None,
            banner: None,
        }
    }

    pub fn state(&self) -> WorkflowState {
        self.state
    }

    /// The scan report, while the workflow holds one
    pub fn report(&self) -> Option<&ScanReport> {
        self.report.as_ref()
    }

    /// The rebuild summary, once the workflow reached it
    pub fn summary(&self) -> Option<&RebuildSummary> {
        self.summary.as_ref()
    }

    /// The terminal error banner, if a task failed
    pub fn error_banner(&self) -> Option<&str> {
        self.banner.as_deref()
    }

    /// True while a server job is the workflow's current step
    pub fn is_processing(&self) -> bool {
        matches!(
            self.state,
            WorkflowState::Scanning | WorkflowState::Processing
        )
    }

    /// A cloneable handle for requesting cancellation from another thread
    /// or a signal handler. Cancellation is advisory: the in-flight poll
    /// loop issues one best-effort server cancel and then accepts whichever
    /// terminal status arrives first.
    pub fn cancel_flag(&self) -> CancelFlag {
        self.cancel.clone()
    }

    /// Request cancellation of whatever job is in flight. No-op otherwise.
    pub fn cancel(&self) {
        if self.is_processing() {
            self.cancel.set();
        }
    }

    /// Open the workflow: reset everything and run the comprehensive scan.
    ///
    /// Returns the state the machine settled in: `Options` with a report
    /// attached, or `Closed` if the scan was cancelled. A task failure
    /// raises the error banner and propagates.
    pub async fn open(&mut self, sizes: Vec<ThumbSize>) -> Result<WorkflowState, MendError> {
        // Re-entrant open acts as a reset (fresh scan, nothing retained);
        // a cancel requested before a fresh open stays armed for the scan
        if self.state != WorkflowState::Closed {
            self.cancel.clear();
        }
        self.clear();
        self.selected_sizes = sizes;
        self.set_state(WorkflowState::Scanning);
        tracing::info!(workflow = %self.id, sizes = ?self.selected_sizes, "workflow opened");

        let coordinator = ScanCoordinator::new(self.transport.clone(), &self.config);
        match coordinator
            .run(&self.selected_sizes, &self.events, &self.cancel)
            .await
        {
            Ok(report) => {
                // A cancel the scan outran does not carry into the rebuild
                self.cancel.clear();
                self.report = Some(report);
                self.set_state(WorkflowState::Options);
                Ok(self.state)
            }
            Err(ScanError::Cancelled) => {
                tracing::info!(workflow = %self.id, "scan cancelled, closing");
                self.close();
                Ok(self.state)
            }
            Err(error) => {
                // The failed step is exited; the banner is what remains
                self.set_state(WorkflowState::Closed);
                self.raise_banner(error.to_string());
                Err(error.into())
            }
        }
    }

    /// Resolve the strategy and run the rebuild.
    ///
    /// Valid only in `Options`. An empty size selection is a local,
    /// recoverable validation error: no network call is made and the state
    /// stays `Options`. Ends in `Summary` on both `completed` and
    /// `cancelled` terminals.
    pub async fn start_rebuild(
        &mut self,
        strategy: &Strategy,
        sizes: &[ThumbSize],
    ) -> Result<WorkflowState, MendError> {
        if self.state != WorkflowState::Options {
            return Err(WorkflowError::InvalidState {
                state: self.state.name(),
            }
            .into());
        }
        let breakdown = self
            .report
            .as_ref()
            .ok_or(WorkflowError::NoReport)?
            .breakdown
            .clone();

        // Local validation happens before any transition
        let resolved = resolve_rebuild(strategy, sizes)?;

        // A retry after a failed attempt starts with a clean banner
        self.banner = None;
        self.set_state(WorkflowState::Processing);
        tracing::info!(workflow = %self.id, operations = ?resolved.operations, "rebuild starting");

        let coordinator = RebuildCoordinator::new(self.transport.clone(), &self.config);
        match coordinator
            .run(&resolved, breakdown, &self.events, &self.cancel)
            .await
        {
            Ok(summary) => {
                self.summary = Some(summary);
                self.set_state(WorkflowState::Summary);
                Ok(self.state)
            }
            Err(error) => {
                // Back to options: the report is still held and a manual
                // retry stays possible
                self.set_state(WorkflowState::Options);
                self.raise_banner(error.to_string());
                Err(error.into())
            }
        }
    }

    /// Close the workflow and clear everything it accumulated.
    ///
    /// The workflow is not resumable: reopening always starts a fresh scan.
    pub fn close(&mut self) {
        tracing::info!(workflow = %self.id, "workflow closed");
        self.clear();
        self.cancel.clear();
        self.state = WorkflowState::Closed;
        self.events.send(Event::Workflow(WorkflowEvent::Closed));
    }

    fn clear(&mut self) {
        self.report = None;
        self.summary = None;
        self.banner = None;
        self.selected_sizes.clear();
    }

    fn set_state(&mut self, state: WorkflowState) {
        self.state = state;
        self.events
            .send(Event::Workflow(WorkflowEvent::StateChanged { state }));
    }

    fn raise_banner(&mut self, message: String) {
        tracing::warn!(workflow = %self.id, %message, "workflow error banner");
        self.banner = Some(message.clone());
        self.events
            .send(Event::Workflow(WorkflowEvent::ErrorBanner { message }));
    }
}
