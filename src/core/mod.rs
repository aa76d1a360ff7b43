//! # Core Module
//!
//! The GUI-agnostic reconciliation and rebuild engine.
//!
//! ## Modules
//! - `task` - Launches server jobs and polls them to terminal status
//! - `report` - Scan reports, operation sets, rebuild summaries
//! - `scan` - Drives the comprehensive scan and extracts its report
//! - `strategy` - Resolves the operator's choice into rebuild operations
//! - `rebuild` - Drives the rebuild and fixes the terminal statistics
//! - `workflow` - The four-step state machine sequencing it all

pub mod rebuild;
pub mod report;
pub mod scan;
pub mod strategy;
pub mod task;
pub mod workflow;

// Re-export commonly used types
pub use report::{RebuildOperationSet, RebuildStats, RebuildSummary, ScanReport, ThumbSize};
pub use strategy::{CustomToggles, Strategy};
pub use task::{CancelFlag, HttpTransport, TaskTransport};
pub use workflow::{Workflow, WorkflowState};

use std::time::Duration;

/// Fixed polling cadence for both the scan and the rebuild loops
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// How many example orphan files the server may include in a report
pub const DEFAULT_SAMPLE_LIMIT: u32 = 10;

/// Engine configuration
///
/// The poll interval is configurable for tests; production callers keep the
/// 500 ms default, which the server's load characteristics assume.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub poll_interval: Duration,
    pub sample_limit: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            sample_limit: DEFAULT_SAMPLE_LIMIT,
        }
    }
}

impl EngineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn sample_limit(mut self, limit: u32) -> Self {
        self.sample_limit = limit;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_matches_protocol_expectations() {
        let config = EngineConfig::default();
        assert_eq!(config.poll_interval, Duration::from_millis(500));
        assert_eq!(config.sample_limit, 10);
    }

    #[test]
    fn builder_overrides_apply() {
        let config = EngineConfig::new()
            .poll_interval(Duration::from_millis(5))
            .sample_limit(3);
        assert_eq!(config.poll_interval, Duration::from_millis(5));
        assert_eq!(config.sample_limit, 3);
    }
}
