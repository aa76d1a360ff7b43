//! Event type definitions for progress reporting.

use crate::core::report::{RebuildOperationSet, RebuildStats, RebuildSummary, ThumbSize};
use crate::core::workflow::WorkflowState;
use serde::{Deserialize, Serialize};

/// All events emitted by the reconciliation workflow
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    /// Workflow-level events
    Workflow(WorkflowEvent),
    /// Scan phase events
    Scan(ScanEvent),
    /// Rebuild phase events
    Rebuild(RebuildEvent),
}

/// Workflow-level events
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum WorkflowEvent {
    /// The state machine moved to a new step
    StateChanged { state: WorkflowState },
    /// A terminal error banner was raised; only close is valid now
    ErrorBanner { message: String },
    /// The workflow was closed and its state cleared
    Closed,
}

/// Named phases of the comprehensive scan
///
/// Phase names the client does not recognize are dropped before an event is
/// emitted, so a newer server can add phases without breaking older clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScanPhase {
    DatabaseValidation,
    DiskScan,
    OrphanMatching,
}

impl ScanPhase {
    /// Map a wire phase name; unknown names yield None (forward-compatible
    /// no-op, not an error)
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "database_validation" => Some(ScanPhase::DatabaseValidation),
            "disk_scan" => Some(ScanPhase::DiskScan),
            "orphan_matching" => Some(ScanPhase::OrphanMatching),
            _ => None,
        }
    }
}

impl std::fmt::Display for ScanPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScanPhase::DatabaseValidation => write!(f, "Validating database"),
            ScanPhase::DiskScan => write!(f, "Scanning disk"),
            ScanPhase::OrphanMatching => write!(f, "Matching orphans"),
        }
    }
}

/// Events during the scan phase
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ScanEvent {
    /// Scan task launched
    Started { sizes: Vec<ThumbSize> },
    /// The scan moved to a new phase
    PhaseChanged { phase: ScanPhase },
    /// Progress snapshot (duplicates included; last write wins)
    Progress(ScanProgress),
    /// Scan completed with a report
    Completed {
        repairable: u64,
        true_orphans: u64,
    },
    /// Scan reached terminal failure
    Failed { message: String },
}

/// Progress snapshot during the scan
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanProgress {
    /// Recognized phase, if any
    pub phase: Option<ScanPhase>,
    pub percentage: f64,
    pub current: u64,
    pub total: u64,
    pub message: Option<String>,
}

/// Named operations of the rebuild job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RebuildOperationKind {
    FixingBrokenLinks,
    LinkingOrphans,
    GeneratingMissing,
}

impl RebuildOperationKind {
    /// Map a wire operation name; unknown names yield None
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "fixing_broken_links" => Some(RebuildOperationKind::FixingBrokenLinks),
            "linking_orphans" => Some(RebuildOperationKind::LinkingOrphans),
            "generating_missing" => Some(RebuildOperationKind::GeneratingMissing),
            _ => None,
        }
    }
}

impl std::fmt::Display for RebuildOperationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RebuildOperationKind::FixingBrokenLinks => write!(f, "Fixing broken links"),
            RebuildOperationKind::LinkingOrphans => write!(f, "Linking orphans"),
            RebuildOperationKind::GeneratingMissing => write!(f, "Generating missing thumbnails"),
        }
    }
}

/// Events during the rebuild phase
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum RebuildEvent {
    /// Rebuild task launched
    Started {
        operations: RebuildOperationSet,
        sizes: Vec<ThumbSize>,
    },
    /// The rebuild moved to a new named operation
    OperationChanged { operation: RebuildOperationKind },
    /// Progress snapshot with mirrored running counters (display only; the
    /// authoritative counts arrive with the terminal result)
    Progress(RebuildProgress),
    /// Rebuild completed
    Completed { summary: RebuildSummary },
    /// Rebuild was cancelled; partial statistics are still a success
    Cancelled { summary: RebuildSummary },
    /// Rebuild reached terminal failure
    Failed { message: String },
}

/// Progress snapshot during the rebuild
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RebuildProgress {
    /// Recognized operation, if any
    pub operation: Option<RebuildOperationKind>,
    pub percentage: f64,
    pub stats: RebuildStats,
    pub current_file: Option<String>,
}
