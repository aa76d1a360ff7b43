//! # Protocol Module
//!
//! Wire types for the job-launch and polling protocol.
//!
//! Every long-running job is launched with a POST that answers a `task_id`,
//! then observed through a uniform status envelope until it reaches a
//! terminal state. All mutable task state lives server-side; the client
//! observes it and never caches anything beyond the last progress snapshot.

use crate::core::report::{RebuildOperationSet, RebuildStats, ThumbSize};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Response to a successful job launch
#[derive(Debug, Clone, Deserialize)]
pub struct TaskHandle {
    pub task_id: String,
}

/// Server-reported job status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Running,
    Completed,
    Failed,
    Cancelled,
}

impl TaskStatus {
    /// True for every status that ends the polling loop
    pub fn is_terminal(&self) -> bool {
        !matches!(self, TaskStatus::Running)
    }
}

/// Uniform polling envelope for scan and rebuild jobs
#[derive(Debug, Clone, Deserialize)]
pub struct StatusEnvelope {
    pub status: TaskStatus,
    #[serde(default)]
    pub progress: Option<Value>,
    #[serde(default)]
    pub result: Option<Value>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Body of `POST {base}/comprehensive-scan`
#[derive(Debug, Clone, Serialize)]
pub struct ScanRequest {
    pub sizes: Vec<ThumbSize>,
    /// Caps how many example orphan files the report may include
    pub sample_limit: u32,
}

/// Body of `POST {base}/rebuild-unified`
#[derive(Debug, Clone, Serialize)]
pub struct RebuildRequest {
    pub operations: RebuildOperationSet,
    pub sizes: Vec<ThumbSize>,
    /// The scan report's opaque breakdown, echoed verbatim
    pub scan_results: Value,
}

/// Progress payload of a scan job
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScanProgressPayload {
    #[serde(default)]
    pub phase: String,
    #[serde(default)]
    pub percentage: f64,
    #[serde(default)]
    pub current: u64,
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub message: Option<String>,
}

/// Progress payload of a rebuild job
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RebuildProgressPayload {
    #[serde(default)]
    pub operation: String,
    #[serde(default)]
    pub percentage: f64,
    #[serde(default)]
    pub stats: RebuildStats,
    #[serde(default)]
    pub current_file: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn status_envelope_decodes_minimal_running() {
        let envelope: StatusEnvelope =
            serde_json::from_value(json!({ "status": "running" })).unwrap();
        assert_eq!(envelope.status, TaskStatus::Running);
        assert!(envelope.progress.is_none());
        assert!(envelope.result.is_none());
        assert!(envelope.error.is_none());
    }

    #[test]
    fn terminal_statuses_are_terminal() {
        assert!(!TaskStatus::Running.is_terminal());
        assert!(TaskStatus::Completed.is_terminal());
        assert!(TaskStatus::Failed.is_terminal());
        assert!(TaskStatus::Cancelled.is_terminal());
    }

    #[test]
    fn scan_request_serializes_wire_names() {
        let request = ScanRequest {
            sizes: vec![ThumbSize::Small, ThumbSize::Xlarge],
            sample_limit: 10,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["sizes"], json!(["small", "xlarge"]));
        assert_eq!(json["sample_limit"], 10);
    }

    #[test]
    fn rebuild_request_carries_operation_flags() {
        let request = RebuildRequest {
            operations: RebuildOperationSet {
                fix_broken_links: true,
                link_orphans: true,
                generate_missing: true,
                delete_true_orphans: false,
            },
            sizes: vec![ThumbSize::Medium],
            scan_results: json!({ "echo": "me" }),
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["operations"]["fix_broken_links"], true);
        assert_eq!(json["operations"]["delete_true_orphans"], false);
        assert_eq!(json["scan_results"]["echo"], "me");
    }

    #[test]
    fn scan_progress_tolerates_sparse_payloads() {
        let progress: ScanProgressPayload =
            serde_json::from_value(json!({ "phase": "disk_scan" })).unwrap();
        assert_eq!(progress.phase, "disk_scan");
        assert_eq!(progress.total, 0);
        assert!(progress.message.is_none());
    }
}
