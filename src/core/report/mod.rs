//! # Report Module
//!
//! Domain types for scan reports and rebuild results.
//!
//! ## Categories
//! A completed scan sorts the library into four repairable categories plus
//! the true orphans, which are kept apart because no automatic action is
//! safe for them:
//! - `valid` - record and file agree, nothing to do
//! - `broken_links` - a record points at a file that is gone
//! - `linkable_orphans` - a file whose name resolves to a known source image
//! - `missing` - a source image with no thumbnail of a requested size
//! - true orphans - files with no record and no resolvable parent

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Thumbnail size tags understood by the server
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum ThumbSize {
    Small,
    Medium,
    Large,
    Xlarge,
}

impl ThumbSize {
    /// All sizes, in ascending order
    pub const ALL: [ThumbSize; 4] = [
        ThumbSize::Small,
        ThumbSize::Medium,
        ThumbSize::Large,
        ThumbSize::Xlarge,
    ];

    /// The wire name of this size
    pub fn as_str(&self) -> &'static str {
        match self {
            ThumbSize::Small => "small",
            ThumbSize::Medium => "medium",
            ThumbSize::Large => "large",
            ThumbSize::Xlarge => "xlarge",
        }
    }
}

impl std::fmt::Display for ThumbSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-category counts from a completed scan
///
/// The four categories do not have to partition the library: true orphans
/// are tracked separately, and category names this client does not know
/// about are ignored on decode.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CategoryCounts {
    #[serde(default)]
    pub valid: u64,
    #[serde(default)]
    pub broken_links: u64,
    #[serde(default)]
    pub linkable_orphans: u64,
    #[serde(default)]
    pub missing: u64,
}

impl CategoryCounts {
    /// Total operations a rebuild could perform
    pub fn repairable(&self) -> u64 {
        self.broken_links + self.linkable_orphans + self.missing
    }
}

/// One example file from the true-orphan sample list
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrphanSample {
    pub path: String,
    #[serde(default)]
    pub file_size: u64,
}

/// Thumbnails with no resolvable parent record
///
/// The sample list is capped server-side; this client accepts whatever
/// length the report returns.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrueOrphans {
    #[serde(default)]
    pub count: u64,
    #[serde(default)]
    pub size_bytes: u64,
    #[serde(default)]
    pub sample_files: Vec<OrphanSample>,
}

/// Result of a completed comprehensive scan
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScanReport {
    #[serde(default)]
    pub categories: CategoryCounts,
    #[serde(default)]
    pub true_orphans: TrueOrphans,
    /// Advisory estimate, display only
    #[serde(default)]
    pub estimated_time_seconds: f64,
    /// Opaque payload echoed back verbatim on rebuild launch so the server
    /// can skip re-scanning
    #[serde(default)]
    pub breakdown: Value,
}

impl ScanReport {
    /// Total repairable operations across the three actionable categories
    pub fn repairable_total(&self) -> u64 {
        self.categories.repairable()
    }

    /// True when the scan found nothing worth rebuilding
    pub fn is_clean(&self) -> bool {
        self.repairable_total() == 0 && self.true_orphans.count == 0
    }
}

/// The resolved instruction set for a rebuild job
///
/// `delete_true_orphans` is reserved: the field travels on the wire but no
/// constructor in this crate sets it to true.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RebuildOperationSet {
    pub fix_broken_links: bool,
    pub link_orphans: bool,
    pub generate_missing: bool,
    pub delete_true_orphans: bool,
}

impl RebuildOperationSet {
    /// True when no operation is enabled (the rebuild would be a no-op)
    pub fn is_empty(&self) -> bool {
        !self.fix_broken_links && !self.link_orphans && !self.generate_missing
    }
}

/// Running counters mirrored from rebuild progress and fixed at terminal
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RebuildStats {
    #[serde(default)]
    pub fixed_links: u64,
    #[serde(default)]
    pub linked_orphans: u64,
    #[serde(default)]
    pub generated: u64,
    #[serde(default)]
    pub failed: u64,
}

/// One per-item failure from a rebuild
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RebuildErrorRecord {
    #[serde(default)]
    pub operation: String,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub image_id: Option<String>,
    #[serde(default)]
    pub error: String,
}

/// Terminal statistics of a rebuild job
///
/// Built exactly once at the terminal boundary with every absent field
/// defaulted to zero, so no display layer ever re-derives defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RebuildSummary {
    pub stats: RebuildStats,
    pub errors: Vec<RebuildErrorRecord>,
    /// Total operations processed
    pub completed: u64,
    /// Wall-clock time reported by the server
    pub duration_seconds: f64,
    /// True when the job ended via cancellation (still a success: partial
    /// statistics are displayed, not discarded)
    pub was_cancelled: bool,
    pub finished_at: chrono::DateTime<chrono::Utc>,
}

impl RebuildSummary {
    /// Build the summary from a terminal `result` payload.
    ///
    /// A missing or malformed payload yields all-zero counters rather than
    /// an error; a cancelled job with no result still gets a summary.
    pub fn from_terminal(result: Option<Value>, was_cancelled: bool) -> Self {
        let payload: TerminalResultPayload = result
            .map(|value| serde_json::from_value(value).unwrap_or_default())
            .unwrap_or_default();

        Self {
            stats: payload.stats,
            errors: payload.errors,
            completed: payload.completed,
            duration_seconds: payload.duration_seconds,
            was_cancelled,
            finished_at: chrono::Utc::now(),
        }
    }

    /// True when the job finished with per-item failures (warning styling,
    /// not an error state)
    pub fn has_failures(&self) -> bool {
        self.stats.failed > 0
    }
}

/// Wire shape of the rebuild terminal `result` envelope
#[derive(Debug, Clone, Default, Deserialize)]
struct TerminalResultPayload {
    #[serde(default)]
    stats: RebuildStats,
    #[serde(default)]
    errors: Vec<RebuildErrorRecord>,
    #[serde(default)]
    completed: u64,
    #[serde(default)]
    duration_seconds: f64,
}
