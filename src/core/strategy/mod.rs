//! # Strategy Module
//!
//! Turns the operator's repair choice into a concrete rebuild instruction.
//!
//! Two strategies exist: `auto`, the safe default that fixes everything and
//! never deletes data, and `custom`, which takes each operation flag from an
//! explicit toggle. Toggles are independent of the scan's category counts -
//! enabling an operation whose category is empty is a harmless no-op for
//! the rebuild job, not an error.

use crate::core::report::{RebuildOperationSet, ThumbSize};
use crate::error::RebuildError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// The operator's repair strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Fix everything that is safe to fix automatically
    Auto,
    /// Per-operation selection
    Custom(CustomToggles),
}

/// Explicit per-operation toggles for the custom strategy
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomToggles {
    pub fix_broken_links: bool,
    pub link_orphans: bool,
    pub generate_missing: bool,
}

impl Strategy {
    /// Resolve the strategy into the operation set sent to the server.
    ///
    /// `delete_true_orphans` is always false: true orphans are candidates
    /// for manual deletion only, never touched automatically.
    pub fn resolve(&self) -> RebuildOperationSet {
        match self {
            Strategy::Auto => RebuildOperationSet {
                fix_broken_links: true,
                link_orphans: true,
                generate_missing: true,
                delete_true_orphans: false,
            },
            Strategy::Custom(toggles) => RebuildOperationSet {
                fix_broken_links: toggles.fix_broken_links,
                link_orphans: toggles.link_orphans,
                generate_missing: toggles.generate_missing,
                delete_true_orphans: false,
            },
        }
    }
}

/// A validated rebuild instruction, ready to launch
#[derive(Debug, Clone)]
pub struct ResolvedRebuild {
    pub operations: RebuildOperationSet,
    /// De-duplicated, ordered, guaranteed non-empty
    pub sizes: Vec<ThumbSize>,
}

/// Resolve a strategy and size selection into a launchable instruction.
///
/// Fails locally (never reaching the network) when no size is selected.
pub fn resolve_rebuild(
    strategy: &Strategy,
    sizes: &[ThumbSize],
) -> Result<ResolvedRebuild, RebuildError> {
    let unique: BTreeSet<ThumbSize> = sizes.iter().copied().collect();
    if unique.is_empty() {
        return Err(RebuildError::NoSizesSelected);
    }

    Ok(ResolvedRebuild {
        operations: strategy.resolve(),
        sizes: unique.into_iter().collect(),
    })
}
