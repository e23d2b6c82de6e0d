// crates/branch-gate-core/src/core/snapshot.rs
// ============================================================================
// Module: Repository Snapshot
// Description: Point-in-time repository facts consumed by rule evaluation.
// Purpose: Carry branch, cleanliness, and ancestry facts with safe sentinels.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! A [`RepositorySnapshot`] is produced fresh for every evaluation by a
//! repository provider. Providers never fail outright: when the repository
//! cannot be inspected they return [`RepositorySnapshot::unavailable`] so the
//! rule engine always receives a well-formed value.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Sentinel branch name used when the current branch cannot be determined.
pub const UNKNOWN_BRANCH: &str = "unknown";

// ============================================================================
// SECTION: Snapshot
// ============================================================================

/// Point-in-time facts about the repository.
///
/// # Invariants
/// - `current_branch` is [`UNKNOWN_BRANCH`] when undeterminable.
/// - `has_multiple_parents` is `None` when the ancestry fact is unavailable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepositorySnapshot {
    /// Current branch name.
    pub current_branch: String,
    /// True when the working tree has no pending changes.
    pub is_clean: bool,
    /// True when HEAD is a merge commit.
    #[serde(default)]
    pub has_multiple_parents: Option<bool>,
}

impl RepositorySnapshot {
    /// Creates a snapshot with known facts.
    #[must_use]
    pub fn new(
        current_branch: impl Into<String>,
        is_clean: bool,
        has_multiple_parents: Option<bool>,
    ) -> Self {
        Self {
            current_branch: current_branch.into(),
            is_clean,
            has_multiple_parents,
        }
    }

    /// Returns the sentinel-safe snapshot used when no repository is present.
    #[must_use]
    pub fn unavailable() -> Self {
        Self {
            current_branch: UNKNOWN_BRANCH.to_string(),
            is_clean: true,
            has_multiple_parents: None,
        }
    }

    /// Returns true when the branch could not be determined.
    #[must_use]
    pub fn is_branch_unknown(&self) -> bool {
        self.current_branch == UNKNOWN_BRANCH
    }
}

impl Default for RepositorySnapshot {
    fn default() -> Self {
        Self::unavailable()
    }
}
