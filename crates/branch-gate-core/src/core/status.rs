// crates/branch-gate-core/src/core/status.rs
// ============================================================================
// Module: Repository Status
// Description: Policy-annotated view of the current repository state.
// Purpose: Summarize branch class, cleanliness, and pending changes.
// Dependencies: crate::core::{branch, policy, snapshot}, serde
// ============================================================================

//! ## Overview
//! [`RepositoryStatus`] combines a [`RepositorySnapshot`] with the effective
//! policy so clients can render the repository state without re-deriving
//! branch classes.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::core::branch::BranchClass;
use crate::core::branch::classify_branch;
use crate::core::policy::PolicyConfig;
use crate::core::snapshot::RepositorySnapshot;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Entry reported in place of modified files when listing fails.
pub const MODIFIED_FILES_UNAVAILABLE: &str = "unable to list modified files";

// ============================================================================
// SECTION: Status
// ============================================================================

/// Repository state annotated with policy facts.
///
/// # Invariants
/// - `branch_class` is derived from `branch` under `policy`.
/// - `modified_files` holds porcelain-style `XY path` entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepositoryStatus {
    /// Current branch name.
    pub branch: String,
    /// Branch classification.
    pub branch_class: BranchClass,
    /// True when the working tree is clean.
    pub is_clean: bool,
    /// True when the branch is protected.
    pub is_protected: bool,
    /// True when HEAD is a merge commit, if known.
    pub has_multiple_parents: Option<bool>,
    /// Pending changes in the working tree.
    pub modified_files: Vec<String>,
    /// Advisory warnings about the current state.
    pub warnings: Vec<String>,
    /// Effective policy.
    pub policy: PolicyConfig,
}

impl RepositoryStatus {
    /// Builds a status view from a snapshot, listed changes, and policy.
    #[must_use]
    pub fn build(
        snapshot: &RepositorySnapshot,
        modified_files: Vec<String>,
        policy: &PolicyConfig,
    ) -> Self {
        let branch_class = classify_branch(&snapshot.current_branch, policy);
        let is_protected = branch_class == BranchClass::Protected;
        let mut warnings = Vec::new();
        if snapshot.is_branch_unknown() {
            warnings.push("current branch could not be determined".to_string());
        } else if branch_class == BranchClass::Other {
            warnings.push(format!(
                "branch {} does not follow the {}<name> or {}<name> naming convention",
                snapshot.current_branch, policy.feature_prefix, policy.hotfix_prefix
            ));
        }
        if is_protected {
            warnings.push(format!("{} is a protected branch", snapshot.current_branch));
        }
        if !snapshot.is_clean {
            warnings.push("working tree has uncommitted changes".to_string());
        }
        Self {
            branch: snapshot.current_branch.clone(),
            branch_class,
            is_clean: snapshot.is_clean,
            is_protected,
            has_multiple_parents: snapshot.has_multiple_parents,
            modified_files,
            warnings,
            policy: policy.clone(),
        }
    }
}
