// crates/branch-gate-core/src/core/branch.rs
// ============================================================================
// Module: Branch Classification
// Description: Derived branch classes under a branching policy.
// Purpose: Map a branch name to the class used to select rules.
// Dependencies: crate::core::policy, serde
// ============================================================================

//! ## Overview
//! Classification is a pure function of the branch name and the policy. The
//! precedence is fixed: protected (exact match) before integration (exact
//! match) before feature (prefix) before hotfix (prefix), with everything
//! else falling through to [`BranchClass::Other`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

use crate::core::policy::PolicyConfig;

// ============================================================================
// SECTION: Branch Class
// ============================================================================

/// Derived classification of a branch name.
///
/// # Invariants
/// - Variants are stable for serialization and client rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BranchClass {
    /// Listed in the protected set.
    Protected,
    /// The configured integration branch.
    Integration,
    /// Starts with the feature prefix.
    Feature,
    /// Starts with the hotfix prefix.
    Hotfix,
    /// Anything else, including the unknown sentinel.
    Other,
}

impl BranchClass {
    /// Returns a stable label for the class.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Protected => "protected",
            Self::Integration => "integration",
            Self::Feature => "feature",
            Self::Hotfix => "hotfix",
            Self::Other => "other",
        }
    }

    /// Returns true for feature and hotfix branches.
    #[must_use]
    pub const fn is_work_branch(self) -> bool {
        matches!(self, Self::Feature | Self::Hotfix)
    }
}

impl fmt::Display for BranchClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classifies a branch name under the policy.
#[must_use]
pub fn classify_branch(branch: &str, policy: &PolicyConfig) -> BranchClass {
    if policy.is_protected(branch) {
        BranchClass::Protected
    } else if branch == policy.integration_branch {
        BranchClass::Integration
    } else if !policy.feature_prefix.is_empty() && branch.starts_with(&policy.feature_prefix) {
        BranchClass::Feature
    } else if !policy.hotfix_prefix.is_empty() && branch.starts_with(&policy.hotfix_prefix) {
        BranchClass::Hotfix
    } else {
        BranchClass::Other
    }
}
