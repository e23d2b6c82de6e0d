// crates/branch-gate-core/src/core/policy.rs
// ============================================================================
// Module: Branch Gate Policy Model
// Description: Branching policy configuration and severity levels.
// Purpose: Provide the governing ruleset consumed by the rule engine.
// Dependencies: serde, thiserror
// ============================================================================

//! ## Overview
//! [`PolicyConfig`] is the governing ruleset for branch gating: protected
//! branches, naming prefixes, the integration branch, and commit-message
//! rules. The wire and on-disk forms use camelCase keys so policy documents
//! stay compatible with existing `.gitrules.yaml` files.
//!
//! Invariants:
//! - Feature and hotfix prefixes are non-empty, distinct, and neither is a
//!   prefix of the other (see [`PolicyConfig::validate`]).
//! - A branch listed as protected is treated as protected even when it is
//!   also the integration branch.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;
use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

// ============================================================================
// SECTION: Defaults
// ============================================================================

/// Default protected branch names.
pub const DEFAULT_PROTECTED_BRANCHES: &[&str] = &["main", "master"];
/// Default feature branch prefix.
pub const DEFAULT_FEATURE_PREFIX: &str = "feature/";
/// Default hotfix branch prefix.
pub const DEFAULT_HOTFIX_PREFIX: &str = "hotfix/";
/// Default integration branch name.
pub const DEFAULT_INTEGRATION_BRANCH: &str = "develop";
/// Default primary (main-like) protected branch name.
pub const DEFAULT_PRIMARY_BRANCH: &str = "main";
/// Default commit-type tokens accepted by commit-message validation.
pub const DEFAULT_COMMIT_TYPES: &[&str] =
    &["feat", "fix", "docs", "style", "refactor", "test", "chore"];

// ============================================================================
// SECTION: Severity
// ============================================================================

/// Verdict severity level.
///
/// # Invariants
/// - Variants are stable for serialization and client rendering.
/// - `Info` implies no remediation is needed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Informational acknowledgement.
    Info,
    /// Allowed, but the operation deviates from the recommended workflow.
    Warn,
    /// Policy violation.
    Error,
}

impl Severity {
    /// Returns a stable label for the severity.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// SECTION: Policy Configuration
// ============================================================================

/// Branching policy governing rule evaluation.
///
/// # Invariants
/// - See [`PolicyConfig::validate`] for the prefix invariants.
/// - Set fields are membership-only; order is irrelevant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyConfig {
    /// Branches that never receive direct commits or pushes.
    pub protected_branches: BTreeSet<String>,
    /// Prefix identifying feature branches.
    pub feature_prefix: String,
    /// Prefix identifying emergency-fix branches.
    pub hotfix_prefix: String,
    /// Branch that feature and hotfix work merges into first.
    pub integration_branch: String,
    /// Commit-type tokens accepted in `type: description` messages.
    pub allowed_commit_types: BTreeSet<String>,
    /// Distinguished protected branch subject to the merge-commit push check.
    pub primary_branch: String,
    /// Allows direct pushes to protected branches when set.
    pub allow_direct_push: bool,
    /// Requires a clean tree before pushing the integration branch.
    pub require_clean_working_tree: bool,
    /// Enables commit-message format validation.
    pub enforce_commit_message_format: bool,
    /// Severity reported for direct commits on the integration branch.
    pub integration_commit_severity: Severity,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            protected_branches: to_set(DEFAULT_PROTECTED_BRANCHES),
            feature_prefix: DEFAULT_FEATURE_PREFIX.to_string(),
            hotfix_prefix: DEFAULT_HOTFIX_PREFIX.to_string(),
            integration_branch: DEFAULT_INTEGRATION_BRANCH.to_string(),
            allowed_commit_types: to_set(DEFAULT_COMMIT_TYPES),
            primary_branch: DEFAULT_PRIMARY_BRANCH.to_string(),
            allow_direct_push: false,
            require_clean_working_tree: true,
            enforce_commit_message_format: true,
            integration_commit_severity: Severity::Warn,
        }
    }
}

impl PolicyConfig {
    /// Returns true when the branch is listed as protected.
    #[must_use]
    pub fn is_protected(&self, branch: &str) -> bool {
        self.protected_branches.contains(branch)
    }

    /// Returns true when the commit type token is allowed.
    #[must_use]
    pub fn allows_commit_type(&self, kind: &str) -> bool {
        self.allowed_commit_types.contains(kind)
    }

    /// Returns the allowed commit types joined for display.
    #[must_use]
    pub fn commit_types_label(&self) -> String {
        self.allowed_commit_types.iter().map(String::as_str).collect::<Vec<_>>().join(", ")
    }

    /// Validates the policy invariants.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyValidationError`] when prefixes are empty or overlap,
    /// when the integration branch name is empty, or when integration commits
    /// are configured with `error` severity.
    pub fn validate(&self) -> Result<(), PolicyValidationError> {
        if self.feature_prefix.is_empty() {
            return Err(PolicyValidationError::EmptyPrefix("featurePrefix"));
        }
        if self.hotfix_prefix.is_empty() {
            return Err(PolicyValidationError::EmptyPrefix("hotfixPrefix"));
        }
        if self.feature_prefix.starts_with(&self.hotfix_prefix)
            || self.hotfix_prefix.starts_with(&self.feature_prefix)
        {
            return Err(PolicyValidationError::OverlappingPrefixes {
                feature: self.feature_prefix.clone(),
                hotfix: self.hotfix_prefix.clone(),
            });
        }
        if self.integration_branch.trim().is_empty() {
            return Err(PolicyValidationError::EmptyIntegrationBranch);
        }
        if self.integration_commit_severity == Severity::Error {
            return Err(PolicyValidationError::IntegrationCommitSeverity);
        }
        Ok(())
    }
}

/// Policy invariant violations.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PolicyValidationError {
    /// A branch prefix was empty.
    #[error("{0} must not be empty")]
    EmptyPrefix(&'static str),
    /// Feature and hotfix prefixes are equal or one prefixes the other.
    #[error("featurePrefix '{feature}' and hotfixPrefix '{hotfix}' overlap")]
    OverlappingPrefixes {
        /// Feature prefix.
        feature: String,
        /// Hotfix prefix.
        hotfix: String,
    },
    /// The integration branch name was empty.
    #[error("integrationBranch must not be empty")]
    EmptyIntegrationBranch,
    /// Integration commits are allowed, so their severity cannot be `error`.
    #[error("integrationCommitSeverity must be info or warn")]
    IntegrationCommitSeverity,
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Builds an owned set from static names.
fn to_set(values: &[&str]) -> BTreeSet<String> {
    values.iter().map(|value| (*value).to_string()).collect()
}
