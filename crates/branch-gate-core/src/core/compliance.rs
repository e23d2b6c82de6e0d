// crates/branch-gate-core/src/core/compliance.rs
// ============================================================================
// Module: Repository Compliance Analysis
// Description: Checks that the branches a policy expects actually exist.
// Purpose: Report missing or misnamed integration and protected branches.
// Dependencies: crate::core::policy, serde
// ============================================================================

//! ## Overview
//! Compliance analysis inspects the branch inventory (local and remote) and
//! reports:
//! - `missing_branch` / `misnamed_branch` (error) for the integration branch.
//! - `missing_branch` (warn) for each absent protected branch.
//! - `config_mismatch` (error) when branches cannot be listed.
//!
//! A repository is compliant iff no issues are reported.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::core::policy::PolicyConfig;
use crate::core::policy::Severity;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Name fragments that suggest an integration branch under another name.
const INTEGRATION_HINTS: &[&str] = &["dev", "develop", "integration"];

// ============================================================================
// SECTION: Branch Inventory
// ============================================================================

/// Local and remote branch names.
///
/// # Invariants
/// - `remote` entries are `<remote>/<branch>` shorthand names.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchInventory {
    /// Local branch names.
    pub local: Vec<String>,
    /// Remote-tracking branch names.
    pub remote: Vec<String>,
}

impl BranchInventory {
    /// Returns true when the branch exists locally or on any remote.
    #[must_use]
    pub fn contains(&self, branch: &str) -> bool {
        self.local.iter().any(|name| name == branch)
            || self.remote.iter().any(|name| strip_remote(name) == branch)
    }

    /// Iterates over local names and remote names with the remote stripped.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.local.iter().map(String::as_str).chain(self.remote.iter().map(|name| strip_remote(name)))
    }

    /// Returns the total number of listed branches.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.local.len() + self.remote.len()
    }

    /// Returns true when no branches are listed.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.local.is_empty() && self.remote.is_empty()
    }
}

// ============================================================================
// SECTION: Report
// ============================================================================

/// Compliance issue categories.
///
/// # Invariants
/// - Variants are stable for serialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComplianceIssueKind {
    /// An expected branch does not exist.
    MissingBranch,
    /// The integration branch appears to exist under another name.
    MisnamedBranch,
    /// The policy could not be checked against the repository.
    ConfigMismatch,
}

/// Single compliance finding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComplianceIssue {
    /// Issue category.
    pub kind: ComplianceIssueKind,
    /// Issue severity.
    pub severity: Severity,
    /// Branch the issue refers to, when applicable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
    /// Human-readable description.
    pub message: String,
    /// Remediation.
    pub suggestion: String,
}

/// Issue counts for a report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComplianceSummary {
    /// Number of `error` issues.
    pub errors: usize,
    /// Number of `warn` issues.
    pub warnings: usize,
    /// Number of branches inspected.
    pub branches_checked: usize,
}

/// Result of a compliance analysis.
///
/// # Invariants
/// - `compliant == issues.is_empty()`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComplianceReport {
    /// True when no issues were found.
    pub compliant: bool,
    /// Findings in check order.
    pub issues: Vec<ComplianceIssue>,
    /// Issue counts.
    pub summary: ComplianceSummary,
}

impl ComplianceReport {
    /// Builds a report from findings.
    #[must_use]
    pub fn from_issues(issues: Vec<ComplianceIssue>, branches_checked: usize) -> Self {
        let errors = issues.iter().filter(|issue| issue.severity == Severity::Error).count();
        let warnings = issues.iter().filter(|issue| issue.severity == Severity::Warn).count();
        Self {
            compliant: issues.is_empty(),
            issues,
            summary: ComplianceSummary {
                errors,
                warnings,
                branches_checked,
            },
        }
    }

    /// Report used when the branch inventory could not be read.
    #[must_use]
    pub fn unavailable(detail: &str) -> Self {
        let issue = ComplianceIssue {
            kind: ComplianceIssueKind::ConfigMismatch,
            severity: Severity::Error,
            branch: None,
            message: format!("unable to list repository branches: {detail}"),
            suggestion: "run the server inside a git repository or set repository.path"
                .to_string(),
        };
        Self::from_issues(vec![issue], 0)
    }
}

// ============================================================================
// SECTION: Analysis
// ============================================================================

/// Analyzes the branch inventory against the policy.
#[must_use]
pub fn analyze_compliance(inventory: &BranchInventory, policy: &PolicyConfig) -> ComplianceReport {
    let mut issues = Vec::new();
    let integration = &policy.integration_branch;
    if !inventory.contains(integration) {
        let mut candidates: Vec<&str> = inventory
            .names()
            .filter(|name| *name != integration.as_str() && looks_like_integration(name, policy))
            .collect();
        candidates.sort_unstable();
        candidates.dedup();
        if candidates.is_empty() {
            issues.push(ComplianceIssue {
                kind: ComplianceIssueKind::MissingBranch,
                severity: Severity::Error,
                branch: Some(integration.clone()),
                message: format!("integration branch {integration} does not exist"),
                suggestion: format!(
                    "git checkout -b {integration} {} && git push -u origin {integration}",
                    policy.primary_branch
                ),
            });
        } else {
            issues.push(ComplianceIssue {
                kind: ComplianceIssueKind::MisnamedBranch,
                severity: Severity::Error,
                branch: Some(integration.clone()),
                message: format!(
                    "integration branch {integration} not found; similar branches: {}",
                    candidates.join(", ")
                ),
                suggestion: format!(
                    "rename the branch to {integration} or set integrationBranch to match"
                ),
            });
        }
    }
    for protected in &policy.protected_branches {
        if !inventory.contains(protected) {
            issues.push(ComplianceIssue {
                kind: ComplianceIssueKind::MissingBranch,
                severity: Severity::Warn,
                branch: Some(protected.clone()),
                message: format!("protected branch {protected} does not exist"),
                suggestion: format!(
                    "create {protected} or remove it from protectedBranches"
                ),
            });
        }
    }
    ComplianceReport::from_issues(issues, inventory.len())
}

/// Returns true when a branch name hints at an integration branch.
fn looks_like_integration(name: &str, policy: &PolicyConfig) -> bool {
    if name.starts_with(&policy.feature_prefix) || name.starts_with(&policy.hotfix_prefix) {
        return false;
    }
    let lowered = name.to_ascii_lowercase();
    INTEGRATION_HINTS.iter().any(|hint| lowered.contains(hint))
}

/// Strips the `<remote>/` part from a remote-tracking shorthand name.
fn strip_remote(name: &str) -> &str {
    name.split_once('/').map_or(name, |(_, branch)| branch)
}
