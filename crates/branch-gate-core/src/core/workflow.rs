// crates/branch-gate-core/src/core/workflow.rs
// ============================================================================
// Module: Workflow Suggestions
// Description: Step-by-step git command plans for common branching tasks.
// Purpose: Translate a named task into policy-aware git commands.
// Dependencies: crate::core::{branch, policy, snapshot}, serde
// ============================================================================

//! ## Overview
//! Suggestions reference the configured branch names and prefixes, never
//! hard-coded ones. Tasks that only make sense from a particular branch class
//! report `applicable = false` with a note when the current branch does not
//! qualify. Unknown task names produce a descriptive suggestion rather than an
//! error.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

use crate::core::branch::BranchClass;
use crate::core::branch::classify_branch;
use crate::core::policy::PolicyConfig;
use crate::core::snapshot::RepositorySnapshot;

// ============================================================================
// SECTION: Tasks
// ============================================================================

/// Supported workflow tasks.
///
/// # Invariants
/// - Variants are stable for serialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowTask {
    /// Branch off the integration branch for new work.
    StartFeature,
    /// Merge the current feature branch into the integration branch.
    MergeFeature,
    /// Promote tested integration work onto the primary branch.
    PromoteToMain,
    /// Start an emergency fix from the primary branch.
    Hotfix,
}

impl WorkflowTask {
    /// All tasks in display order.
    pub const ALL: [Self; 4] =
        [Self::StartFeature, Self::MergeFeature, Self::PromoteToMain, Self::Hotfix];

    /// Returns the stable task label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::StartFeature => "start_feature",
            Self::MergeFeature => "merge_feature",
            Self::PromoteToMain => "promote_to_main",
            Self::Hotfix => "hotfix",
        }
    }

    /// Parses a task label.
    #[must_use]
    pub fn parse(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|task| task.as_str() == label)
    }

    /// Returns all task labels joined for display.
    #[must_use]
    pub fn labels() -> String {
        Self::ALL.map(Self::as_str).join(", ")
    }
}

impl fmt::Display for WorkflowTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// SECTION: Suggestion
// ============================================================================

/// Suggested plan for a workflow task.
///
/// # Invariants
/// - `steps` is empty when the task is unknown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowSuggestion {
    /// Task label as requested.
    pub task: String,
    /// One-line summary.
    pub suggestion: String,
    /// Git commands to run in order.
    pub steps: Vec<String>,
    /// False when the current branch does not qualify for the task.
    pub applicable: bool,
    /// Extra guidance when the task is not applicable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Builds a workflow suggestion for the task from the current state.
#[must_use]
pub fn suggest_workflow(
    task: &str,
    snapshot: &RepositorySnapshot,
    policy: &PolicyConfig,
) -> WorkflowSuggestion {
    let Some(parsed) = WorkflowTask::parse(task) else {
        return WorkflowSuggestion {
            task: task.to_string(),
            suggestion: format!(
                "Unknown task '{task}'; available tasks: {}",
                WorkflowTask::labels()
            ),
            steps: Vec::new(),
            applicable: false,
            note: None,
        };
    };
    let integration = &policy.integration_branch;
    let primary = &policy.primary_branch;
    let current = &snapshot.current_branch;
    let class = classify_branch(current, policy);
    match parsed {
        WorkflowTask::StartFeature => plan(
            parsed,
            format!("Create a feature branch from {integration}"),
            vec![
                "git fetch origin".to_string(),
                format!("git checkout {integration}"),
                format!("git pull origin {integration}"),
                format!("git checkout -b {}<name>", policy.feature_prefix),
            ],
        ),
        WorkflowTask::MergeFeature => {
            let suggestion = plan(
                parsed,
                format!("Merge {current} into {integration}"),
                vec![
                    format!("git push origin {current}"),
                    format!("git checkout {integration}"),
                    format!("git pull origin {integration}"),
                    format!("git merge --no-ff {current}"),
                    format!("git push origin {integration}"),
                ],
            );
            if class == BranchClass::Feature {
                suggestion
            } else {
                not_applicable(
                    suggestion,
                    format!(
                        "current branch {current} is not a feature branch; switch to a {}<name> branch first",
                        policy.feature_prefix
                    ),
                )
            }
        }
        WorkflowTask::PromoteToMain => {
            let suggestion = plan(
                parsed,
                format!("Promote {integration} into {primary} with a merge commit"),
                vec![
                    format!("git checkout {integration}"),
                    format!("git pull origin {integration}"),
                    format!("git checkout {primary}"),
                    format!("git pull origin {primary}"),
                    format!("git merge --no-ff {integration}"),
                    format!("git push origin {primary}"),
                ],
            );
            if class == BranchClass::Integration {
                suggestion
            } else {
                not_applicable(
                    suggestion,
                    format!("promotion starts from {integration}; current branch is {current}"),
                )
            }
        }
        WorkflowTask::Hotfix => plan(
            parsed,
            format!("Start a hotfix from {primary}"),
            vec![
                format!("git checkout {primary}"),
                format!("git pull origin {primary}"),
                format!("git checkout -b {}<name>", policy.hotfix_prefix),
                format!("git checkout {integration}"),
                format!("git merge --no-ff {}<name>", policy.hotfix_prefix),
            ],
        ),
    }
}

/// Builds an applicable suggestion.
fn plan(task: WorkflowTask, suggestion: String, steps: Vec<String>) -> WorkflowSuggestion {
    WorkflowSuggestion {
        task: task.as_str().to_string(),
        suggestion,
        steps,
        applicable: true,
        note: None,
    }
}

/// Marks a suggestion as not applicable to the current branch.
fn not_applicable(mut suggestion: WorkflowSuggestion, note: String) -> WorkflowSuggestion {
    suggestion.applicable = false;
    suggestion.note = Some(note);
    suggestion
}
