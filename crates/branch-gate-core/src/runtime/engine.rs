// crates/branch-gate-core/src/runtime/engine.rs
// ============================================================================
// Module: Branch Gate Rule Engine
// Description: Pure decision function for proposed git operations.
// Purpose: Map (snapshot, command, args, policy) to a verdict.
// Dependencies: crate::core
// ============================================================================

//! ## Overview
//! The rule engine holds the single authoritative rule table. Rules are
//! checked in order and the first match wins, except the commit-message check
//! which runs in addition to the branch-based commit rules: both must pass for
//! a commit to be allowed.
//!
//! | # | Command | Branch class | Outcome |
//! |---|---------|--------------|---------|
//! | 1 | commit | protected | deny |
//! | 2 | commit | other | allow, warn |
//! | 3 | commit | integration | allow, policy severity |
//! | 4 | commit | any, with message | deny when the message is malformed |
//! | 5 | push | protected | deny when dirty or not the primary branch |
//! | 6 | push | primary | allow merge commits, otherwise deny |
//! | 7 | push | integration | deny when dirty |
//! | 8 | merge | protected | allow only from the integration branch |
//! | 9 | merge | integration | allow feature and hotfix sources |
//! | 10 | any | any | allow, info |
//!
//! Evaluation never fails. Missing ancestry facts deny the primary-branch push
//! with [`VerdictBasis::Indeterminate`](crate::core::VerdictBasis).

// ============================================================================
// SECTION: Imports
// ============================================================================

use crate::core::BranchClass;
use crate::core::PolicyConfig;
use crate::core::RepositorySnapshot;
use crate::core::Severity;
use crate::core::UNKNOWN_BRANCH;
use crate::core::Verdict;
use crate::core::classify_branch;
use crate::core::extract_commit_message;
use crate::core::validate_commit_message;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Reason reported when a primary-branch push is not a merge commit.
pub const MERGE_COMMIT_REQUIRED_REASON: &str = "direct push blocked, expected a merge commit";
/// Reason reported when pushing with a dirty working tree.
pub const UNCOMMITTED_CHANGES_REASON: &str = "cannot push with uncommitted changes";

// ============================================================================
// SECTION: Rule Engine
// ============================================================================

/// Stateless evaluator for the branching rule table.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleEngine;

impl RuleEngine {
    /// Evaluates a proposed git command against the policy.
    #[must_use]
    pub fn evaluate(
        snapshot: &RepositorySnapshot,
        command: &str,
        args: &[String],
        policy: &PolicyConfig,
    ) -> Verdict {
        let branch = snapshot.current_branch.as_str();
        let class = classify_branch(branch, policy);
        let matched = match command {
            "commit" => evaluate_commit(branch, class, args, policy),
            "push" => evaluate_push(snapshot, class, policy),
            "merge" => evaluate_merge(branch, class, args, policy),
            _ => None,
        };
        matched.unwrap_or_else(|| acknowledge(command, branch, class))
    }
}

// ============================================================================
// SECTION: Commit Rules
// ============================================================================

/// Applies rules 1 to 4.
fn evaluate_commit(
    branch: &str,
    class: BranchClass,
    args: &[String],
    policy: &PolicyConfig,
) -> Option<Verdict> {
    let integration = &policy.integration_branch;
    let branch_verdict = match class {
        BranchClass::Protected => {
            return Some(
                Verdict::deny(format!("direct commits to {branch} are not allowed"), class)
                    .with_suggestion(format!(
                        "create a feature branch ({}<name>) from {integration} and open a merge request into {integration}",
                        policy.feature_prefix
                    )),
            );
        }
        BranchClass::Other => Some(
            Verdict::allow(Severity::Warn, format!("non-standard branch name {branch}"), class)
                .with_suggestion(format!(
                    "use {}<name> or {}<name> for consistency",
                    policy.feature_prefix, policy.hotfix_prefix
                )),
        ),
        BranchClass::Integration => Some(
            Verdict::allow(
                policy.integration_commit_severity,
                format!("direct commits to {integration} are discouraged"),
                class,
            )
            .with_suggestion(format!(
                "commit on a {}<name> branch and merge it into {integration}",
                policy.feature_prefix
            )),
        ),
        BranchClass::Feature | BranchClass::Hotfix => None,
    };
    if policy.enforce_commit_message_format
        && let Some(message) = extract_commit_message(args)
    {
        let check = validate_commit_message(message, policy);
        if !check.is_valid() {
            return Some(Verdict::deny(check.describe(), class).with_suggestion(format!(
                "use 'type: description' where type is one of: {}",
                policy.commit_types_label()
            )));
        }
    }
    branch_verdict
}

// ============================================================================
// SECTION: Push Rules
// ============================================================================

/// Applies rules 5 to 7.
fn evaluate_push(
    snapshot: &RepositorySnapshot,
    class: BranchClass,
    policy: &PolicyConfig,
) -> Option<Verdict> {
    let branch = snapshot.current_branch.as_str();
    let integration = &policy.integration_branch;
    match class {
        BranchClass::Protected if !policy.allow_direct_push => {
            if !snapshot.is_clean {
                return Some(
                    Verdict::deny(UNCOMMITTED_CHANGES_REASON, class)
                        .with_suggestion("commit or stash changes first"),
                );
            }
            if branch != policy.primary_branch {
                return Some(
                    Verdict::deny(format!("direct push to protected branch {branch} blocked"), class)
                        .with_suggestion(format!(
                            "open a merge request from {integration} instead"
                        )),
                );
            }
            let verdict = match snapshot.has_multiple_parents {
                Some(true) => Verdict::allow(
                    Severity::Warn,
                    format!("pushing merge commit to {branch}"),
                    class,
                )
                .with_suggestion(format!("promote only tested {integration} work")),
                Some(false) => Verdict::deny(MERGE_COMMIT_REQUIRED_REASON, class)
                    .with_suggestion(format!("merge {integration} into {branch} via a merge request")),
                None => Verdict::deny(MERGE_COMMIT_REQUIRED_REASON, class)
                    .with_suggestion(format!(
                        "HEAD ancestry could not be read; merge {integration} into {branch} via a merge request"
                    ))
                    .indeterminate(),
            };
            Some(verdict)
        }
        BranchClass::Integration if !snapshot.is_clean && policy.require_clean_working_tree => {
            Some(
                Verdict::deny(UNCOMMITTED_CHANGES_REASON, class)
                    .with_suggestion("commit or stash changes before pushing"),
            )
        }
        _ => None,
    }
}

// ============================================================================
// SECTION: Merge Rules
// ============================================================================

/// Applies rules 8 and 9.
fn evaluate_merge(
    branch: &str,
    class: BranchClass,
    args: &[String],
    policy: &PolicyConfig,
) -> Option<Verdict> {
    let source = args.first().map_or(UNKNOWN_BRANCH, String::as_str);
    let integration = &policy.integration_branch;
    match class {
        BranchClass::Protected => {
            if source == integration.as_str() {
                Some(
                    Verdict::allow(
                        Severity::Warn,
                        format!("merging {source} into protected branch {branch}"),
                        class,
                    )
                    .with_suggestion(format!("promote only tested {integration} work")),
                )
            } else {
                Some(
                    Verdict::deny(
                        format!("only {integration} may merge into protected branch {branch}"),
                        class,
                    )
                    .with_suggestion(format!(
                        "merge {source} into {integration} first, then promote {integration}"
                    )),
                )
            }
        }
        BranchClass::Integration if classify_branch(source, policy).is_work_branch() => Some(
            Verdict::allow(Severity::Info, format!("merging {source} into {integration}"), class),
        ),
        _ => None,
    }
}

// ============================================================================
// SECTION: Default Rule
// ============================================================================

/// Applies rule 10.
fn acknowledge(command: &str, branch: &str, class: BranchClass) -> Verdict {
    Verdict::allow(Severity::Info, format!("{command} on {class} branch {branch} permitted"), class)
}
