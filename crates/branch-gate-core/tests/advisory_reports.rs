// crates/branch-gate-core/tests/advisory_reports.rs
// ============================================================================
// Module: Advisory Report Tests
// Description: Tests for commit messages, workflows, compliance, and status.
// Purpose: Validate advisory outputs built from policy and repository facts.
// ============================================================================

//! Advisory report tests.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only assertions and helpers are permitted."
)]

use branch_gate_core::BranchClass;
use branch_gate_core::BranchInventory;
use branch_gate_core::CommitMessageCheck;
use branch_gate_core::ComplianceIssueKind;
use branch_gate_core::PolicyConfig;
use branch_gate_core::PolicyValidationError;
use branch_gate_core::RepositoryError;
use branch_gate_core::RepositoryProvider;
use branch_gate_core::RepositorySnapshot;
use branch_gate_core::RepositoryStatus;
use branch_gate_core::Severity;
use branch_gate_core::StaticRepositoryProvider;
use branch_gate_core::analyze_compliance;
use branch_gate_core::extract_commit_message;
use branch_gate_core::suggest_workflow;
use branch_gate_core::validate_commit_message;

fn names(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| (*value).to_string()).collect()
}

// ============================================================================
// SECTION: Commit Messages
// ============================================================================

#[test]
fn commit_message_examples() {
    let policy = PolicyConfig::default();
    assert!(validate_commit_message("feat: add x", &policy).is_valid());
    assert_eq!(
        validate_commit_message("weird: add x", &policy),
        CommitMessageCheck::UnknownType {
            kind: "weird".to_string()
        }
    );
    assert_eq!(
        validate_commit_message("no colon here", &policy),
        CommitMessageCheck::MissingSeparator
    );
    assert_eq!(validate_commit_message("fix:tight", &policy), CommitMessageCheck::MissingSpace);
    assert_eq!(validate_commit_message("fix:   ", &policy), CommitMessageCheck::EmptyDescription);
    assert!(!validate_commit_message("feat(api): scoped", &policy).is_valid());
    assert!(validate_commit_message("docs: readme\n\nlong body: here", &policy).is_valid());
}

#[test]
fn commit_message_extraction_forms() {
    assert_eq!(extract_commit_message(&names(&["-m", "feat: a"])), Some("feat: a"));
    assert_eq!(extract_commit_message(&names(&["--message", "fix: b"])), Some("fix: b"));
    assert_eq!(extract_commit_message(&names(&["--message=docs: c"])), Some("docs: c"));
    assert_eq!(extract_commit_message(&names(&["-mchore: d"])), Some("chore: d"));
    assert_eq!(extract_commit_message(&names(&["-a", "-m", "test: e"])), Some("test: e"));
    assert_eq!(extract_commit_message(&names(&["-m"])), None);
    assert_eq!(extract_commit_message(&names(&["--amend"])), None);
}

#[test]
fn policy_validation_rejects_overlapping_prefixes() {
    let policy = PolicyConfig {
        hotfix_prefix: "feature/hot".to_string(),
        ..PolicyConfig::default()
    };
    assert!(matches!(policy.validate(), Err(PolicyValidationError::OverlappingPrefixes { .. })));
    let empty = PolicyConfig {
        feature_prefix: String::new(),
        ..PolicyConfig::default()
    };
    assert_eq!(empty.validate(), Err(PolicyValidationError::EmptyPrefix("featurePrefix")));
    assert_eq!(PolicyConfig::default().validate(), Ok(()));
}

// ============================================================================
// SECTION: Workflow Suggestions
// ============================================================================

#[test]
fn start_feature_uses_configured_names() {
    let policy = PolicyConfig {
        integration_branch: "trunk-dev".to_string(),
        ..PolicyConfig::default()
    };
    let suggestion = suggest_workflow("start_feature", &RepositorySnapshot::unavailable(), &policy);
    assert!(suggestion.applicable);
    assert!(suggestion.steps.iter().any(|step| step == "git checkout trunk-dev"));
    assert!(suggestion.steps.iter().any(|step| step.contains("feature/<name>")));
}

#[test]
fn merge_feature_requires_feature_branch() {
    let policy = PolicyConfig::default();
    let on_feature =
        suggest_workflow("merge_feature", &RepositorySnapshot::new("feature/x", true, None), &policy);
    assert!(on_feature.applicable);
    assert!(on_feature.steps.iter().any(|step| step == "git merge --no-ff feature/x"));

    let on_main = suggest_workflow("merge_feature", &RepositorySnapshot::new("main", true, None), &policy);
    assert!(!on_main.applicable);
    assert!(on_main.note.is_some());
}

#[test]
fn promote_to_main_requires_integration_branch() {
    let policy = PolicyConfig::default();
    let ok = suggest_workflow("promote_to_main", &RepositorySnapshot::new("develop", true, None), &policy);
    assert!(ok.applicable);
    assert_eq!(ok.steps.last().map(String::as_str), Some("git push origin main"));
    let wrong =
        suggest_workflow("promote_to_main", &RepositorySnapshot::new("feature/x", true, None), &policy);
    assert!(!wrong.applicable);
}

#[test]
fn unknown_task_lists_available_tasks() {
    let suggestion =
        suggest_workflow("deploy", &RepositorySnapshot::unavailable(), &PolicyConfig::default());
    assert!(!suggestion.applicable);
    assert!(suggestion.steps.is_empty());
    assert!(suggestion.suggestion.starts_with("Unknown task"));
    assert!(suggestion.suggestion.contains("promote_to_main"));
    assert!(suggestion.suggestion.contains("hotfix"));
}

// ============================================================================
// SECTION: Compliance
// ============================================================================

#[test]
fn compliant_repository_has_no_issues() {
    let inventory = BranchInventory {
        local: names(&["main", "develop", "feature/a"]),
        remote: names(&["origin/master"]),
    };
    let report = analyze_compliance(&inventory, &PolicyConfig::default());
    assert!(report.compliant);
    assert_eq!(report.summary.branches_checked, 4);
}

#[test]
fn misnamed_integration_branch_is_reported() {
    let inventory = BranchInventory {
        local: names(&["main", "dev", "feature/devtools"]),
        remote: Vec::new(),
    };
    let report = analyze_compliance(&inventory, &PolicyConfig::default());
    assert!(!report.compliant);
    let issue = &report.issues[0];
    assert_eq!(issue.kind, ComplianceIssueKind::MisnamedBranch);
    assert!(issue.message.contains("dev"));
    assert!(!issue.message.contains("feature/devtools"));
    assert_eq!(report.summary.errors, 1);
    assert_eq!(report.summary.warnings, 1);
}

#[test]
fn missing_integration_branch_is_an_error() {
    let inventory = BranchInventory {
        local: names(&["main", "master"]),
        remote: Vec::new(),
    };
    let report = analyze_compliance(&inventory, &PolicyConfig::default());
    assert_eq!(report.issues.len(), 1);
    assert_eq!(report.issues[0].kind, ComplianceIssueKind::MissingBranch);
    assert_eq!(report.issues[0].severity, Severity::Error);
}

#[test]
fn unavailable_inventory_reports_config_mismatch() {
    let report = branch_gate_core::ComplianceReport::unavailable("not a repository");
    assert!(!report.compliant);
    assert_eq!(report.issues[0].kind, ComplianceIssueKind::ConfigMismatch);
}

// ============================================================================
// SECTION: Status
// ============================================================================

#[test]
fn status_annotates_protected_dirty_branch() {
    let provider = StaticRepositoryProvider::new(RepositorySnapshot::new("main", false, Some(false)))
        .with_modified_files(names(&[" M src/lib.rs"]));
    let status = RepositoryStatus::build(
        &provider.snapshot(),
        provider.modified_files().unwrap(),
        &PolicyConfig::default(),
    );
    assert!(status.is_protected);
    assert_eq!(status.branch_class, BranchClass::Protected);
    assert_eq!(status.modified_files, names(&[" M src/lib.rs"]));
    assert_eq!(status.warnings.len(), 2);
}

#[test]
fn static_provider_reports_injected_errors() {
    let provider = StaticRepositoryProvider::default()
        .with_listing_error(RepositoryError::NotFound("/tmp/none".to_string()));
    assert!(provider.modified_files().is_err());
    assert!(provider.branches().is_err());
    assert!(provider.snapshot().is_branch_unknown());
}
