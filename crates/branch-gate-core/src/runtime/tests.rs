// crates/branch-gate-core/src/runtime/tests.rs
// ============================================================================
// Module: Runtime Unit Tests
// Description: Unit tests for rule ordering and simulator short-circuiting.
// Purpose: Pin the rule table precedence with in-memory snapshots.
// Dependencies: branch-gate-core
// ============================================================================

//! ## Overview
//! Exercises rule precedence corners that integration tests do not reach
//! directly: policy toggles, dirty-tree ordering, and unknown branches.

// ============================================================================
// SECTION: Lint Configuration
// ============================================================================

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
    reason = "Test-only assertions are permitted."
)]

// ============================================================================
// SECTION: Imports
// ============================================================================

use super::MERGE_COMMIT_REQUIRED_REASON;
use super::RuleEngine;
use super::SequenceSimulator;
use super::UNCOMMITTED_CHANGES_REASON;
use crate::core::BranchClass;
use crate::core::PolicyConfig;
use crate::core::RepositorySnapshot;
use crate::core::Severity;
use crate::core::SimulationStep;
use crate::core::VerdictBasis;

// ============================================================================
// SECTION: Fixtures
// ============================================================================

fn args(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| (*value).to_string()).collect()
}

fn on(branch: &str, is_clean: bool, merge: Option<bool>) -> RepositorySnapshot {
    RepositorySnapshot::new(branch, is_clean, merge)
}

// ============================================================================
// SECTION: Push Ordering
// ============================================================================

#[test]
fn dirty_tree_on_primary_reports_uncommitted_changes_before_merge_check() {
    let policy = PolicyConfig::default();
    let verdict = RuleEngine::evaluate(&on("main", false, Some(false)), "push", &[], &policy);
    assert!(!verdict.allowed);
    assert_eq!(verdict.reason, UNCOMMITTED_CHANGES_REASON);
    assert_eq!(verdict.basis, VerdictBasis::Policy);
}

#[test]
fn dirty_tree_on_non_primary_protected_branch_reports_uncommitted_changes() {
    let policy = PolicyConfig::default();
    let verdict = RuleEngine::evaluate(&on("master", false, None), "push", &[], &policy);
    assert!(!verdict.allowed);
    assert_eq!(verdict.reason, UNCOMMITTED_CHANGES_REASON);
}

#[test]
fn clean_push_on_non_primary_protected_branch_is_denied() {
    let policy = PolicyConfig::default();
    let verdict = RuleEngine::evaluate(&on("master", true, Some(true)), "push", &[], &policy);
    assert!(!verdict.allowed);
    assert!(verdict.reason.contains("protected branch master"));
}

#[test]
fn primary_push_with_merge_commit_is_allowed_with_warning() {
    let policy = PolicyConfig::default();
    let verdict = RuleEngine::evaluate(&on("main", true, Some(true)), "push", &[], &policy);
    assert!(verdict.allowed);
    assert_eq!(verdict.severity, Severity::Warn);
}

#[test]
fn primary_push_without_ancestry_fails_closed() {
    let policy = PolicyConfig::default();
    let verdict = RuleEngine::evaluate(&on("main", true, None), "push", &[], &policy);
    assert!(!verdict.allowed);
    assert_eq!(verdict.reason, MERGE_COMMIT_REQUIRED_REASON);
    assert_eq!(verdict.basis, VerdictBasis::Indeterminate);
}

#[test]
fn allow_direct_push_skips_protected_push_rules() {
    let policy = PolicyConfig {
        allow_direct_push: true,
        ..PolicyConfig::default()
    };
    let verdict = RuleEngine::evaluate(&on("main", false, Some(false)), "push", &[], &policy);
    assert!(verdict.allowed);
    assert_eq!(verdict.severity, Severity::Info);
}

#[test]
fn integration_push_respects_clean_tree_toggle() {
    let strict = PolicyConfig::default();
    let relaxed = PolicyConfig {
        require_clean_working_tree: false,
        ..PolicyConfig::default()
    };
    let snapshot = on("develop", false, None);
    assert!(!RuleEngine::evaluate(&snapshot, "push", &[], &strict).allowed);
    assert!(RuleEngine::evaluate(&snapshot, "push", &[], &relaxed).allowed);
}

// ============================================================================
// SECTION: Commit Rules
// ============================================================================

#[test]
fn integration_listed_as_protected_is_treated_as_protected() {
    let mut policy = PolicyConfig::default();
    policy.protected_branches.insert("develop".to_string());
    let verdict = RuleEngine::evaluate(&on("develop", true, None), "commit", &[], &policy);
    assert!(!verdict.allowed);
    assert_eq!(verdict.branch_class, BranchClass::Protected);
}

#[test]
fn integration_commit_uses_policy_severity() {
    let policy = PolicyConfig {
        integration_commit_severity: Severity::Info,
        ..PolicyConfig::default()
    };
    let verdict = RuleEngine::evaluate(&on("develop", true, None), "commit", &[], &policy);
    assert!(verdict.allowed);
    assert_eq!(verdict.severity, Severity::Info);
}

#[test]
fn bad_message_on_other_branch_overrides_naming_warning() {
    let policy = PolicyConfig::default();
    let verdict = RuleEngine::evaluate(
        &on("scratch", true, None),
        "commit",
        &args(&["-m", "wip"]),
        &policy,
    );
    assert!(!verdict.allowed);
    assert_eq!(verdict.severity, Severity::Error);
}

#[test]
fn message_check_is_skipped_when_format_enforcement_is_off() {
    let policy = PolicyConfig {
        enforce_commit_message_format: false,
        ..PolicyConfig::default()
    };
    let verdict = RuleEngine::evaluate(
        &on("feature/a", true, None),
        "commit",
        &args(&["-m", "wip"]),
        &policy,
    );
    assert!(verdict.allowed);
}

#[test]
fn unknown_branch_commit_is_classified_other() {
    let policy = PolicyConfig::default();
    let verdict = RuleEngine::evaluate(&RepositorySnapshot::unavailable(), "commit", &[], &policy);
    assert!(verdict.allowed);
    assert_eq!(verdict.severity, Severity::Warn);
    assert_eq!(verdict.branch_class, BranchClass::Other);
}

// ============================================================================
// SECTION: Simulator
// ============================================================================

#[test]
fn simulator_without_stop_evaluates_every_step() {
    let policy = PolicyConfig::default();
    let steps = vec![
        SimulationStep::new("commit", Vec::new()),
        SimulationStep::new("push", Vec::new()),
        SimulationStep::new("status", Vec::new()),
    ];
    let result = SequenceSimulator::run(&on("main", true, Some(false)), &policy, &steps, false);
    assert_eq!(result.results.len(), 3);
    assert_eq!(result.first_violation.as_deref(), Some("commit"));
    assert!(result.results[2].verdict.allowed);
}
