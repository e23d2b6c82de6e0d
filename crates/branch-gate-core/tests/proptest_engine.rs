// crates/branch-gate-core/tests/proptest_engine.rs
// ============================================================================
// Module: Rule Engine Property-Based Tests
// Description: Property tests for rule engine and simulator invariants.
// Purpose: Detect panics and invariant breaks across wide input ranges.
// ============================================================================

//! Property-based tests for rule engine invariants.

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

use branch_gate_core::PolicyConfig;
use branch_gate_core::RepositorySnapshot;
use branch_gate_core::RuleEngine;
use branch_gate_core::SequenceSimulator;
use branch_gate_core::Severity;
use branch_gate_core::SimulationStep;
use branch_gate_core::validate_commit_message;
use proptest::prelude::*;

fn branch_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("main".to_string()),
        Just("master".to_string()),
        Just("develop".to_string()),
        Just("unknown".to_string()),
        "feature/[a-z]{1,8}",
        "hotfix/[a-z]{1,8}",
        "[a-z]{1,10}",
    ]
}

fn command_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("commit".to_string()),
        Just("push".to_string()),
        Just("merge".to_string()),
        "[a-z]{1,8}",
    ]
}

fn snapshot_strategy() -> impl Strategy<Value = RepositorySnapshot> {
    (branch_strategy(), any::<bool>(), proptest::option::of(any::<bool>()))
        .prop_map(|(branch, clean, merge)| RepositorySnapshot::new(branch, clean, merge))
}

fn args_strategy() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec(".{0,12}", 0 .. 4)
}

proptest! {
    #[test]
    fn denied_verdicts_always_have_error_severity(
        snapshot in snapshot_strategy(),
        command in command_strategy(),
        args in args_strategy(),
    ) {
        let verdict = RuleEngine::evaluate(&snapshot, &command, &args, &PolicyConfig::default());
        if !verdict.allowed {
            prop_assert_eq!(verdict.severity, Severity::Error);
        }
    }

    #[test]
    fn evaluation_is_deterministic(
        snapshot in snapshot_strategy(),
        command in command_strategy(),
        args in args_strategy(),
    ) {
        let policy = PolicyConfig::default();
        let first = RuleEngine::evaluate(&snapshot, &command, &args, &policy);
        let second = RuleEngine::evaluate(&snapshot, &command, &args, &policy);
        prop_assert_eq!(first, second);
    }

    #[test]
    fn merge_into_protected_allowed_iff_source_is_integration(
        protected in prop_oneof![Just("main"), Just("master")],
        source in prop_oneof![Just("develop".to_string()), "[a-z/]{0,12}"],
        clean in any::<bool>(),
    ) {
        let policy = PolicyConfig::default();
        let snapshot = RepositorySnapshot::new(protected, clean, None);
        let verdict = RuleEngine::evaluate(&snapshot, "merge", &[source.clone()], &policy);
        prop_assert_eq!(verdict.allowed, source == policy.integration_branch);
    }

    #[test]
    fn simulator_length_is_bounded_by_first_violation(
        snapshot in snapshot_strategy(),
        commands in prop::collection::vec(command_strategy(), 0 .. 8),
        stop in any::<bool>(),
    ) {
        let steps: Vec<SimulationStep> = commands
            .iter()
            .map(|command| SimulationStep::new(command.clone(), Vec::new()))
            .collect();
        let result = SequenceSimulator::run(&snapshot, &PolicyConfig::default(), &steps, stop);
        let first_denied = result.results.iter().position(|entry| !entry.verdict.allowed);
        match first_denied {
            Some(index) => {
                prop_assert_eq!(result.first_violation.as_deref(), Some(steps[index].command.as_str()));
                if stop {
                    prop_assert_eq!(result.results.len(), index + 1);
                } else {
                    prop_assert_eq!(result.results.len(), steps.len());
                }
            }
            None => {
                prop_assert!(result.first_violation.is_none());
                prop_assert_eq!(result.results.len(), steps.len());
            }
        }
    }

    #[test]
    fn allowed_type_with_description_always_validates(
        kind in prop_oneof![Just("feat"), Just("fix"), Just("docs"), Just("chore")],
        description in "[a-zA-Z0-9][a-zA-Z0-9 ]{0,20}",
    ) {
        let message = format!("{kind}: {description}");
        prop_assert!(validate_commit_message(&message, &PolicyConfig::default()).is_valid());
    }
}
