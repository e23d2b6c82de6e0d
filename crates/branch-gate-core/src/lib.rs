// crates/branch-gate-core/src/lib.rs
// ============================================================================
// Module: Branch Gate Core
// Description: Policy model, rule engine, and sequence simulator.
// Purpose: Decide whether proposed git operations fit a branching policy.
// Dependencies: serde, thiserror
// ============================================================================

//! ## Overview
//! Branch Gate core evaluates proposed git operations (`commit`, `push`,
//! `merge`) against a branching policy and a point-in-time repository
//! snapshot. It performs no I/O: repository facts come from a
//! [`interfaces::RepositoryProvider`] and policies from the caller.
//!
//! Policy violations are ordinary [`Verdict`] values. Nothing here enforces
//! anything; verdicts are advisory.

pub mod core;
pub mod interfaces;
pub mod runtime;

pub use crate::core::BranchClass;
pub use crate::core::BranchInventory;
pub use crate::core::CommitMessageCheck;
pub use crate::core::ComplianceIssue;
pub use crate::core::ComplianceIssueKind;
pub use crate::core::ComplianceReport;
pub use crate::core::ComplianceSummary;
pub use crate::core::MODIFIED_FILES_UNAVAILABLE;
pub use crate::core::PolicyConfig;
pub use crate::core::PolicyValidationError;
pub use crate::core::RepositorySnapshot;
pub use crate::core::RepositoryStatus;
pub use crate::core::Severity;
pub use crate::core::SimulationResult;
pub use crate::core::SimulationStep;
pub use crate::core::StepVerdict;
pub use crate::core::UNKNOWN_BRANCH;
pub use crate::core::Verdict;
pub use crate::core::VerdictBasis;
pub use crate::core::WorkflowSuggestion;
pub use crate::core::WorkflowTask;
pub use crate::core::analyze_compliance;
pub use crate::core::classify_branch;
pub use crate::core::extract_commit_message;
pub use crate::core::suggest_workflow;
pub use crate::core::validate_commit_message;
pub use crate::interfaces::RepositoryError;
pub use crate::interfaces::RepositoryProvider;
pub use crate::runtime::RuleEngine;
pub use crate::runtime::SequenceSimulator;
pub use crate::runtime::StaticRepositoryProvider;
