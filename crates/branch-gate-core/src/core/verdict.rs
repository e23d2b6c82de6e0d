// crates/branch-gate-core/src/core/verdict.rs
// ============================================================================
// Module: Verdicts and Simulation Records
// Description: Decision outputs produced by rule evaluation and simulation.
// Purpose: Provide immutable, serializable allow/warn/deny results.
// Dependencies: crate::core::{branch, policy}, serde
// ============================================================================

//! ## Overview
//! A [`Verdict`] is the only output of rule evaluation. Policy violations are
//! ordinary verdicts, never errors. The [`VerdictBasis`] separates decisions
//! made on known facts from fail-closed decisions made because a repository
//! fact was missing, so clients can render "denied" and "cannot determine"
//! differently.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::core::branch::BranchClass;
use crate::core::policy::Severity;

// ============================================================================
// SECTION: Verdict
// ============================================================================

/// What a verdict was based on.
///
/// # Invariants
/// - Variants are stable for serialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerdictBasis {
    /// Decided by a policy rule over known facts.
    Policy,
    /// Decided fail-closed because a required repository fact was unavailable.
    Indeterminate,
}

/// Allow/deny decision with explanation and remediation.
///
/// # Invariants
/// - `allowed == false` implies `severity == Severity::Error`.
/// - Immutable once returned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Verdict {
    /// True when the operation is permitted.
    pub allowed: bool,
    /// Severity of the outcome.
    pub severity: Severity,
    /// Human-readable explanation.
    pub reason: String,
    /// Optional remediation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
    /// Basis for the decision.
    pub basis: VerdictBasis,
    /// Class of the branch the command was evaluated on.
    pub branch_class: BranchClass,
}

impl Verdict {
    /// Builds an allowed verdict.
    #[must_use]
    pub fn allow(severity: Severity, reason: impl Into<String>, branch_class: BranchClass) -> Self {
        Self {
            allowed: true,
            severity,
            reason: reason.into(),
            suggestion: None,
            basis: VerdictBasis::Policy,
            branch_class,
        }
    }

    /// Builds a denied verdict with `error` severity.
    #[must_use]
    pub fn deny(reason: impl Into<String>, branch_class: BranchClass) -> Self {
        Self {
            allowed: false,
            severity: Severity::Error,
            reason: reason.into(),
            suggestion: None,
            basis: VerdictBasis::Policy,
            branch_class,
        }
    }

    /// Attaches a remediation suggestion.
    #[must_use]
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Marks the verdict as a fail-closed decision.
    #[must_use]
    pub const fn indeterminate(mut self) -> Self {
        self.basis = VerdictBasis::Indeterminate;
        self
    }
}

// ============================================================================
// SECTION: Simulation Records
// ============================================================================

/// One hypothetical command in a simulated sequence.
///
/// # Invariants
/// - `args` keeps caller order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulationStep {
    /// Git command name.
    pub command: String,
    /// Command arguments.
    #[serde(default)]
    pub args: Vec<String>,
}

impl SimulationStep {
    /// Creates a simulation step.
    #[must_use]
    pub fn new(command: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            command: command.into(),
            args,
        }
    }
}

/// Verdict for a single simulated step, tagged with its command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepVerdict {
    /// Command that produced the verdict.
    pub command: String,
    /// Full verdict for the step.
    #[serde(flatten)]
    pub verdict: Verdict,
}

/// Result of replaying a sequence of commands.
///
/// # Invariants
/// - `results` are in input order.
/// - `first_violation` names the command of the first denied step, if any.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationResult {
    /// Evaluated steps.
    pub results: Vec<StepVerdict>,
    /// Command name of the first denied step.
    pub first_violation: Option<String>,
}
