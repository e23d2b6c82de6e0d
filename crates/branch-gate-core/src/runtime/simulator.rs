// crates/branch-gate-core/src/runtime/simulator.rs
// ============================================================================
// Module: Branch Gate Sequence Simulator
// Description: Replays hypothetical git commands through the rule engine.
// Purpose: Preview a plan of commands without touching the repository.
// Dependencies: crate::core, crate::runtime::engine
// ============================================================================

//! ## Overview
//! Every step is evaluated against the same snapshot: simulated commands do
//! not change the simulated repository state. Steps run in input order and,
//! when `stop_on_violation` is set, evaluation stops at the first denial.

// ============================================================================
// SECTION: Imports
// ============================================================================

use crate::core::PolicyConfig;
use crate::core::RepositorySnapshot;
use crate::core::SimulationResult;
use crate::core::SimulationStep;
use crate::core::StepVerdict;
use crate::runtime::engine::RuleEngine;

// ============================================================================
// SECTION: Simulator
// ============================================================================

/// Stateless replay of command sequences.
#[derive(Debug, Clone, Copy, Default)]
pub struct SequenceSimulator;

impl SequenceSimulator {
    /// Evaluates each step in order against a fixed snapshot.
    #[must_use]
    pub fn run(
        snapshot: &RepositorySnapshot,
        policy: &PolicyConfig,
        steps: &[SimulationStep],
        stop_on_violation: bool,
    ) -> SimulationResult {
        let mut results = Vec::with_capacity(steps.len());
        let mut first_violation = None;
        for step in steps {
            let verdict = RuleEngine::evaluate(snapshot, &step.command, &step.args, policy);
            let denied = !verdict.allowed;
            results.push(StepVerdict {
                command: step.command.clone(),
                verdict,
            });
            if denied && first_violation.is_none() {
                first_violation = Some(step.command.clone());
                if stop_on_violation {
                    break;
                }
            }
        }
        SimulationResult {
            results,
            first_violation,
        }
    }
}
