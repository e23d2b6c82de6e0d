// crates/branch-gate-mcp/src/service.rs
// ============================================================================
// Module: Git Rules Service
// Description: Caller-facing facade over provider, policy store, and engine.
// Purpose: Bind fresh repository facts and current policy to every request.
// Dependencies: branch-gate-config, branch-gate-core
// ============================================================================

//! ## Overview
//! [`GitRulesService`] is the only path from transports to the rule engine.
//! Each operation takes a new [`RepositorySnapshot`] from the provider and the
//! current [`PolicyConfig`] from the store, so neither is reused across calls.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use branch_gate_config::PolicyStore;
use branch_gate_config::PolicyStoreError;
use branch_gate_config::PolicyUpdate;
use branch_gate_core::ComplianceReport;
use branch_gate_core::MODIFIED_FILES_UNAVAILABLE;
use branch_gate_core::PolicyConfig;
use branch_gate_core::RepositoryProvider;
use branch_gate_core::RepositorySnapshot;
use branch_gate_core::RepositoryStatus;
use branch_gate_core::RuleEngine;
use branch_gate_core::SequenceSimulator;
use branch_gate_core::SimulationResult;
use branch_gate_core::SimulationStep;
use branch_gate_core::Verdict;
use branch_gate_core::WorkflowSuggestion;
use branch_gate_core::analyze_compliance;
use branch_gate_core::suggest_workflow;

// ============================================================================
// SECTION: Service
// ============================================================================

/// Policy-advisory operations over one repository.
#[derive(Clone)]
pub struct GitRulesService {
    /// Source of repository facts.
    provider: Arc<dyn RepositoryProvider>,
    /// Policy document store.
    store: Arc<PolicyStore>,
}

impl GitRulesService {
    /// Creates a service over the given provider and store.
    #[must_use]
    pub fn new(provider: Arc<dyn RepositoryProvider>, store: Arc<PolicyStore>) -> Self {
        Self {
            provider,
            store,
        }
    }

    /// Returns the policy store.
    #[must_use]
    pub fn store(&self) -> &PolicyStore {
        &self.store
    }

    /// Returns a fresh repository snapshot.
    #[must_use]
    pub fn snapshot(&self) -> RepositorySnapshot {
        self.provider.snapshot()
    }

    /// Returns the current policy.
    #[must_use]
    pub fn policy(&self) -> PolicyConfig {
        self.store.get()
    }

    /// Evaluates one proposed git command against the live repository.
    #[must_use]
    pub fn evaluate(&self, command: &str, args: &[String]) -> Verdict {
        let snapshot = self.provider.snapshot();
        let policy = self.store.get();
        RuleEngine::evaluate(&snapshot, command, args, &policy)
    }

    /// Replays a command sequence against one snapshot taken now.
    #[must_use]
    pub fn simulate(&self, steps: &[SimulationStep], stop_on_violation: bool) -> SimulationResult {
        let snapshot = self.provider.snapshot();
        let policy = self.store.get();
        SequenceSimulator::run(&snapshot, &policy, steps, stop_on_violation)
    }

    /// Reports branch state, pending changes, and the effective policy.
    #[must_use]
    pub fn status(&self) -> RepositoryStatus {
        let snapshot = self.provider.snapshot();
        let policy = self.store.get();
        let modified_files = self
            .provider
            .modified_files()
            .unwrap_or_else(|_| vec![MODIFIED_FILES_UNAVAILABLE.to_string()]);
        RepositoryStatus::build(&snapshot, modified_files, &policy)
    }

    /// Suggests commands for a named workflow task.
    #[must_use]
    pub fn suggest(&self, task: &str) -> WorkflowSuggestion {
        let snapshot = self.provider.snapshot();
        let policy = self.store.get();
        suggest_workflow(task, &snapshot, &policy)
    }

    /// Compares existing branches with the policy's branch model.
    #[must_use]
    pub fn compliance(&self) -> ComplianceReport {
        let policy = self.store.get();
        match self.provider.branches() {
            Ok(inventory) => analyze_compliance(&inventory, &policy),
            Err(err) => ComplianceReport::unavailable(&err.to_string()),
        }
    }

    /// Applies a partial policy update and returns the reloaded policy.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyStoreError`] when the update is invalid or cannot be written.
    pub fn update_policy(&self, update: &PolicyUpdate) -> Result<PolicyConfig, PolicyStoreError> {
        self.store.update(update)
    }
}
