// crates/branch-gate-core/src/runtime/mod.rs
// ============================================================================
// Module: Branch Gate Runtime
// Description: Rule evaluation, sequence simulation, and in-memory providers.
// Purpose: Execute the branching policy against repository snapshots.
// Dependencies: crate::core, crate::interfaces
// ============================================================================

//! ## Overview
//! Runtime components are deterministic and synchronous. Callers obtain a
//! snapshot from a [`RepositoryProvider`](crate::interfaces::RepositoryProvider)
//! and a policy, then evaluate.

pub mod engine;
pub mod simulator;
pub mod static_provider;

#[cfg(test)]
mod tests;

pub use engine::MERGE_COMMIT_REQUIRED_REASON;
pub use engine::RuleEngine;
pub use engine::UNCOMMITTED_CHANGES_REASON;
pub use simulator::SequenceSimulator;
pub use static_provider::StaticRepositoryProvider;
