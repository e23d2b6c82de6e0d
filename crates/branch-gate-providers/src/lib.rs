// crates/branch-gate-providers/src/lib.rs
// ============================================================================
// Module: Branch Gate Providers
// Description: Repository providers backed by real version control.
// Purpose: Supply repository snapshots and listings to the rule engine.
// Dependencies: branch-gate-core, git2
// ============================================================================

//! ## Overview
//! Providers implement [`branch_gate_core::RepositoryProvider`] against an
//! on-disk repository. The git provider reopens the repository for every
//! request so each snapshot reflects the working tree at call time.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod git;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use git::GitRepositoryProvider;
