// crates/branch-gate-core/src/interfaces/mod.rs
// ============================================================================
// Module: Branch Gate Interfaces
// Description: Backend-agnostic repository access contract.
// Purpose: Define how the runtime obtains repository facts.
// Dependencies: crate::core, thiserror
// ============================================================================

//! ## Overview
//! Repository providers supply the facts rule evaluation depends on without
//! embedding git-specific details. Snapshot retrieval never fails: providers
//! degrade to [`RepositorySnapshot::unavailable`] so evaluation fails closed
//! where a missing fact matters. Listing operations report errors so callers
//! can render "unable to list" states.

// ============================================================================
// SECTION: Imports
// ============================================================================

use thiserror::Error;

use crate::core::BranchInventory;
use crate::core::RepositorySnapshot;

// ============================================================================
// SECTION: Repository Provider
// ============================================================================

/// Repository access errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RepositoryError {
    /// No repository exists at the configured path.
    #[error("repository not found: {0}")]
    NotFound(String),
    /// The repository backend reported an error.
    #[error("repository error: {0}")]
    Backend(String),
}

/// Source of repository facts.
pub trait RepositoryProvider: Send + Sync {
    /// Returns a fresh snapshot; degrades to sentinel values on failure.
    fn snapshot(&self) -> RepositorySnapshot;

    /// Lists pending working-tree changes as porcelain-style `XY path` lines.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError`] when the working tree cannot be inspected.
    fn modified_files(&self) -> Result<Vec<String>, RepositoryError>;

    /// Lists local and remote-tracking branches.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError`] when references cannot be enumerated.
    fn branches(&self) -> Result<BranchInventory, RepositoryError>;
}
