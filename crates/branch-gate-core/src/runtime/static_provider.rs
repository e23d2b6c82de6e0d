// crates/branch-gate-core/src/runtime/static_provider.rs
// ============================================================================
// Module: Static Repository Provider
// Description: In-memory repository provider with fixed facts.
// Purpose: Drive evaluation in tests and dry runs without a git repository.
// Dependencies: crate::core, crate::interfaces
// ============================================================================

//! ## Overview
//! [`StaticRepositoryProvider`] returns the facts it was built with. Listing
//! failures can be injected to exercise the degraded paths of callers.

// ============================================================================
// SECTION: Imports
// ============================================================================

use crate::core::BranchInventory;
use crate::core::RepositorySnapshot;
use crate::interfaces::RepositoryError;
use crate::interfaces::RepositoryProvider;

// ============================================================================
// SECTION: Provider
// ============================================================================

/// Repository provider backed by fixed values.
///
/// # Invariants
/// - Every call returns the configured values unchanged.
#[derive(Debug, Clone)]
pub struct StaticRepositoryProvider {
    /// Snapshot returned on every call.
    snapshot: RepositorySnapshot,
    /// Modified files, or the error to report.
    modified_files: Result<Vec<String>, RepositoryError>,
    /// Branch inventory, or the error to report.
    branches: Result<BranchInventory, RepositoryError>,
}

impl StaticRepositoryProvider {
    /// Creates a provider with a snapshot, no changes, and no branches.
    #[must_use]
    pub fn new(snapshot: RepositorySnapshot) -> Self {
        Self {
            snapshot,
            modified_files: Ok(Vec::new()),
            branches: Ok(BranchInventory::default()),
        }
    }

    /// Sets the listed working-tree changes.
    #[must_use]
    pub fn with_modified_files(mut self, files: Vec<String>) -> Self {
        self.modified_files = Ok(files);
        self
    }

    /// Sets the branch inventory.
    #[must_use]
    pub fn with_branches(mut self, branches: BranchInventory) -> Self {
        self.branches = Ok(branches);
        self
    }

    /// Makes both listing operations fail with the given error.
    #[must_use]
    pub fn with_listing_error(mut self, error: RepositoryError) -> Self {
        self.modified_files = Err(error.clone());
        self.branches = Err(error);
        self
    }
}

impl Default for StaticRepositoryProvider {
    fn default() -> Self {
        Self::new(RepositorySnapshot::unavailable())
    }
}

impl RepositoryProvider for StaticRepositoryProvider {
    fn snapshot(&self) -> RepositorySnapshot {
        self.snapshot.clone()
    }

    fn modified_files(&self) -> Result<Vec<String>, RepositoryError> {
        self.modified_files.clone()
    }

    fn branches(&self) -> Result<BranchInventory, RepositoryError> {
        self.branches.clone()
    }
}
