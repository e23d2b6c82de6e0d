// crates/branch-gate-core/src/core/mod.rs
// ============================================================================
// Module: Branch Gate Core Model
// Description: Policy, snapshot, verdict, and advisory report types.
// Purpose: Group the pure data model consumed by the runtime.
// Dependencies: serde, thiserror
// ============================================================================

//! ## Overview
//! The core model is backend-agnostic: nothing here touches the filesystem or
//! git. Types serialize with stable labels for MCP clients.

pub mod branch;
pub mod commit_message;
pub mod compliance;
pub mod policy;
pub mod snapshot;
pub mod status;
pub mod verdict;
pub mod workflow;

pub use branch::BranchClass;
pub use branch::classify_branch;
pub use commit_message::CommitMessageCheck;
pub use commit_message::extract_commit_message;
pub use commit_message::validate_commit_message;
pub use compliance::BranchInventory;
pub use compliance::ComplianceIssue;
pub use compliance::ComplianceIssueKind;
pub use compliance::ComplianceReport;
pub use compliance::ComplianceSummary;
pub use compliance::analyze_compliance;
pub use policy::PolicyConfig;
pub use policy::PolicyValidationError;
pub use policy::Severity;
pub use snapshot::RepositorySnapshot;
pub use snapshot::UNKNOWN_BRANCH;
pub use status::MODIFIED_FILES_UNAVAILABLE;
pub use status::RepositoryStatus;
pub use verdict::SimulationResult;
pub use verdict::SimulationStep;
pub use verdict::StepVerdict;
pub use verdict::Verdict;
pub use verdict::VerdictBasis;
pub use workflow::WorkflowSuggestion;
pub use workflow::WorkflowTask;
pub use workflow::suggest_workflow;
