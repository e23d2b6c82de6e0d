// crates/branch-gate-config/src/lib.rs
// ============================================================================
// Module: Branch Gate Config Library
// Description: Server configuration and the file-backed policy store.
// Purpose: Single source of truth for branch-gate.toml and .gitrules.yaml.
// Dependencies: branch-gate-core, serde, serde_yaml, tempfile, toml
// ============================================================================

//! ## Overview
//! `branch-gate-config` loads the server configuration (`branch-gate.toml`)
//! with strict, fail-closed validation, and owns the repository policy
//! document (`.gitrules.yaml`) through [`PolicyStore`].

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;
pub mod policy_store;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::*;
pub use policy_store::*;
