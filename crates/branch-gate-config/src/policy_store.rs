// crates/branch-gate-config/src/policy_store.rs
// ============================================================================
// Module: Policy Store
// Description: File-backed branching policy with modification-time caching.
// Purpose: Read and partially update the `.gitrules.yaml` policy document.
// Dependencies: branch-gate-core, serde, serde_yaml, tempfile, thiserror
// ============================================================================

//! ## Overview
//! [`PolicyStore`] owns the policy document for one repository. Reads are
//! cached by file modification time and never fail: a missing, unreadable,
//! malformed, or invalid document degrades to the store's defaults. Fields
//! absent from the document are filled from the defaults.
//!
//! Updates merge only the provided fields into the on-disk YAML mapping, so
//! keys this store does not know about survive. The merged policy is validated
//! before anything is written, and the write is atomic (temporary file plus
//! rename).
//! An existing document that cannot be read or parsed as a mapping fails the
//! update and is left untouched.
//!
//! Invariants:
//! - The cache lock is held across stat, read, and reload.
//! - Defaults are themselves valid ([`PolicyDefaults`] validates on build).

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;
use std::env;
use std::fs;
use std::io::ErrorKind;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::time::SystemTime;

use branch_gate_core::PolicyConfig;
use branch_gate_core::PolicyValidationError;
use branch_gate_core::Severity;
use serde::Deserialize;
use serde::Serialize;
use serde_yaml::Mapping;
use serde_yaml::Value;
use tempfile::NamedTempFile;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Policy document filename at the repository root.
pub const POLICY_FILE_NAME: &str = ".gitrules.yaml";
/// Header line written at the top of updated policy documents.
pub const POLICY_UPDATE_HEADER: &str = "# Updated by branch-gate";
/// Comma-separated protected branch list.
pub const PROTECTED_ENV_VAR: &str = "GIT_RULES_PROTECTED";
/// Feature prefix override.
pub const FEATURE_PREFIX_ENV_VAR: &str = "GIT_RULES_FEATURE_PREFIX";
/// Hotfix prefix override.
pub const HOTFIX_PREFIX_ENV_VAR: &str = "GIT_RULES_HOTFIX_PREFIX";
/// Integration branch override.
pub const INTEGRATION_BRANCH_ENV_VAR: &str = "GIT_RULES_INTEGRATION_BRANCH";
/// Primary branch override.
pub const PRIMARY_BRANCH_ENV_VAR: &str = "GIT_RULES_PRIMARY_BRANCH";
/// Maximum policy document size in bytes.
const MAX_POLICY_FILE_SIZE: u64 = 1024 * 1024;

// ============================================================================
// SECTION: Defaults
// ============================================================================

/// Validated fallback policy used when the document is missing or invalid.
///
/// # Invariants
/// - The wrapped policy passes [`PolicyConfig::validate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyDefaults {
    /// Fallback policy.
    policy: PolicyConfig,
}

impl PolicyDefaults {
    /// Builds defaults from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyValidationError`] when the overrides break the policy invariants.
    pub fn from_env() -> Result<Self, PolicyValidationError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds defaults from an environment-style lookup.
    ///
    /// Blank values are ignored. `GIT_RULES_PROTECTED` is a comma-separated
    /// list; an empty list keeps the built-in protected branches.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyValidationError`] when the overrides break the policy invariants.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, PolicyValidationError> {
        let mut policy = PolicyConfig::default();
        let read = |key: &str| {
            lookup(key).map(|value| value.trim().to_string()).filter(|value| !value.is_empty())
        };
        if let Some(list) = read(PROTECTED_ENV_VAR) {
            let branches: BTreeSet<String> = list
                .split(',')
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .map(str::to_string)
                .collect();
            if !branches.is_empty() {
                policy.protected_branches = branches;
            }
        }
        if let Some(value) = read(FEATURE_PREFIX_ENV_VAR) {
            policy.feature_prefix = value;
        }
        if let Some(value) = read(HOTFIX_PREFIX_ENV_VAR) {
            policy.hotfix_prefix = value;
        }
        if let Some(value) = read(INTEGRATION_BRANCH_ENV_VAR) {
            policy.integration_branch = value;
        }
        if let Some(value) = read(PRIMARY_BRANCH_ENV_VAR) {
            policy.primary_branch = value;
        }
        Self::new(policy)
    }

    /// Wraps an explicit fallback policy.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyValidationError`] when the policy is invalid.
    pub fn new(policy: PolicyConfig) -> Result<Self, PolicyValidationError> {
        policy.validate()?;
        Ok(Self {
            policy,
        })
    }

    /// Returns the fallback policy.
    #[must_use]
    pub const fn policy(&self) -> &PolicyConfig {
        &self.policy
    }
}

impl Default for PolicyDefaults {
    fn default() -> Self {
        Self {
            policy: PolicyConfig::default(),
        }
    }
}

// ============================================================================
// SECTION: Update Request
// ============================================================================

/// Partial policy update; only provided fields are written.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyUpdate {
    /// Replacement protected branch list.
    #[serde(default)]
    pub protected_branches: Option<Vec<String>>,
    /// Replacement feature prefix.
    #[serde(default)]
    pub feature_prefix: Option<String>,
    /// Replacement hotfix prefix.
    #[serde(default)]
    pub hotfix_prefix: Option<String>,
    /// Replacement integration branch.
    #[serde(default)]
    pub integration_branch: Option<String>,
    /// Replacement commit types.
    #[serde(default)]
    pub allowed_commit_types: Option<Vec<String>>,
    /// Replacement primary branch.
    #[serde(default)]
    pub primary_branch: Option<String>,
    /// Direct push override.
    #[serde(default)]
    pub allow_direct_push: Option<bool>,
    /// Clean tree requirement for integration pushes.
    #[serde(default)]
    pub require_clean_working_tree: Option<bool>,
    /// Commit-message format enforcement.
    #[serde(default)]
    pub enforce_commit_message_format: Option<bool>,
    /// Severity for integration-branch commits.
    #[serde(default)]
    pub integration_commit_severity: Option<Severity>,
}

impl PolicyUpdate {
    /// Returns true when no field is provided.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// Writes the provided fields into a YAML mapping using policy key names.
    fn apply(&self, mapping: &mut Mapping) -> Result<(), PolicyStoreError> {
        set_key(mapping, "protectedBranches", self.protected_branches.as_ref())?;
        set_key(mapping, "featurePrefix", self.feature_prefix.as_ref())?;
        set_key(mapping, "hotfixPrefix", self.hotfix_prefix.as_ref())?;
        set_key(mapping, "integrationBranch", self.integration_branch.as_ref())?;
        set_key(mapping, "allowedCommitTypes", self.allowed_commit_types.as_ref())?;
        set_key(mapping, "primaryBranch", self.primary_branch.as_ref())?;
        set_key(mapping, "allowDirectPush", self.allow_direct_push.as_ref())?;
        set_key(mapping, "requireCleanWorkingTree", self.require_clean_working_tree.as_ref())?;
        set_key(
            mapping,
            "enforceCommitMessageFormat",
            self.enforce_commit_message_format.as_ref(),
        )?;
        set_key(mapping, "integrationCommitSeverity", self.integration_commit_severity.as_ref())
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Policy store errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Error)]
pub enum PolicyStoreError {
    /// Reading or writing the policy document failed.
    #[error("policy store io error: {0}")]
    Io(String),
    /// Encoding the policy document failed.
    #[error("policy store serialization error: {0}")]
    Serialize(String),
    /// The resulting policy would be invalid.
    #[error("invalid policy: {0}")]
    Invalid(String),
    /// The existing policy document cannot be merged into.
    #[error("unusable policy document: {0}")]
    Document(String),
}

impl From<PolicyValidationError> for PolicyStoreError {
    fn from(error: PolicyValidationError) -> Self {
        Self::Invalid(error.to_string())
    }
}

// ============================================================================
// SECTION: Store
// ============================================================================

/// Cached policy keyed by document modification time.
#[derive(Debug, Clone)]
struct CachedPolicy {
    /// Modification time of the document the policy was read from.
    modified: SystemTime,
    /// Effective policy.
    policy: PolicyConfig,
}

/// File-backed policy store for one repository.
#[derive(Debug)]
pub struct PolicyStore {
    /// Policy document path.
    path: PathBuf,
    /// Fallback policy.
    defaults: PolicyDefaults,
    /// Cached effective policy.
    cache: Mutex<Option<CachedPolicy>>,
}

impl PolicyStore {
    /// Creates a store for an explicit document path.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, defaults: PolicyDefaults) -> Self {
        Self {
            path: path.into(),
            defaults,
            cache: Mutex::new(None),
        }
    }

    /// Creates a store for `<repo_root>/.gitrules.yaml`.
    #[must_use]
    pub fn for_repository(repo_root: &Path, defaults: PolicyDefaults) -> Self {
        Self::new(repo_root.join(POLICY_FILE_NAME), defaults)
    }

    /// Returns the policy document path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the fallback policy.
    #[must_use]
    pub const fn defaults(&self) -> &PolicyDefaults {
        &self.defaults
    }

    /// Returns the effective policy, reloading when the document changed.
    #[must_use]
    pub fn get(&self) -> PolicyConfig {
        let mut cache = self.lock_cache();
        self.load_locked(&mut cache)
    }

    /// Merges the provided fields into the document and returns the result.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyStoreError::Invalid`] when the merged policy breaks the
    /// policy invariants, [`PolicyStoreError::Document`] when the existing
    /// document is malformed, oversized, or not a mapping, and
    /// [`PolicyStoreError::Io`] when the document cannot be read or written.
    /// Nothing is written on error.
    pub fn update(&self, update: &PolicyUpdate) -> Result<PolicyConfig, PolicyStoreError> {
        let mut cache = self.lock_cache();
        let mut document = self.read_document()?.unwrap_or_default();
        update.apply(&mut document)?;
        let merged = merge_with_defaults(self.defaults.policy(), &document)?;
        merged.validate()?;

        let mut text = String::from(POLICY_UPDATE_HEADER);
        text.push('\n');
        let body = serde_yaml::to_string(&Value::Mapping(document))
            .map_err(|err| PolicyStoreError::Serialize(err.to_string()))?;
        text.push_str(&body);
        self.write_atomic(&text)?;

        *cache = None;
        Ok(self.load_locked(&mut cache))
    }

    /// Locks the cache, recovering from a poisoned lock.
    fn lock_cache(&self) -> MutexGuard<'_, Option<CachedPolicy>> {
        match self.cache.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Returns the effective policy while holding the cache lock.
    fn load_locked(&self, cache: &mut Option<CachedPolicy>) -> PolicyConfig {
        let Ok(modified) = fs::metadata(&self.path).and_then(|meta| meta.modified()) else {
            *cache = None;
            return self.defaults.policy().clone();
        };
        if let Some(cached) = cache.as_ref()
            && cached.modified == modified
        {
            return cached.policy.clone();
        }
        let policy = self
            .read_document()
            .and_then(|document| {
                merge_with_defaults(self.defaults.policy(), &document.unwrap_or_default())
            })
            .and_then(|policy| {
                policy.validate()?;
                Ok(policy)
            })
            .unwrap_or_else(|_| self.defaults.policy().clone());
        *cache = Some(CachedPolicy {
            modified,
            policy: policy.clone(),
        });
        policy
    }

    /// Reads the document as a YAML mapping.
    ///
    /// Returns `None` when the document does not exist; an empty document is
    /// an empty mapping.
    fn read_document(&self) -> Result<Option<Mapping>, PolicyStoreError> {
        let metadata = match fs::metadata(&self.path) {
            Ok(metadata) => metadata,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(PolicyStoreError::Io(err.to_string())),
        };
        if metadata.len() > MAX_POLICY_FILE_SIZE {
            return Err(PolicyStoreError::Document("policy file exceeds size limit".to_string()));
        }
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(PolicyStoreError::Io(err.to_string())),
        };
        let text = String::from_utf8(bytes)
            .map_err(|_| PolicyStoreError::Document("policy file must be utf-8".to_string()))?;
        let value: Value = serde_yaml::from_str(&text)
            .map_err(|err| PolicyStoreError::Document(err.to_string()))?;
        match value {
            Value::Null => Ok(Some(Mapping::new())),
            Value::Mapping(mapping) => Ok(Some(mapping)),
            _ => Err(PolicyStoreError::Document("policy document must be a mapping".to_string())),
        }
    }

    /// Writes the document through a sibling temporary file and rename.
    fn write_atomic(&self, text: &str) -> Result<(), PolicyStoreError> {
        let parent = self
            .path
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let mut temp =
            NamedTempFile::new_in(parent).map_err(|err| PolicyStoreError::Io(err.to_string()))?;
        temp.write_all(text.as_bytes()).map_err(|err| PolicyStoreError::Io(err.to_string()))?;
        temp.as_file().sync_all().map_err(|err| PolicyStoreError::Io(err.to_string()))?;
        temp.persist(&self.path).map_err(|err| PolicyStoreError::Io(err.error.to_string()))?;
        Ok(())
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Overlays document keys onto the defaults and decodes the result.
///
/// Null values in the document are treated as absent.
fn merge_with_defaults(
    defaults: &PolicyConfig,
    document: &Mapping,
) -> Result<PolicyConfig, PolicyStoreError> {
    let base = serde_yaml::to_value(defaults)
        .map_err(|err| PolicyStoreError::Serialize(err.to_string()))?;
    let Value::Mapping(mut merged) = base else {
        return Err(PolicyStoreError::Serialize("policy defaults must encode as a mapping".to_string()));
    };
    for (key, value) in document {
        if !value.is_null() {
            merged.insert(key.clone(), value.clone());
        }
    }
    serde_yaml::from_value(Value::Mapping(merged))
        .map_err(|err| PolicyStoreError::Document(err.to_string()))
}

/// Sets a mapping key when a value is provided.
fn set_key<T: Serialize>(
    mapping: &mut Mapping,
    key: &str,
    value: Option<&T>,
) -> Result<(), PolicyStoreError> {
    if let Some(value) = value {
        let encoded =
            serde_yaml::to_value(value).map_err(|err| PolicyStoreError::Serialize(err.to_string()))?;
        mapping.insert(Value::String(key.to_string()), encoded);
    }
    Ok(())
}
