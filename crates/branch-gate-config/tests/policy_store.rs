// crates/branch-gate-config/tests/policy_store.rs
// ============================================================================
// Module: Policy Store Tests
// Description: Tests for policy reads, caching, and partial updates.
// Purpose: Validate degradation, cache invalidation, and merge-preserving writes.
// ============================================================================

//! Policy store behavior tests.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only assertions and helpers are permitted."
)]

use std::fs;
use std::fs::File;
use std::time::Duration;
use std::time::SystemTime;

use branch_gate_config::POLICY_FILE_NAME;
use branch_gate_config::POLICY_UPDATE_HEADER;
use branch_gate_config::PolicyDefaults;
use branch_gate_config::PolicyStore;
use branch_gate_config::PolicyStoreError;
use branch_gate_config::PolicyUpdate;
use branch_gate_core::PolicyConfig;
use branch_gate_core::Severity;

fn store_in(dir: &tempfile::TempDir) -> PolicyStore {
    PolicyStore::for_repository(dir.path(), PolicyDefaults::default())
}

// ============================================================================
// SECTION: Reads
// ============================================================================

#[test]
fn missing_document_yields_defaults() {
    let dir = tempfile::tempdir().unwrap();
    assert_eq!(store_in(&dir).get(), PolicyConfig::default());
}

#[test]
fn partial_document_is_filled_from_defaults() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join(POLICY_FILE_NAME),
        "protectedBranches: [main, release]\nfeaturePrefix: feat/\nteam: platform\n",
    )
    .unwrap();
    let policy = store_in(&dir).get();
    assert!(policy.is_protected("release"));
    assert!(!policy.is_protected("master"));
    assert_eq!(policy.feature_prefix, "feat/");
    assert_eq!(policy.hotfix_prefix, "hotfix/");
    assert_eq!(policy.integration_branch, "develop");
}

#[test]
fn malformed_document_degrades_to_defaults() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join(POLICY_FILE_NAME), "protectedBranches: [main\n").unwrap();
    assert_eq!(store_in(&dir).get(), PolicyConfig::default());
}

#[test]
fn invalid_document_degrades_to_defaults() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join(POLICY_FILE_NAME), "featurePrefix: fix/\nhotfixPrefix: fix/\n")
        .unwrap();
    assert_eq!(store_in(&dir).get(), PolicyConfig::default());
}

#[test]
fn empty_document_yields_defaults() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join(POLICY_FILE_NAME), "").unwrap();
    assert_eq!(store_in(&dir).get(), PolicyConfig::default());
}

#[test]
fn changed_modification_time_triggers_reload() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(POLICY_FILE_NAME);
    let store = store_in(&dir);
    fs::write(&path, "integrationBranch: dev\n").unwrap();
    let first_time = SystemTime::UNIX_EPOCH + Duration::from_secs(1_000_000);
    File::options().write(true).open(&path).unwrap().set_modified(first_time).unwrap();
    assert_eq!(store.get().integration_branch, "dev");

    fs::write(&path, "integrationBranch: trunk\n").unwrap();
    File::options().write(true).open(&path).unwrap().set_modified(first_time).unwrap();
    assert_eq!(store.get().integration_branch, "dev");

    let second_time = first_time + Duration::from_secs(60);
    File::options().write(true).open(&path).unwrap().set_modified(second_time).unwrap();
    assert_eq!(store.get().integration_branch, "trunk");
}

// ============================================================================
// SECTION: Updates
// ============================================================================

#[test]
fn update_preserves_unrelated_keys_and_writes_header() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(POLICY_FILE_NAME);
    fs::write(&path, "owner: platform-team\nfeaturePrefix: feat/\n").unwrap();
    let store = store_in(&dir);
    let update = PolicyUpdate {
        hotfix_prefix: Some("fix/".to_string()),
        integration_commit_severity: Some(Severity::Info),
        ..PolicyUpdate::default()
    };
    let policy = store.update(&update).unwrap();
    assert_eq!(policy.feature_prefix, "feat/");
    assert_eq!(policy.hotfix_prefix, "fix/");
    assert_eq!(policy.integration_commit_severity, Severity::Info);

    let text = fs::read_to_string(&path).unwrap();
    assert!(text.starts_with(POLICY_UPDATE_HEADER));
    assert!(text.contains("owner: platform-team"));
    assert_eq!(store.get(), policy);
}

#[test]
fn update_creates_missing_document() {
    let dir = tempfile::tempdir().unwrap();
    let store = store_in(&dir);
    let update = PolicyUpdate {
        protected_branches: Some(vec!["main".to_string(), "release".to_string()]),
        ..PolicyUpdate::default()
    };
    let policy = store.update(&update).unwrap();
    assert!(policy.is_protected("release"));
    assert!(dir.path().join(POLICY_FILE_NAME).is_file());
}

#[test]
fn update_rejects_overlapping_prefixes_without_writing() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(POLICY_FILE_NAME);
    fs::write(&path, "featurePrefix: feature/\n").unwrap();
    let store = store_in(&dir);
    let update = PolicyUpdate {
        hotfix_prefix: Some("feature/".to_string()),
        ..PolicyUpdate::default()
    };
    let error = store.update(&update).unwrap_err();
    assert!(matches!(error, PolicyStoreError::Invalid(_)));
    assert_eq!(fs::read_to_string(&path).unwrap(), "featurePrefix: feature/\n");
}

#[test]
fn update_refuses_malformed_document_without_writing() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(POLICY_FILE_NAME);
    let original = "owner: team-a\nnotes: [unclosed\nfeaturePrefix: feat/\n";
    fs::write(&path, original).unwrap();
    let store = store_in(&dir);
    let update = PolicyUpdate {
        hotfix_prefix: Some("fix/".to_string()),
        ..PolicyUpdate::default()
    };
    let error = store.update(&update).unwrap_err();
    assert!(matches!(error, PolicyStoreError::Document(_)));
    assert_eq!(fs::read_to_string(&path).unwrap(), original);
}

#[test]
fn update_refuses_non_mapping_document_without_writing() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(POLICY_FILE_NAME);
    fs::write(&path, "- main\n- develop\n").unwrap();
    let store = store_in(&dir);
    let update = PolicyUpdate {
        primary_branch: Some("main".to_string()),
        ..PolicyUpdate::default()
    };
    let error = store.update(&update).unwrap_err();
    assert!(matches!(error, PolicyStoreError::Document(_)));
    assert_eq!(fs::read_to_string(&path).unwrap(), "- main\n- develop\n");
}

#[test]
fn update_surfaces_write_failures() {
    let dir = tempfile::tempdir().unwrap();
    let store = PolicyStore::new(
        dir.path().join("missing-dir").join(POLICY_FILE_NAME),
        PolicyDefaults::default(),
    );
    let update = PolicyUpdate {
        feature_prefix: Some("feat/".to_string()),
        ..PolicyUpdate::default()
    };
    let error = store.update(&update).unwrap_err();
    assert!(matches!(error, PolicyStoreError::Io(_)));
}

// ============================================================================
// SECTION: Defaults
// ============================================================================

#[test]
fn env_lookup_overrides_defaults() {
    let defaults = PolicyDefaults::from_lookup(|key| match key {
        "GIT_RULES_PROTECTED" => Some(" main , prod ,, ".to_string()),
        "GIT_RULES_FEATURE_PREFIX" => Some("feat/".to_string()),
        "GIT_RULES_INTEGRATION_BRANCH" => Some("dev".to_string()),
        "GIT_RULES_HOTFIX_PREFIX" => Some("   ".to_string()),
        _ => None,
    })
    .unwrap();
    let policy = defaults.policy();
    assert!(policy.is_protected("prod"));
    assert!(!policy.is_protected("master"));
    assert_eq!(policy.feature_prefix, "feat/");
    assert_eq!(policy.hotfix_prefix, "hotfix/");
    assert_eq!(policy.integration_branch, "dev");
}

#[test]
fn env_lookup_rejects_overlapping_prefixes() {
    let result = PolicyDefaults::from_lookup(|key| {
        (key == "GIT_RULES_HOTFIX_PREFIX").then(|| "feature/".to_string())
    });
    assert!(result.is_err());
}
