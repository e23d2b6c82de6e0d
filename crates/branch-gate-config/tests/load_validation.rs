//! Config load validation tests for branch-gate-config.
// crates/branch-gate-config/tests/load_validation.rs
// =============================================================================
// Module: Config Load Validation Tests
// Description: Validate config loading guards (path, size, encoding) and fields.
// Purpose: Ensure config input handling is strict and fail-closed.
// =============================================================================

use std::io::Write;
use std::path::Path;

use branch_gate_config::BranchGateConfig;
use branch_gate_config::ConfigError;
use branch_gate_config::RepositoryConfig;
use branch_gate_config::ServerTransport;
use tempfile::NamedTempFile;

type TestResult = Result<(), String>;

fn assert_invalid(result: Result<BranchGateConfig, ConfigError>, needle: &str) -> TestResult {
    match result {
        Err(error) => {
            let message = error.to_string();
            if message.contains(needle) {
                Ok(())
            } else {
                Err(format!("error {message} did not contain {needle}"))
            }
        }
        Ok(_) => Err("expected invalid config load".to_string()),
    }
}

#[test]
fn load_rejects_path_too_long() -> TestResult {
    let long_path = "a".repeat(5_000);
    let path = Path::new(&long_path);
    assert_invalid(BranchGateConfig::load(Some(path)), "config path exceeds max length")
}

#[test]
fn load_rejects_path_component_too_long() -> TestResult {
    let long_component = "a".repeat(300);
    let path = Path::new(&long_component);
    assert_invalid(BranchGateConfig::load(Some(path)), "config path component too long")
}

#[test]
fn load_rejects_oversized_file() -> TestResult {
    let mut file = NamedTempFile::new().map_err(|err| err.to_string())?;
    let payload = vec![b'a'; 1_048_577];
    file.write_all(&payload).map_err(|err| err.to_string())?;
    assert_invalid(BranchGateConfig::load(Some(file.path())), "config file exceeds size limit")
}

#[test]
fn load_rejects_non_utf8_file() -> TestResult {
    let mut file = NamedTempFile::new().map_err(|err| err.to_string())?;
    file.write_all(&[0xFF, 0xFE, 0xFF]).map_err(|err| err.to_string())?;
    assert_invalid(BranchGateConfig::load(Some(file.path())), "config file must be utf-8")
}

#[test]
fn load_reports_missing_explicit_file() -> TestResult {
    let dir = tempfile::tempdir().map_err(|err| err.to_string())?;
    let path = dir.path().join("absent.toml");
    assert_invalid(BranchGateConfig::load(Some(&path)), "config io error")
}

#[test]
fn parse_rejects_unknown_fields() -> TestResult {
    assert_invalid(BranchGateConfig::parse("[server]\nmode = \"strict\"\n"), "config parse error")
}

#[test]
fn http_transport_requires_loopback_bind() -> TestResult {
    assert_invalid(
        BranchGateConfig::parse("[server]\ntransport = \"http\"\n"),
        "http transport requires bind address",
    )?;
    assert_invalid(
        BranchGateConfig::parse("[server]\ntransport = \"http\"\nbind = \"nope\"\n"),
        "invalid bind address",
    )?;
    assert_invalid(
        BranchGateConfig::parse("[server]\ntransport = \"http\"\nbind = \"0.0.0.0:8089\"\n"),
        "non-loopback bind disallowed",
    )
}

#[test]
fn zero_body_limit_is_rejected() -> TestResult {
    assert_invalid(
        BranchGateConfig::parse("[server]\nmax_body_bytes = 0\n"),
        "max_body_bytes must be greater than zero",
    )
}

#[test]
fn full_config_parses() -> TestResult {
    let mut file = NamedTempFile::new().map_err(|err| err.to_string())?;
    let text = r#"
[server]
transport = "http"
bind = "127.0.0.1:9000"
max_body_bytes = 4096

[server.audit]
enabled = false

[repository]
path = "/srv/repo"
policy_file = "config/rules.yaml"
"#;
    file.write_all(text.as_bytes()).map_err(|err| err.to_string())?;
    let config = BranchGateConfig::load(Some(file.path())).map_err(|err| err.to_string())?;
    if config.server.transport != ServerTransport::Http {
        return Err("expected http transport".to_string());
    }
    if config.server.audit.enabled || config.server.max_body_bytes != 4096 {
        return Err("server fields not applied".to_string());
    }
    let root = config.repository.resolve_root(|_| None);
    if root != Path::new("/srv/repo") {
        return Err(format!("unexpected root {}", root.display()));
    }
    if config.repository.policy_path(&root) != Path::new("/srv/repo/config/rules.yaml") {
        return Err("unexpected policy path".to_string());
    }
    Ok(())
}

#[test]
fn repository_root_falls_back_to_env_then_cwd() -> TestResult {
    let repository = RepositoryConfig::default();
    let from_env = repository.resolve_root(|key| {
        (key == "GIT_RULES_REPO_PATH").then(|| "/env/repo".to_string())
    });
    if from_env != Path::new("/env/repo") {
        return Err("env root not used".to_string());
    }
    if repository.resolve_root(|_| None) != Path::new(".") {
        return Err("cwd fallback not used".to_string());
    }
    if repository.policy_path(Path::new(".")) != Path::new("./.gitrules.yaml") {
        return Err("default policy file not used".to_string());
    }
    Ok(())
}
