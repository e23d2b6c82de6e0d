// crates/branch-gate-config/src/config.rs
// ============================================================================
// Module: Branch Gate Configuration
// Description: Server configuration loading and validation.
// Purpose: Provide strict, fail-closed config parsing with hard limits.
// Dependencies: serde, thiserror, toml
// ============================================================================

//! ## Overview
//! Configuration is loaded from a TOML file with strict size and path limits.
//! The path comes from the caller, then `BRANCH_GATE_CONFIG`, then
//! `./branch-gate.toml` when present. With none of those, defaults apply: a
//! stdio server rooted at the working directory.
//!
//! ```toml
//! [server]
//! transport = "http"
//! bind = "127.0.0.1:8089"
//!
//! [server.audit]
//! enabled = false
//!
//! [repository]
//! path = "/work/repo"
//! ```

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::env;
use std::fs;
use std::net::SocketAddr;
use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::policy_store::POLICY_FILE_NAME;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default configuration filename when no path is specified.
pub const DEFAULT_CONFIG_NAME: &str = "branch-gate.toml";
/// Environment variable used to override the config path.
pub const CONFIG_ENV_VAR: &str = "BRANCH_GATE_CONFIG";
/// Environment variable naming the repository root when not configured.
pub const REPO_PATH_ENV_VAR: &str = "GIT_RULES_REPO_PATH";
/// Maximum configuration file size in bytes.
pub(crate) const MAX_CONFIG_FILE_SIZE: usize = 1024 * 1024;
/// Maximum length of a single path component.
pub(crate) const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
pub(crate) const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Default HTTP bind address.
pub const DEFAULT_HTTP_BIND: &str = "127.0.0.1:8089";

// ============================================================================
// SECTION: Configuration Types
// ============================================================================

/// Branch Gate server configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BranchGateConfig {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Repository location configuration.
    #[serde(default)]
    pub repository: RepositoryConfig,
}

impl BranchGateConfig {
    /// Loads configuration from disk using the default resolution rules.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when loading or validation fails.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let env_path = env::var(CONFIG_ENV_VAR).ok();
        let Some(resolved) = resolve_path(path, env_path.as_deref())? else {
            return Ok(Self::default());
        };
        Self::load_file(&resolved)
    }

    /// Loads and validates configuration from an explicit file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the path, file, or contents are invalid.
    pub fn load_file(path: &Path) -> Result<Self, ConfigError> {
        validate_path(path)?;
        let bytes = fs::read(path).map_err(|err| ConfigError::Io(err.to_string()))?;
        if bytes.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let content = std::str::from_utf8(&bytes)
            .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
        Self::parse(content)
    }

    /// Parses and validates configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when parsing or validation fails.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let config: Self =
            toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.server.validate()?;
        self.repository.validate()
    }
}

/// Server configuration for MCP transports.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Transport type for MCP.
    #[serde(default)]
    pub transport: ServerTransport,
    /// Bind address for the HTTP transport.
    #[serde(default)]
    pub bind: Option<String>,
    /// Maximum request body size in bytes.
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
    /// Audit logging configuration.
    #[serde(default)]
    pub audit: ServerAuditConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            transport: ServerTransport::Stdio,
            bind: None,
            max_body_bytes: default_max_body_bytes(),
            audit: ServerAuditConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Validates server transport configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.max_body_bytes == 0 {
            return Err(ConfigError::Invalid(
                "max_body_bytes must be greater than zero".to_string(),
            ));
        }
        if self.transport == ServerTransport::Http {
            let addr = self.bind_addr()?;
            if !addr.ip().is_loopback() {
                return Err(ConfigError::Invalid(
                    "non-loopback bind disallowed for http transport".to_string(),
                ));
            }
        }
        Ok(())
    }

    /// Returns the parsed HTTP bind address.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the bind address is missing or invalid.
    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        let bind = self.bind.as_deref().unwrap_or_default().trim();
        if bind.is_empty() {
            return Err(ConfigError::Invalid("http transport requires bind address".to_string()));
        }
        bind.parse().map_err(|_| ConfigError::Invalid("invalid bind address".to_string()))
    }
}

/// Audit logging configuration for MCP server requests.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServerAuditConfig {
    /// Enable structured audit logging on stderr.
    #[serde(default = "default_audit_enabled")]
    pub enabled: bool,
}

impl Default for ServerAuditConfig {
    fn default() -> Self {
        Self {
            enabled: default_audit_enabled(),
        }
    }
}

/// Supported MCP transport types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ServerTransport {
    /// Use stdin/stdout transport.
    #[default]
    Stdio,
    /// Use HTTP JSON-RPC transport.
    Http,
}

impl ServerTransport {
    /// Returns a stable label for the transport.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Stdio => "stdio",
            Self::Http => "http",
        }
    }
}

/// Repository location configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RepositoryConfig {
    /// Repository root; defaults to `GIT_RULES_REPO_PATH` or the working directory.
    #[serde(default)]
    pub path: Option<String>,
    /// Policy document path, relative to the repository root unless absolute.
    #[serde(default)]
    pub policy_file: Option<String>,
}

impl RepositoryConfig {
    /// Validates repository path settings.
    fn validate(&self) -> Result<(), ConfigError> {
        if let Some(path) = &self.path {
            validate_path_string("repository.path", path)?;
        }
        if let Some(path) = &self.policy_file {
            validate_path_string("repository.policy_file", path)?;
        }
        Ok(())
    }

    /// Resolves the repository root using the supplied environment lookup.
    #[must_use]
    pub fn resolve_root(&self, lookup: impl Fn(&str) -> Option<String>) -> PathBuf {
        self.path
            .as_deref()
            .map(str::trim)
            .map(PathBuf::from)
            .or_else(|| {
                lookup(REPO_PATH_ENV_VAR)
                    .filter(|value| !value.trim().is_empty())
                    .map(|value| PathBuf::from(value.trim()))
            })
            .unwrap_or_else(|| PathBuf::from("."))
    }

    /// Resolves the repository root from the process environment.
    #[must_use]
    pub fn root(&self) -> PathBuf {
        self.resolve_root(|key| env::var(key).ok())
    }

    /// Returns the policy document path under the given repository root.
    #[must_use]
    pub fn policy_path(&self, root: &Path) -> PathBuf {
        self.policy_file.as_deref().map_or_else(
            || root.join(POLICY_FILE_NAME),
            |file| root.join(file.trim()),
        )
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration loading or validation errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O failure while reading configuration.
    #[error("config io error: {0}")]
    Io(String),
    /// TOML parsing error.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Invalid configuration data.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Resolves the config path from the caller, environment, or working directory.
///
/// Returns `None` when nothing was requested and no default file exists.
fn resolve_path(path: Option<&Path>, env_path: Option<&str>) -> Result<Option<PathBuf>, ConfigError> {
    if let Some(path) = path {
        return Ok(Some(path.to_path_buf()));
    }
    if let Some(env_path) = env_path {
        if env_path.len() > MAX_TOTAL_PATH_LENGTH {
            return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
        }
        return Ok(Some(PathBuf::from(env_path)));
    }
    let fallback = PathBuf::from(DEFAULT_CONFIG_NAME);
    Ok(fallback.is_file().then_some(fallback))
}

/// Validates the resolved path against security limits.
fn validate_path(path: &Path) -> Result<(), ConfigError> {
    let text = path.to_string_lossy();
    if text.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
    }
    for component in path.components() {
        let value = component.as_os_str().to_string_lossy();
        if value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid("config path component too long".to_string()));
        }
    }
    Ok(())
}

/// Validates a path string against length constraints.
fn validate_path_string(field: &str, value: &str) -> Result<(), ConfigError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::Invalid(format!("{field} must be non-empty")));
    }
    if trimmed.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid(format!("{field} exceeds max length")));
    }
    for component in Path::new(trimmed).components() {
        let component_value = component.as_os_str().to_string_lossy();
        if component_value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid(format!("{field} path component too long")));
        }
    }
    Ok(())
}

/// Default maximum request body size in bytes.
pub(crate) const fn default_max_body_bytes() -> usize {
    1024 * 1024
}

/// Default audit logging enabled.
pub(crate) const fn default_audit_enabled() -> bool {
    true
}
