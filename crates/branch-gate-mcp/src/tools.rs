// crates/branch-gate-mcp/src/tools.rs
// ============================================================================
// Module: MCP Tool Router
// Description: Tool catalog and dispatch for the Branch Gate MCP server.
// Purpose: Decode tool arguments and route them through the rules service.
// Dependencies: branch-gate-config, branch-gate-core, serde, serde_json
// ============================================================================

//! ## Overview
//! The tool router decodes `tools/call` arguments, invokes
//! [`crate::service::GitRulesService`], and returns JSON payloads. Tool inputs
//! are untrusted: unknown tool names and malformed arguments become
//! [`ToolError`] values, while policy violations are ordinary verdict payloads.
//!
//! ## Invariants
//! - Every evaluation reads a fresh snapshot and the current policy.
//! - Identical inputs over an unchanged repository yield identical payloads.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use branch_gate_config::PolicyStoreError;
use branch_gate_config::PolicyUpdate;
use branch_gate_core::Severity;
use branch_gate_core::SimulationResult;
use branch_gate_core::SimulationStep;
use branch_gate_core::Verdict;
use branch_gate_core::WorkflowTask;
use serde::Deserialize;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Map;
use serde_json::Value;
use serde_json::json;
use thiserror::Error;

use crate::service::GitRulesService;
use crate::telemetry::CounterSnapshot;
use crate::telemetry::RequestCounters;
use crate::telemetry::now_rfc3339;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Server name reported by `initialize` and `server_info`.
pub const SERVER_NAME: &str = "branch-gate";
/// Server version reported by `initialize` and `server_info`.
pub const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");
/// MCP protocol revision spoken by the server.
pub const PROTOCOL_VERSION: &str = "2024-11-05";

// ============================================================================
// SECTION: Tool Names
// ============================================================================

/// MCP tool identifiers.
///
/// # Invariants
/// - Labels are stable wire names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolName {
    /// Evaluate one git command.
    ValidateGitCommand,
    /// Replay a command sequence.
    SimulateGitSequence,
    /// Report branch and working-tree state.
    GetRepositoryStatus,
    /// Suggest commands for a workflow task.
    SuggestWorkflow,
    /// Compare existing branches with the policy.
    AnalyzeRepositoryCompliance,
    /// Read or update the policy document.
    PolicyConfig,
    /// Describe the server and its tools.
    ServerInfo,
    /// Report health and request counters.
    ServerHealth,
}

impl ToolName {
    /// Every tool in catalog order.
    pub const ALL: [Self; 8] = [
        Self::ValidateGitCommand,
        Self::SimulateGitSequence,
        Self::GetRepositoryStatus,
        Self::SuggestWorkflow,
        Self::AnalyzeRepositoryCompliance,
        Self::PolicyConfig,
        Self::ServerInfo,
        Self::ServerHealth,
    ];

    /// Returns the wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ValidateGitCommand => "validate_git_command",
            Self::SimulateGitSequence => "simulate_git_sequence",
            Self::GetRepositoryStatus => "get_repository_status",
            Self::SuggestWorkflow => "suggest_workflow",
            Self::AnalyzeRepositoryCompliance => "analyze_repository_compliance",
            Self::PolicyConfig => "policy_config",
            Self::ServerInfo => "server_info",
            Self::ServerHealth => "server_health",
        }
    }

    /// Parses a wire name.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|tool| tool.as_str() == name)
    }

    /// Returns the client-facing description.
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::ValidateGitCommand => {
                "Validate a git command (commit, push, merge) against the branching policy"
            }
            Self::SimulateGitSequence => {
                "Evaluate a hypothetical sequence of git commands without running them"
            }
            Self::GetRepositoryStatus => {
                "Get current branch, branch class, pending changes, and the effective policy"
            }
            Self::SuggestWorkflow => "Get workflow suggestions for common git tasks",
            Self::AnalyzeRepositoryCompliance => {
                "Analyze whether existing branches match the configured branch model"
            }
            Self::PolicyConfig => "Read or partially update the repository policy document",
            Self::ServerInfo => "Server version, tools, and capabilities",
            Self::ServerHealth => "Server health and request counters",
        }
    }
}

impl fmt::Display for ToolName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// SECTION: Tool Definitions
// ============================================================================

/// Tool entry returned by `tools/list`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDefinition {
    /// Tool name.
    pub name: ToolName,
    /// Tool description.
    pub description: String,
    /// JSON schema for the tool arguments.
    pub input_schema: Value,
}

/// Returns the full tool catalog.
#[must_use]
pub fn tool_definitions() -> Vec<ToolDefinition> {
    ToolName::ALL
        .into_iter()
        .map(|name| ToolDefinition {
            name,
            description: name.description().to_string(),
            input_schema: input_schema(name),
        })
        .collect()
}

/// Builds the argument schema for a tool.
fn input_schema(tool: ToolName) -> Value {
    let string_list = json!({ "type": "array", "items": { "type": "string" } });
    match tool {
        ToolName::ValidateGitCommand => json!({
            "type": "object",
            "properties": {
                "command": {
                    "type": "string",
                    "description": "Git command to validate (push, commit, merge)"
                },
                "args": {
                    "type": "array",
                    "items": { "type": "string" },
                    "description": "Command arguments",
                    "default": []
                }
            },
            "required": ["command"]
        }),
        ToolName::SimulateGitSequence => json!({
            "type": "object",
            "properties": {
                "sequence": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "properties": {
                            "command": { "type": "string" },
                            "args": string_list
                        },
                        "required": ["command"]
                    }
                },
                "stopOnViolation": { "type": "boolean", "default": true }
            },
            "required": ["sequence"]
        }),
        ToolName::SuggestWorkflow => json!({
            "type": "object",
            "properties": {
                "task": {
                    "type": "string",
                    "enum": WorkflowTask::ALL.map(WorkflowTask::as_str),
                    "description": "Workflow task to get suggestions for"
                }
            },
            "required": ["task"]
        }),
        ToolName::PolicyConfig => json!({
            "type": "object",
            "properties": {
                "action": { "type": "string", "enum": ["get", "update"], "default": "get" },
                "protectedBranches": string_list,
                "featurePrefix": { "type": "string" },
                "hotfixPrefix": { "type": "string" },
                "integrationBranch": { "type": "string" },
                "allowedCommitTypes": string_list,
                "primaryBranch": { "type": "string" },
                "allowDirectPush": { "type": "boolean" },
                "requireCleanWorkingTree": { "type": "boolean" },
                "enforceCommitMessageFormat": { "type": "boolean" },
                "integrationCommitSeverity": { "type": "string", "enum": ["info", "warn"] }
            }
        }),
        ToolName::GetRepositoryStatus
        | ToolName::AnalyzeRepositoryCompliance
        | ToolName::ServerInfo
        | ToolName::ServerHealth => json!({ "type": "object", "properties": {} }),
    }
}

// ============================================================================
// SECTION: Requests
// ============================================================================

/// `validate_git_command` arguments.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ValidateCommandRequest {
    /// Git command name.
    pub command: String,
    /// Command arguments.
    #[serde(default)]
    pub args: Vec<String>,
}

/// `simulate_git_sequence` arguments.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SimulateSequenceRequest {
    /// Steps in replay order.
    pub sequence: Vec<SimulationStep>,
    /// Stop after the first denied step.
    #[serde(default = "default_stop_on_violation")]
    pub stop_on_violation: bool,
}

/// `suggest_workflow` arguments.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SuggestWorkflowRequest {
    /// Task label.
    pub task: String,
}

/// `policy_config` action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyAction {
    /// Return the current policy.
    #[default]
    Get,
    /// Merge the supplied fields into the policy document.
    Update,
}

/// `policy_config` arguments.
#[derive(Debug, Clone, Deserialize)]
pub struct PolicyConfigRequest {
    /// Requested action.
    #[serde(default)]
    pub action: PolicyAction,
    /// Fields to merge for `update`.
    #[serde(flatten)]
    pub update: PolicyUpdate,
    /// Keys matching neither the action nor a policy field; must be empty.
    #[serde(flatten)]
    pub unknown: Map<String, Value>,
}

/// Arguments for tools that take none; any object is accepted.
#[derive(Debug, Clone, Deserialize)]
struct EmptyRequest {}

/// Default for `stopOnViolation`.
const fn default_stop_on_violation() -> bool {
    true
}

// ============================================================================
// SECTION: Responses
// ============================================================================

/// Allowed flag and severity extracted from evaluation tools for auditing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VerdictSummary {
    /// Whether the evaluated operation (or every step) was allowed.
    pub allowed: bool,
    /// Highest severity reported.
    pub severity: Severity,
}

impl VerdictSummary {
    /// Summarizes a single verdict.
    #[must_use]
    pub const fn from_verdict(verdict: &Verdict) -> Self {
        Self {
            allowed: verdict.allowed,
            severity: verdict.severity,
        }
    }

    /// Summarizes a simulation; `None` when no step was evaluated.
    #[must_use]
    pub fn from_simulation(result: &SimulationResult) -> Option<Self> {
        let severity = result.results.iter().map(|step| step.verdict.severity).max()?;
        Some(Self {
            allowed: result.first_violation.is_none(),
            severity,
        })
    }
}

/// Result of a routed tool call.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolCallOutcome {
    /// JSON payload returned to the client.
    pub payload: Value,
    /// Verdict summary for evaluation tools.
    pub verdict: Option<VerdictSummary>,
}

impl ToolCallOutcome {
    /// Wraps a payload with no verdict.
    fn plain(payload: Value) -> Self {
        Self {
            payload,
            verdict: None,
        }
    }
}

/// Health classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    /// Fully operational.
    Ok,
    /// Serving, with a failing check.
    Degraded,
}

/// One named health check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthCheck {
    /// Check name.
    pub name: &'static str,
    /// Check result.
    pub status: HealthStatus,
    /// Human-readable detail.
    pub detail: String,
}

/// `server_health` payload.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthReport {
    /// Overall status; degraded when any check is.
    pub status: HealthStatus,
    /// RFC 3339 report time.
    pub timestamp: String,
    /// Individual checks.
    pub checks: Vec<HealthCheck>,
    /// Request counters.
    #[serde(flatten)]
    pub counters: CounterSnapshot,
}

// ============================================================================
// SECTION: Tool Router
// ============================================================================

/// Tool router for MCP requests.
#[derive(Clone)]
pub struct ToolRouter {
    /// Rules service all tools delegate to.
    service: GitRulesService,
    /// Request counters reported by `server_health`.
    counters: Arc<RequestCounters>,
}

impl ToolRouter {
    /// Creates a router over the service and shared counters.
    #[must_use]
    pub const fn new(service: GitRulesService, counters: Arc<RequestCounters>) -> Self {
        Self {
            service,
            counters,
        }
    }

    /// Returns the request counters.
    #[must_use]
    pub fn counters(&self) -> &Arc<RequestCounters> {
        &self.counters
    }

    /// Handles a tool call by name with JSON arguments.
    ///
    /// # Errors
    ///
    /// Returns [`ToolError`] for unknown tools, malformed arguments, or
    /// policy store failures.
    pub fn handle_tool_call(
        &self,
        name: &str,
        arguments: Value,
    ) -> Result<ToolCallOutcome, ToolError> {
        let tool = ToolName::parse(name).ok_or_else(|| ToolError::UnknownTool(name.to_string()))?;
        match tool {
            ToolName::ValidateGitCommand => self.handle_validate(arguments),
            ToolName::SimulateGitSequence => self.handle_simulate(arguments),
            ToolName::GetRepositoryStatus => {
                decode::<EmptyRequest>(arguments)?;
                encode(&self.service.status()).map(ToolCallOutcome::plain)
            }
            ToolName::SuggestWorkflow => {
                let request = decode::<SuggestWorkflowRequest>(arguments)?;
                encode(&self.service.suggest(&request.task)).map(ToolCallOutcome::plain)
            }
            ToolName::AnalyzeRepositoryCompliance => {
                decode::<EmptyRequest>(arguments)?;
                encode(&self.service.compliance()).map(ToolCallOutcome::plain)
            }
            ToolName::PolicyConfig => self.handle_policy(arguments),
            ToolName::ServerInfo => {
                decode::<EmptyRequest>(arguments)?;
                Ok(ToolCallOutcome::plain(self.server_info()))
            }
            ToolName::ServerHealth => {
                decode::<EmptyRequest>(arguments)?;
                encode(&self.health()).map(ToolCallOutcome::plain)
            }
        }
    }

    /// Handles `validate_git_command`.
    fn handle_validate(&self, arguments: Value) -> Result<ToolCallOutcome, ToolError> {
        let request = decode::<ValidateCommandRequest>(arguments)?;
        if request.command.trim().is_empty() {
            return Err(ToolError::InvalidParams("command must be non-empty".to_string()));
        }
        let verdict = self.service.evaluate(request.command.trim(), &request.args);
        Ok(ToolCallOutcome {
            payload: encode(&verdict)?,
            verdict: Some(VerdictSummary::from_verdict(&verdict)),
        })
    }

    /// Handles `simulate_git_sequence`.
    fn handle_simulate(&self, arguments: Value) -> Result<ToolCallOutcome, ToolError> {
        let request = decode::<SimulateSequenceRequest>(arguments)?;
        let result = self.service.simulate(&request.sequence, request.stop_on_violation);
        Ok(ToolCallOutcome {
            payload: encode(&result)?,
            verdict: VerdictSummary::from_simulation(&result),
        })
    }

    /// Handles `policy_config`.
    fn handle_policy(&self, arguments: Value) -> Result<ToolCallOutcome, ToolError> {
        let request = decode::<PolicyConfigRequest>(arguments)?;
        if let Some(key) = request.unknown.keys().next() {
            return Err(ToolError::InvalidParams(format!("unknown policy field: {key}")));
        }
        let policy = match request.action {
            PolicyAction::Get => {
                if !request.update.is_empty() {
                    return Err(ToolError::InvalidParams(
                        "policy fields require action 'update'".to_string(),
                    ));
                }
                self.service.policy()
            }
            PolicyAction::Update => {
                if request.update.is_empty() {
                    return Err(ToolError::InvalidParams(
                        "policy update requires at least one field".to_string(),
                    ));
                }
                self.service.update_policy(&request.update)?
            }
        };
        encode(&policy).map(ToolCallOutcome::plain)
    }

    /// Builds the `server_info` payload.
    fn server_info(&self) -> Value {
        let tools: Vec<Value> = ToolName::ALL
            .into_iter()
            .map(|tool| json!({ "name": tool.as_str(), "description": tool.description() }))
            .collect();
        json!({
            "name": SERVER_NAME,
            "version": SERVER_VERSION,
            "protocolVersion": PROTOCOL_VERSION,
            "tools": tools,
            "capabilities": ["transport:stdio", "transport:http", "format:json"],
            "policyFile": self.service.store().path().display().to_string(),
        })
    }

    /// Builds the `server_health` report.
    fn health(&self) -> HealthReport {
        let snapshot = self.service.snapshot();
        let repository = if snapshot.is_branch_unknown() {
            HealthCheck {
                name: "repository.access",
                status: HealthStatus::Degraded,
                detail: "repository unavailable".to_string(),
            }
        } else {
            HealthCheck {
                name: "repository.access",
                status: HealthStatus::Ok,
                detail: format!("on branch {}", snapshot.current_branch),
            }
        };
        let policy_path = self.service.store().path();
        let policy = HealthCheck {
            name: "policy.document",
            status: HealthStatus::Ok,
            detail: if policy_path.is_file() {
                format!("loaded from {}", policy_path.display())
            } else {
                "defaults in use".to_string()
            },
        };
        let checks = vec![repository, policy];
        let status = if checks.iter().any(|check| check.status == HealthStatus::Degraded) {
            HealthStatus::Degraded
        } else {
            HealthStatus::Ok
        };
        HealthReport {
            status,
            timestamp: now_rfc3339(),
            checks,
            counters: self.counters.snapshot(),
        }
    }
}

// ============================================================================
// SECTION: Codec Helpers
// ============================================================================

/// Decodes tool arguments; a missing argument object is treated as empty.
fn decode<T: DeserializeOwned>(arguments: Value) -> Result<T, ToolError> {
    let arguments = if arguments.is_null() { Value::Object(Map::new()) } else { arguments };
    serde_json::from_value(arguments).map_err(|err| ToolError::InvalidParams(err.to_string()))
}

/// Encodes a tool payload.
fn encode<T: Serialize>(value: &T) -> Result<Value, ToolError> {
    serde_json::to_value(value).map_err(|_| ToolError::Serialization)
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Tool routing errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ToolError {
    /// Tool name not recognized.
    #[error("unknown tool: {0}")]
    UnknownTool(String),
    /// Tool arguments failed to decode or validate.
    #[error("invalid parameters: {0}")]
    InvalidParams(String),
    /// The policy document could not be updated.
    #[error("policy store failure: {0}")]
    PolicyStore(String),
    /// Tool payload serialization failed.
    #[error("serialization failure")]
    Serialization,
}

impl From<PolicyStoreError> for ToolError {
    fn from(error: PolicyStoreError) -> Self {
        match error {
            PolicyStoreError::Invalid(_) => Self::InvalidParams(error.to_string()),
            PolicyStoreError::Io(_)
            | PolicyStoreError::Serialize(_)
            | PolicyStoreError::Document(_) => Self::PolicyStore(error.to_string()),
        }
    }
}
