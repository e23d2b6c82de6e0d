// crates/branch-gate-mcp/src/lib.rs
// ============================================================================
// Module: Branch Gate MCP
// Description: MCP server exposing the Branch Gate rules service.
// Purpose: Serve policy-advisory tools over JSON-RPC 2.0 on stdio and HTTP.
// Dependencies: branch-gate-core, branch-gate-config, axum, tokio
// ============================================================================

//! ## Overview
//! Branch Gate MCP exposes rule evaluation, sequence simulation, repository
//! status, workflow suggestions, compliance analysis, and policy management
//! as MCP tools. All tools are thin wrappers over
//! [`service::GitRulesService`]; verdicts are advisory payloads, never
//! protocol errors.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod audit;
pub mod server;
pub mod service;
pub mod telemetry;
pub mod tools;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use audit::McpAuditEvent;
pub use audit::McpAuditSink;
pub use audit::McpNoopAuditSink;
pub use audit::McpStderrAuditSink;
pub use server::McpServer;
pub use server::McpServerError;
pub use server::RpcReply;
pub use service::GitRulesService;
pub use telemetry::MCP_LATENCY_BUCKETS_MS;
pub use telemetry::McpMethod;
pub use telemetry::McpMetricEvent;
pub use telemetry::McpMetrics;
pub use telemetry::McpOutcome;
pub use telemetry::RequestCounters;
pub use tools::ToolError;
pub use tools::ToolName;
pub use tools::ToolRouter;
