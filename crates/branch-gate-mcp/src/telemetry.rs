// crates/branch-gate-mcp/src/telemetry.rs
// ============================================================================
// Module: MCP Telemetry
// Description: Request counters and latency buckets for MCP handling.
// Purpose: Feed the `server_health` tool without external metric backends.
// Dependencies: branch-gate-config, serde, time
// ============================================================================

//! ## Overview
//! [`McpMetrics`] is the seam the server reports every handled request to.
//! [`RequestCounters`] keeps in-process totals, per-tool call counts, a
//! latency histogram, and the most recent error so `server_health` can report
//! them. Labels are fixed enums; request payloads never reach telemetry.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::time::Duration;
use std::time::Instant;

use branch_gate_config::ServerTransport;
use serde::Serialize;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use crate::tools::ToolName;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Latency bucket upper bounds in milliseconds.
pub const MCP_LATENCY_BUCKETS_MS: &[u64] = &[1, 5, 10, 25, 50, 100, 250, 500, 1_000, 5_000];

// ============================================================================
// SECTION: Metric Labels
// ============================================================================

/// JSON-RPC method classification.
///
/// # Invariants
/// - Variants are stable for telemetry labeling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum McpMethod {
    /// `initialize` handshake.
    Initialize,
    /// `ping` liveness probe.
    Ping,
    /// `tools/list`.
    ToolsList,
    /// `tools/call`.
    ToolsCall,
    /// Any notification (no response expected).
    Notification,
    /// Malformed or oversized request.
    Invalid,
    /// Unsupported method.
    Other,
}

impl McpMethod {
    /// Classifies a JSON-RPC method name.
    #[must_use]
    pub fn classify(method: &str) -> Self {
        match method {
            "initialize" => Self::Initialize,
            "ping" => Self::Ping,
            "tools/list" => Self::ToolsList,
            "tools/call" => Self::ToolsCall,
            _ => Self::Other,
        }
    }

    /// Returns a stable label for the method.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Initialize => "initialize",
            Self::Ping => "ping",
            Self::ToolsList => "tools/list",
            Self::ToolsCall => "tools/call",
            Self::Notification => "notification",
            Self::Invalid => "invalid",
            Self::Other => "other",
        }
    }
}

/// Request outcome classification.
///
/// # Invariants
/// - Variants are stable for telemetry labeling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum McpOutcome {
    /// The request produced a result.
    Ok,
    /// The request produced a JSON-RPC error.
    Error,
}

impl McpOutcome {
    /// Returns a stable label for the outcome.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::Error => "error",
        }
    }
}

/// Metric event describing one handled request.
///
/// # Invariants
/// - `tool` is set only for `tools/call` requests naming a known tool.
#[derive(Debug, Clone)]
pub struct McpMetricEvent {
    /// Transport the request arrived on.
    pub transport: ServerTransport,
    /// JSON-RPC method classification.
    pub method: McpMethod,
    /// Tool name for `tools/call`.
    pub tool: Option<ToolName>,
    /// Request outcome.
    pub outcome: McpOutcome,
    /// JSON-RPC error code when the outcome is an error.
    pub error_code: Option<i64>,
    /// Request body size in bytes.
    pub request_bytes: usize,
    /// Response body size in bytes.
    pub response_bytes: usize,
}

// ============================================================================
// SECTION: Trait
// ============================================================================

/// Metrics sink for MCP requests.
pub trait McpMetrics: Send + Sync {
    /// Records a handled request.
    fn record_request(&self, event: &McpMetricEvent);

    /// Records how long the request took.
    fn record_latency(&self, event: &McpMetricEvent, latency: Duration);
}

// ============================================================================
// SECTION: Request Counters
// ============================================================================

/// Most recent failed request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LastError {
    /// RFC 3339 timestamp of the failure.
    pub timestamp: String,
    /// Method label of the failed request.
    pub method: &'static str,
    /// Tool label when the failure was a tool call.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool: Option<&'static str>,
    /// JSON-RPC error code.
    pub code: i64,
}

/// Histogram bucket count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LatencyBucket {
    /// Inclusive upper bound in milliseconds; `None` for the overflow bucket.
    pub le_ms: Option<u64>,
    /// Observations falling in the bucket.
    pub count: u64,
}

/// Point-in-time copy of the request counters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CounterSnapshot {
    /// Seconds since the counters were created.
    pub uptime_seconds: u64,
    /// Handled requests, including notifications.
    pub requests_total: u64,
    /// Requests answered with a JSON-RPC error.
    pub errors_total: u64,
    /// Calls per tool label.
    pub tool_calls: BTreeMap<&'static str, u64>,
    /// Latency histogram.
    pub latency: Vec<LatencyBucket>,
    /// Most recent failure.
    pub last_error: Option<LastError>,
}

/// Mutable counter state.
#[derive(Debug, Default)]
struct CounterState {
    /// Handled requests.
    requests_total: u64,
    /// Failed requests.
    errors_total: u64,
    /// Calls per tool label.
    tool_calls: BTreeMap<&'static str, u64>,
    /// Bucket counts; one slot per bound plus overflow.
    latency: Vec<u64>,
    /// Most recent failure.
    last_error: Option<LastError>,
}

/// In-process request counters.
///
/// # Invariants
/// - `errors_total <= requests_total`.
#[derive(Debug)]
pub struct RequestCounters {
    /// Creation instant for uptime reporting.
    started: Instant,
    /// Guarded counter state.
    state: Mutex<CounterState>,
}

impl Default for RequestCounters {
    fn default() -> Self {
        Self::new()
    }
}

impl RequestCounters {
    /// Creates zeroed counters.
    #[must_use]
    pub fn new() -> Self {
        Self {
            started: Instant::now(),
            state: Mutex::new(CounterState {
                latency: vec![0; MCP_LATENCY_BUCKETS_MS.len() + 1],
                ..CounterState::default()
            }),
        }
    }

    /// Returns a copy of the current counters.
    #[must_use]
    pub fn snapshot(&self) -> CounterSnapshot {
        let state = self.lock();
        let latency = state
            .latency
            .iter()
            .enumerate()
            .map(|(index, count)| LatencyBucket {
                le_ms: MCP_LATENCY_BUCKETS_MS.get(index).copied(),
                count: *count,
            })
            .collect();
        CounterSnapshot {
            uptime_seconds: self.started.elapsed().as_secs(),
            requests_total: state.requests_total,
            errors_total: state.errors_total,
            tool_calls: state.tool_calls.clone(),
            latency,
            last_error: state.last_error.clone(),
        }
    }

    /// Locks the counter state, recovering from poisoning.
    fn lock(&self) -> MutexGuard<'_, CounterState> {
        self.state.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl McpMetrics for RequestCounters {
    fn record_request(&self, event: &McpMetricEvent) {
        let mut state = self.lock();
        state.requests_total = state.requests_total.saturating_add(1);
        if let Some(tool) = event.tool {
            let count = state.tool_calls.entry(tool.as_str()).or_insert(0);
            *count = count.saturating_add(1);
        }
        if event.outcome == McpOutcome::Error {
            state.errors_total = state.errors_total.saturating_add(1);
            state.last_error = Some(LastError {
                timestamp: now_rfc3339(),
                method: event.method.as_str(),
                tool: event.tool.map(ToolName::as_str),
                code: event.error_code.unwrap_or_default(),
            });
        }
    }

    fn record_latency(&self, _event: &McpMetricEvent, latency: Duration) {
        let millis = u64::try_from(latency.as_millis()).unwrap_or(u64::MAX);
        let index = MCP_LATENCY_BUCKETS_MS
            .iter()
            .position(|bound| millis <= *bound)
            .unwrap_or(MCP_LATENCY_BUCKETS_MS.len());
        let mut state = self.lock();
        if let Some(slot) = state.latency.get_mut(index) {
            *slot = slot.saturating_add(1);
        }
    }
}

/// Formats the current UTC time as RFC 3339.
pub(crate) fn now_rfc3339() -> String {
    OffsetDateTime::now_utc().format(&Rfc3339).unwrap_or_default()
}
