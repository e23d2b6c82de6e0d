// crates/branch-gate-mcp/src/server.rs
// ============================================================================
// Module: MCP Server
// Description: JSON-RPC 2.0 server over stdio and HTTP transports.
// Purpose: Expose Branch Gate tools to MCP clients.
// Dependencies: branch-gate-config, axum, serde_json, tokio
// ============================================================================

//! ## Overview
//! The MCP server accepts JSON-RPC 2.0 requests and routes tool calls through
//! [`crate::tools::ToolRouter`]. Stdio accepts both `Content-Length` framed
//! messages and newline-delimited JSON, answering each message in the framing
//! it arrived in; requests are handled one at a time in arrival order. HTTP
//! serves `POST /rpc` and `GET /health` and runs tool calls on the blocking
//! pool. Every request emits one audit event and one metric event.
//!
//! Inputs are untrusted: oversized bodies, malformed JSON, and unknown methods
//! are answered with JSON-RPC errors and never reach the rules service.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io;
use std::io::BufRead;
use std::io::Read;
use std::io::Write;
use std::str;
use std::sync::Arc;
use std::time::Duration;
use std::time::Instant;

use axum::Router;
use axum::body::Body;
use axum::body::to_bytes;
use axum::extract::DefaultBodyLimit;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::http::StatusCode;
use axum::http::header::CONTENT_LENGTH;
use axum::http::header::CONTENT_TYPE;
use axum::response::IntoResponse;
use axum::response::Response;
use axum::routing::get;
use axum::routing::post;
use branch_gate_config::ServerConfig;
use branch_gate_config::ServerTransport;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use serde_json::json;
use tokio::net::TcpListener;

use crate::audit::McpAuditEvent;
use crate::audit::McpAuditEventParams;
use crate::audit::McpAuditSink;
use crate::audit::McpNoopAuditSink;
use crate::audit::McpStderrAuditSink;
use crate::service::GitRulesService;
use crate::telemetry::McpMethod;
use crate::telemetry::McpMetricEvent;
use crate::telemetry::McpMetrics;
use crate::telemetry::McpOutcome;
use crate::telemetry::RequestCounters;
use crate::tools::PROTOCOL_VERSION;
use crate::tools::SERVER_NAME;
use crate::tools::SERVER_VERSION;
use crate::tools::ToolDefinition;
use crate::tools::ToolError;
use crate::tools::ToolName;
use crate::tools::ToolRouter;
use crate::tools::VerdictSummary;
use crate::tools::tool_definitions;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// JSON-RPC parse error code.
pub const PARSE_ERROR: i64 = -32700;
/// JSON-RPC invalid request code.
pub const INVALID_REQUEST: i64 = -32600;
/// JSON-RPC method (or tool) not found code.
pub const METHOD_NOT_FOUND: i64 = -32601;
/// JSON-RPC invalid params code.
pub const INVALID_PARAMS: i64 = -32602;
/// JSON-RPC internal error code.
pub const INTERNAL_ERROR: i64 = -32603;
/// Request body exceeded `max_body_bytes`.
pub const PAYLOAD_TOO_LARGE: i64 = -32070;

/// Longest accepted stdio framing header line.
const MAX_HEADER_LINE_BYTES: usize = 4096;

/// Response used when a response envelope cannot be serialized.
const FALLBACK_RESPONSE: &str =
    "{\"jsonrpc\":\"2.0\",\"id\":null,\"error\":{\"code\":-32603,\"message\":\"internal error\"}}";

// ============================================================================
// SECTION: MCP Server
// ============================================================================

/// Encoded reply to one JSON-RPC message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RpcReply {
    /// HTTP status for the HTTP transport.
    pub status: StatusCode,
    /// Serialized JSON-RPC response.
    pub body: Vec<u8>,
}

/// MCP server instance.
pub struct McpServer {
    /// Server configuration.
    config: ServerConfig,
    /// Tool router for request dispatch.
    router: ToolRouter,
    /// Audit sink for request events.
    audit: Arc<dyn McpAuditSink>,
    /// Metrics sink for request events.
    metrics: Arc<dyn McpMetrics>,
}

impl McpServer {
    /// Builds a server over the rules service.
    ///
    /// The audit sink follows `config.audit.enabled`.
    #[must_use]
    pub fn new(config: ServerConfig, service: GitRulesService) -> Self {
        let counters = Arc::new(RequestCounters::new());
        let audit: Arc<dyn McpAuditSink> = if config.audit.enabled {
            Arc::new(McpStderrAuditSink)
        } else {
            Arc::new(McpNoopAuditSink)
        };
        Self {
            router: ToolRouter::new(service, Arc::clone(&counters)),
            metrics: counters,
            audit,
            config,
        }
    }

    /// Replaces the audit sink.
    #[must_use]
    pub fn with_audit_sink(mut self, audit: Arc<dyn McpAuditSink>) -> Self {
        self.audit = audit;
        self
    }

    /// Returns the tool router.
    #[must_use]
    pub const fn router(&self) -> &ToolRouter {
        &self.router
    }

    /// Serves requests using the configured transport.
    ///
    /// # Errors
    ///
    /// Returns [`McpServerError`] when the transport fails.
    pub async fn serve(self) -> Result<(), McpServerError> {
        match self.config.transport {
            ServerTransport::Stdio => self.serve_stdio(),
            ServerTransport::Http => {
                let addr =
                    self.config.bind_addr().map_err(|err| McpServerError::Config(err.to_string()))?;
                let listener = TcpListener::bind(addr)
                    .await
                    .map_err(|_| McpServerError::Transport("http bind failed".to_string()))?;
                self.serve_listener(listener).await
            }
        }
    }

    /// Serves HTTP requests on an already bound listener.
    ///
    /// # Errors
    ///
    /// Returns [`McpServerError`] when the HTTP server fails.
    pub async fn serve_listener(self, listener: TcpListener) -> Result<(), McpServerError> {
        let app = Router::new()
            .route("/rpc", post(handle_http))
            .route("/health", get(handle_health))
            .layer(DefaultBodyLimit::disable())
            .with_state(Arc::new(self));
        axum::serve(listener, app)
            .await
            .map_err(|_| McpServerError::Transport("http server failed".to_string()))
    }

    /// Serves JSON-RPC over the process stdin and stdout.
    fn serve_stdio(&self) -> Result<(), McpServerError> {
        self.serve_stream(io::stdin().lock(), io::stdout().lock())
    }

    /// Serves JSON-RPC messages from `reader` until end of input.
    ///
    /// # Errors
    ///
    /// Returns [`McpServerError`] on unreadable input, malformed framing
    /// headers, or write failures.
    pub fn serve_stream(
        &self,
        mut reader: impl BufRead,
        mut writer: impl Write,
    ) -> Result<(), McpServerError> {
        while let Some(frame) = read_frame(&mut reader, self.config.max_body_bytes)? {
            let reply = match &frame.body {
                Some(body) => self.handle_payload(ServerTransport::Stdio, body),
                None => Some(self.oversized_reply(ServerTransport::Stdio, frame.length)),
            };
            if let Some(reply) = reply {
                write_frame(&mut writer, frame.framing, &reply.body)?;
            }
        }
        Ok(())
    }

    /// Handles one JSON-RPC message; returns `None` for notifications.
    #[must_use]
    pub fn handle_payload(&self, transport: ServerTransport, bytes: &[u8]) -> Option<RpcReply> {
        let started = Instant::now();
        let dispatch = self.dispatch(bytes);
        let reply = dispatch.response.as_ref().map(|(status, response)| RpcReply {
            status: *status,
            body: encode_response(response),
        });
        let error_code = dispatch
            .response
            .as_ref()
            .and_then(|(_, response)| response.error.as_ref().map(|error| error.code));
        let observation = Observation {
            transport,
            request_id: dispatch.request_id,
            method: dispatch.method,
            tool: dispatch.tool,
            verdict: dispatch.verdict,
            error_code,
            request_bytes: bytes.len(),
            response_bytes: reply.as_ref().map_or(0, |reply| reply.body.len()),
        };
        self.observe(observation, started.elapsed());
        reply
    }

    /// Builds the reply for a body that exceeded the size limit.
    fn oversized_reply(&self, transport: ServerTransport, request_bytes: usize) -> RpcReply {
        let response =
            JsonRpcResponse::failure(Value::Null, PAYLOAD_TOO_LARGE, "request body too large");
        let body = encode_response(&response);
        self.observe(
            Observation {
                transport,
                request_id: None,
                method: McpMethod::Invalid,
                tool: None,
                verdict: None,
                error_code: Some(PAYLOAD_TOO_LARGE),
                request_bytes,
                response_bytes: body.len(),
            },
            Duration::ZERO,
        );
        RpcReply {
            status: StatusCode::PAYLOAD_TOO_LARGE,
            body,
        }
    }

    /// Parses a message and produces the response envelope.
    fn dispatch(&self, bytes: &[u8]) -> Dispatch {
        let Ok(value) = serde_json::from_slice::<Value>(bytes) else {
            return Dispatch::rejected(McpMethod::Invalid, Value::Null, PARSE_ERROR, "parse error");
        };
        let is_notification = value.as_object().is_some_and(|object| !object.contains_key("id"));
        let Ok(request) = serde_json::from_value::<JsonRpcRequest>(value) else {
            return Dispatch::rejected(
                McpMethod::Invalid,
                Value::Null,
                INVALID_REQUEST,
                "invalid json-rpc request",
            );
        };
        if request.jsonrpc != "2.0" {
            return Dispatch::rejected(
                McpMethod::Invalid,
                request.id,
                INVALID_REQUEST,
                "invalid json-rpc version",
            );
        }
        if is_notification {
            return Dispatch {
                request_id: None,
                method: McpMethod::Notification,
                tool: None,
                verdict: None,
                response: None,
            };
        }
        let id = request.id;
        let method = McpMethod::classify(&request.method);
        let request_id = Some(id.to_string());
        let result = match request.method.as_str() {
            "initialize" => Ok(json!({
                "protocolVersion": PROTOCOL_VERSION,
                "capabilities": { "tools": {} },
                "serverInfo": { "name": SERVER_NAME, "version": SERVER_VERSION },
            })),
            "ping" => Ok(json!({})),
            "tools/list" => serde_json::to_value(ToolListResult {
                tools: tool_definitions(),
            })
            .map_err(|_| ToolError::Serialization),
            "tools/call" => return self.dispatch_tool_call(id, request.params),
            other => {
                let mut dispatch = Dispatch::rejected(
                    method,
                    id,
                    METHOD_NOT_FOUND,
                    &format!("method not found: {other}"),
                );
                dispatch.request_id = request_id;
                return dispatch;
            }
        };
        let response = match result {
            Ok(value) => (StatusCode::OK, JsonRpcResponse::success(id, value)),
            Err(error) => tool_error_response(id, &error),
        };
        Dispatch {
            request_id,
            method,
            tool: None,
            verdict: None,
            response: Some(response),
        }
    }

    /// Routes a `tools/call` request.
    fn dispatch_tool_call(&self, id: Value, params: Option<Value>) -> Dispatch {
        let request_id = Some(id.to_string());
        let Ok(call) = serde_json::from_value::<ToolCallParams>(params.unwrap_or(Value::Null))
        else {
            let mut dispatch =
                Dispatch::rejected(McpMethod::ToolsCall, id, INVALID_PARAMS, "invalid tool params");
            dispatch.request_id = request_id;
            return dispatch;
        };
        let tool = ToolName::parse(&call.name);
        let outcome = self.router.handle_tool_call(&call.name, call.arguments).and_then(|outcome| {
            let text = serde_json::to_string_pretty(&outcome.payload)
                .map_err(|_| ToolError::Serialization)?;
            let result = serde_json::to_value(ToolCallResult {
                content: vec![ToolContent::Text {
                    text,
                }],
                structured_content: outcome.payload,
            })
            .map_err(|_| ToolError::Serialization)?;
            Ok((result, outcome.verdict))
        });
        let (response, verdict) = match outcome {
            Ok((result, verdict)) => ((StatusCode::OK, JsonRpcResponse::success(id, result)), verdict),
            Err(error) => (tool_error_response(id, &error), None),
        };
        Dispatch {
            request_id,
            method: McpMethod::ToolsCall,
            tool,
            verdict,
            response: Some(response),
        }
    }

    /// Emits metric and audit events for one request.
    fn observe(&self, observation: Observation, latency: Duration) {
        let outcome =
            if observation.error_code.is_some() { McpOutcome::Error } else { McpOutcome::Ok };
        let event = McpMetricEvent {
            transport: observation.transport,
            method: observation.method,
            tool: observation.tool,
            outcome,
            error_code: observation.error_code,
            request_bytes: observation.request_bytes,
            response_bytes: observation.response_bytes,
        };
        self.metrics.record_request(&event);
        self.metrics.record_latency(&event, latency);
        self.audit.record(&McpAuditEvent::new(McpAuditEventParams {
            request_id: observation.request_id,
            transport: observation.transport,
            method: observation.method,
            tool: observation.tool,
            outcome,
            error_code: observation.error_code,
            verdict_allowed: observation.verdict.map(|verdict| verdict.allowed),
            verdict_severity: observation.verdict.map(|verdict| verdict.severity),
            request_bytes: observation.request_bytes,
            response_bytes: observation.response_bytes,
        }));
    }
}

/// Dispatch result before encoding.
struct Dispatch {
    /// Request identifier rendered as JSON text.
    request_id: Option<String>,
    /// Method classification.
    method: McpMethod,
    /// Tool name for tool calls.
    tool: Option<ToolName>,
    /// Verdict summary for evaluation tools.
    verdict: Option<VerdictSummary>,
    /// Response; `None` for notifications.
    response: Option<(StatusCode, JsonRpcResponse)>,
}

impl Dispatch {
    /// Builds a dispatch carrying a request-level error.
    fn rejected(method: McpMethod, id: Value, code: i64, message: &str) -> Self {
        Self {
            request_id: None,
            method,
            tool: None,
            verdict: None,
            response: Some((StatusCode::BAD_REQUEST, JsonRpcResponse::failure(id, code, message))),
        }
    }
}

/// Fields reported to audit and metrics for one request.
struct Observation {
    /// Transport the request arrived on.
    transport: ServerTransport,
    /// Request identifier.
    request_id: Option<String>,
    /// Method classification.
    method: McpMethod,
    /// Tool name for tool calls.
    tool: Option<ToolName>,
    /// Verdict summary for evaluation tools.
    verdict: Option<VerdictSummary>,
    /// JSON-RPC error code when the request failed.
    error_code: Option<i64>,
    /// Request size in bytes.
    request_bytes: usize,
    /// Response size in bytes.
    response_bytes: usize,
}

// ============================================================================
// SECTION: HTTP Transport
// ============================================================================

/// Handles `POST /rpc`.
async fn handle_http(
    State(server): State<Arc<McpServer>>,
    headers: HeaderMap,
    body: Body,
) -> Response {
    let max_body_bytes = server.config.max_body_bytes;
    let declared = headers
        .get(CONTENT_LENGTH)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse::<usize>().ok());
    let bytes = match declared {
        Some(length) if length > max_body_bytes => Err(length),
        _ => to_bytes(body, max_body_bytes)
            .await
            .map_err(|_| declared.unwrap_or_else(|| max_body_bytes.saturating_add(1))),
    };
    let joined = tokio::task::spawn_blocking(move || match bytes {
        Ok(bytes) => server.handle_payload(ServerTransport::Http, &bytes),
        Err(length) => Some(server.oversized_reply(ServerTransport::Http, length)),
    })
    .await;
    match joined {
        Ok(Some(reply)) => (reply.status, [(CONTENT_TYPE, "application/json")], reply.body)
            .into_response(),
        Ok(None) => StatusCode::ACCEPTED.into_response(),
        Err(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            [(CONTENT_TYPE, "application/json")],
            FALLBACK_RESPONSE,
        )
            .into_response(),
    }
}

/// Handles `GET /health`.
async fn handle_health(State(server): State<Arc<McpServer>>) -> Response {
    let counters = server.router.counters().snapshot();
    axum::Json(json!({
        "id": "health",
        "status": "ok",
        "name": SERVER_NAME,
        "version": SERVER_VERSION,
        "uptimeSeconds": counters.uptime_seconds,
    }))
    .into_response()
}

// ============================================================================
// SECTION: JSON-RPC Types
// ============================================================================

/// Incoming JSON-RPC request payload.
#[derive(Debug, Deserialize)]
struct JsonRpcRequest {
    /// JSON-RPC protocol version.
    jsonrpc: String,
    /// Request identifier; null when absent.
    #[serde(default)]
    id: Value,
    /// Method name.
    method: String,
    /// Optional parameters payload.
    #[serde(default)]
    params: Option<Value>,
}

/// JSON-RPC response envelope.
#[derive(Debug, Serialize)]
struct JsonRpcResponse {
    /// JSON-RPC protocol version.
    jsonrpc: &'static str,
    /// Request identifier.
    id: Value,
    /// Successful result payload.
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<Value>,
    /// Error payload when the request fails.
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<JsonRpcError>,
}

impl JsonRpcResponse {
    /// Builds a success envelope.
    const fn success(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            result: Some(result),
            error: None,
        }
    }

    /// Builds an error envelope.
    fn failure(id: Value, code: i64, message: &str) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            result: None,
            error: Some(JsonRpcError {
                code,
                message: message.to_string(),
            }),
        }
    }
}

/// JSON-RPC error payload.
#[derive(Debug, Serialize)]
struct JsonRpcError {
    /// Error code.
    code: i64,
    /// Human-readable error message.
    message: String,
}

/// Tool call parameters for JSON-RPC requests.
#[derive(Debug, Deserialize)]
struct ToolCallParams {
    /// Tool name.
    name: String,
    /// Raw JSON arguments.
    #[serde(default)]
    arguments: Value,
}

/// Tool list response payload.
#[derive(Debug, Serialize)]
struct ToolListResult {
    /// Registered tool definitions.
    tools: Vec<ToolDefinition>,
}

/// Tool call response payload.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ToolCallResult {
    /// Pretty-printed payload for text-only clients.
    content: Vec<ToolContent>,
    /// The same payload as structured JSON.
    structured_content: Value,
}

/// Tool output content blocks.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ToolContent {
    /// Text block.
    Text {
        /// Text payload.
        text: String,
    },
}

/// Maps a tool failure to its HTTP status and JSON-RPC error.
fn tool_error_response(id: Value, error: &ToolError) -> (StatusCode, JsonRpcResponse) {
    let (status, code) = match error {
        ToolError::UnknownTool(_) => (StatusCode::BAD_REQUEST, METHOD_NOT_FOUND),
        ToolError::InvalidParams(_) => (StatusCode::BAD_REQUEST, INVALID_PARAMS),
        ToolError::PolicyStore(_) | ToolError::Serialization => (StatusCode::OK, INTERNAL_ERROR),
    };
    (status, JsonRpcResponse::failure(id, code, &error.to_string()))
}

/// Serializes a response envelope, falling back to a static internal error.
fn encode_response(response: &JsonRpcResponse) -> Vec<u8> {
    serde_json::to_vec(response).unwrap_or_else(|_| FALLBACK_RESPONSE.as_bytes().to_vec())
}

// ============================================================================
// SECTION: Framing Helpers
// ============================================================================

/// Stdio message framing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Framing {
    /// `Content-Length` header block followed by the body.
    ContentLength,
    /// One JSON document per line.
    Line,
}

/// One message read from stdio.
#[derive(Debug)]
struct Frame {
    /// Framing the message arrived in.
    framing: Framing,
    /// Declared or observed body length.
    length: usize,
    /// Body; `None` when it exceeded the size limit and was discarded.
    body: Option<Vec<u8>>,
}

/// Outcome of reading one bounded stdio line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LineRead {
    /// End of input before any byte.
    Eof,
    /// A full line (or final unterminated line) is in the buffer.
    Complete,
    /// The line exceeded the limit; the buffer holds its prefix and the rest
    /// was drained. Carries the observed line length.
    Oversized(usize),
}

/// Reads the next stdio message; `None` at end of input.
fn read_frame(
    reader: &mut impl BufRead,
    max_body_bytes: usize,
) -> Result<Option<Frame>, McpServerError> {
    let first_line_limit = max_body_bytes.max(MAX_HEADER_LINE_BYTES);
    let mut line = Vec::new();
    loop {
        let trimmed = match read_bounded_line(reader, &mut line, first_line_limit)? {
            LineRead::Eof => return Ok(None),
            LineRead::Complete => line.trim_ascii(),
            LineRead::Oversized(length) => {
                if !starts_json(line.trim_ascii_start()) {
                    return Err(McpServerError::Transport("frame header too long".to_string()));
                }
                return Ok(Some(Frame {
                    framing: Framing::Line,
                    length,
                    body: None,
                }));
            }
        };
        if trimmed.is_empty() {
            continue;
        }
        if starts_json(trimmed) {
            let length = trimmed.len();
            return Ok(Some(Frame {
                framing: Framing::Line,
                length,
                body: (length <= max_body_bytes).then(|| trimmed.to_vec()),
            }));
        }
        let mut content_length = parse_content_length(header_text(trimmed)?)?;
        loop {
            match read_bounded_line(reader, &mut line, MAX_HEADER_LINE_BYTES)? {
                LineRead::Eof => {
                    return Err(McpServerError::Transport(
                        "stdio closed inside headers".to_string(),
                    ));
                }
                LineRead::Oversized(_) => {
                    return Err(McpServerError::Transport("frame header too long".to_string()));
                }
                LineRead::Complete => {}
            }
            let header = line.trim_ascii();
            if header.is_empty() {
                break;
            }
            if let Some(length) = parse_content_length(header_text(header)?)? {
                content_length = Some(length);
            }
        }
        let length = content_length
            .ok_or_else(|| McpServerError::Transport("missing content length".to_string()))?;
        if length > max_body_bytes {
            let limit = u64::try_from(length).unwrap_or(u64::MAX);
            io::copy(&mut reader.by_ref().take(limit), &mut io::sink()).map_err(read_failed)?;
            return Ok(Some(Frame {
                framing: Framing::ContentLength,
                length,
                body: None,
            }));
        }
        let mut body = vec![0u8; length];
        reader.read_exact(&mut body).map_err(read_failed)?;
        return Ok(Some(Frame {
            framing: Framing::ContentLength,
            length,
            body: Some(body),
        }));
    }
}

/// Reads one raw line of at most `limit` content bytes into `line`.
///
/// Longer lines are drained up to and including their newline so the next
/// read starts at a message boundary.
fn read_bounded_line(
    reader: &mut impl BufRead,
    line: &mut Vec<u8>,
    limit: usize,
) -> Result<LineRead, McpServerError> {
    line.clear();
    let cap = limit.saturating_add(2);
    let read = reader
        .by_ref()
        .take(u64::try_from(cap).unwrap_or(u64::MAX))
        .read_until(b'\n', line)
        .map_err(read_failed)?;
    if read == 0 {
        return Ok(LineRead::Eof);
    }
    if line.ends_with(b"\n") || line.len() < cap {
        return Ok(LineRead::Complete);
    }
    let drained = drain_line(reader)?;
    Ok(LineRead::Oversized(line.len().saturating_add(drained)))
}

/// Discards input through the next newline; returns the bytes discarded.
fn drain_line(reader: &mut impl BufRead) -> Result<usize, McpServerError> {
    let mut drained = 0usize;
    loop {
        let (used, found) = {
            let available = reader.fill_buf().map_err(read_failed)?;
            if available.is_empty() {
                return Ok(drained);
            }
            available
                .iter()
                .position(|byte| *byte == b'\n')
                .map_or((available.len(), false), |pos| (pos + 1, true))
        };
        reader.consume(used);
        drained = drained.saturating_add(used);
        if found {
            return Ok(drained);
        }
    }
}

/// Returns true when a trimmed line opens a JSON object or array.
fn starts_json(bytes: &[u8]) -> bool {
    matches!(bytes.first(), Some(b'{' | b'['))
}

/// Decodes a header line as text.
fn header_text(bytes: &[u8]) -> Result<&str, McpServerError> {
    str::from_utf8(bytes)
        .map_err(|_| McpServerError::Transport("invalid frame header".to_string()))
}

/// Maps stdio read failures to transport errors.
fn read_failed(_: io::Error) -> McpServerError {
    McpServerError::Transport("stdio read failed".to_string())
}

/// Parses a header line; returns the length for `Content-Length` headers.
fn parse_content_length(header: &str) -> Result<Option<usize>, McpServerError> {
    let Some((name, value)) = header.split_once(':') else {
        return Err(McpServerError::Transport("invalid frame header".to_string()));
    };
    if !name.trim().eq_ignore_ascii_case("content-length") {
        return Ok(None);
    }
    value
        .trim()
        .parse::<usize>()
        .map(Some)
        .map_err(|_| McpServerError::Transport("invalid content length".to_string()))
}

/// Writes a reply in the framing of the request.
fn write_frame(writer: &mut impl Write, framing: Framing, payload: &[u8]) -> Result<(), McpServerError> {
    let write_failed = |_: io::Error| McpServerError::Transport("stdio write failed".to_string());
    match framing {
        Framing::ContentLength => {
            let header = format!("Content-Length: {}\r\n\r\n", payload.len());
            writer.write_all(header.as_bytes()).map_err(write_failed)?;
            writer.write_all(payload).map_err(write_failed)?;
        }
        Framing::Line => {
            writer.write_all(payload).map_err(write_failed)?;
            writer.write_all(b"\n").map_err(write_failed)?;
        }
    }
    writer.flush().map_err(write_failed)
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// MCP server errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, thiserror::Error)]
pub enum McpServerError {
    /// Configuration errors.
    #[error("config error: {0}")]
    Config(String),
    /// Transport errors.
    #[error("transport error: {0}")]
    Transport(String),
}

#[cfg(test)]
mod tests;
