// crates/branch-gate-mcp/src/server/tests.rs
// ============================================================================
// Module: MCP Server Unit Tests
// Description: Unit tests for stdio framing and JSON-RPC dispatch.
// Purpose: Validate frame parsing limits and request-level error handling.
// Dependencies: branch-gate-mcp, branch-gate-config, branch-gate-core
// ============================================================================

//! ## Overview
//! Covers both stdio framings, size-limit handling, and the JSON-RPC error
//! envelope for malformed or non-conforming requests.

// ============================================================================
// SECTION: Lint Configuration
// ============================================================================

#![allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::panic,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only assertions favor direct unwrap/expect for clarity."
)]

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Cursor;
use std::sync::Arc;

use axum::http::StatusCode;
use branch_gate_config::PolicyDefaults;
use branch_gate_config::PolicyStore;
use branch_gate_config::ServerAuditConfig;
use branch_gate_config::ServerConfig;
use branch_gate_config::ServerTransport;
use branch_gate_core::RepositorySnapshot;
use branch_gate_core::StaticRepositoryProvider;
use serde_json::Value;
use tempfile::TempDir;

use super::Framing;
use super::INVALID_REQUEST;
use super::McpServer;
use super::METHOD_NOT_FOUND;
use super::PARSE_ERROR;
use super::read_frame;
use super::write_frame;
use crate::service::GitRulesService;

// ============================================================================
// SECTION: Fixtures
// ============================================================================

fn server(dir: &TempDir) -> McpServer {
    let provider =
        StaticRepositoryProvider::new(RepositorySnapshot::new("develop", true, Some(false)));
    let store = Arc::new(PolicyStore::for_repository(dir.path(), PolicyDefaults::default()));
    let config = ServerConfig {
        audit: ServerAuditConfig {
            enabled: false,
        },
        ..ServerConfig::default()
    };
    McpServer::new(config, GitRulesService::new(Arc::new(provider), store))
}

fn reply_json(server: &McpServer, payload: &str) -> (StatusCode, Value) {
    let reply = server.handle_payload(ServerTransport::Stdio, payload.as_bytes()).unwrap();
    (reply.status, serde_json::from_slice(&reply.body).unwrap())
}

// ============================================================================
// SECTION: Framing
// ============================================================================

#[test]
fn reads_content_length_frames() {
    let mut input = Cursor::new(b"Content-Length: 2\r\n\r\n{}".to_vec());
    let frame = read_frame(&mut input, 1024).unwrap().unwrap();
    assert_eq!(frame.framing, Framing::ContentLength);
    assert_eq!(frame.body.as_deref(), Some(b"{}".as_slice()));
    assert!(read_frame(&mut input, 1024).unwrap().is_none());
}

#[test]
fn header_names_are_case_insensitive() {
    let mut input = Cursor::new(
        b"content-type: application/json\r\nCONTENT-LENGTH: 4\r\n\r\n[1]\n".to_vec(),
    );
    let frame = read_frame(&mut input, 1024).unwrap().unwrap();
    assert_eq!(frame.length, 4);
    assert_eq!(frame.body.as_deref(), Some(b"[1]\n".as_slice()));
}

#[test]
fn reads_newline_delimited_frames_and_skips_blank_lines() {
    let mut input = Cursor::new(b"\n{\"a\":1}\r\n\n{\"b\":2}\n".to_vec());
    let first = read_frame(&mut input, 1024).unwrap().unwrap();
    assert_eq!(first.framing, Framing::Line);
    assert_eq!(first.body.as_deref(), Some(b"{\"a\":1}".as_slice()));
    let second = read_frame(&mut input, 1024).unwrap().unwrap();
    assert_eq!(second.body.as_deref(), Some(b"{\"b\":2}".as_slice()));
    assert!(read_frame(&mut input, 1024).unwrap().is_none());
}

#[test]
fn oversized_body_is_discarded_and_stream_continues() {
    let mut input = Cursor::new(b"Content-Length: 10\r\n\r\n0123456789{\"ok\":true}\n".to_vec());
    let dropped = read_frame(&mut input, 4).unwrap().unwrap();
    assert_eq!(dropped.length, 10);
    assert!(dropped.body.is_none());
    let next = read_frame(&mut input, 64).unwrap().unwrap();
    assert_eq!(next.framing, Framing::Line);
    assert_eq!(next.body.as_deref(), Some(b"{\"ok\":true}".as_slice()));
}

#[test]
fn overlong_line_is_drained_and_stream_continues() {
    let line = format!("{{\"pad\":\"{}\"}}\n{{\"ok\":true}}\n", "x".repeat(6000));
    let mut input = Cursor::new(line.into_bytes());
    let dropped = read_frame(&mut input, 64).unwrap().unwrap();
    assert_eq!(dropped.framing, Framing::Line);
    assert!(dropped.length > 6000);
    assert!(dropped.body.is_none());
    let next = read_frame(&mut input, 64).unwrap().unwrap();
    assert_eq!(next.body.as_deref(), Some(b"{\"ok\":true}".as_slice()));
    assert!(read_frame(&mut input, 64).unwrap().is_none());
}

#[test]
fn overlong_header_line_is_a_transport_error() {
    let input = format!("X-Padding: {}\r\n\r\n{{}}", "a".repeat(5000)).into_bytes();
    assert!(read_frame(&mut Cursor::new(input), 1024).is_err());
}

#[test]
fn invalid_utf8_line_gets_parse_error_and_serving_continues() {
    let dir = tempfile::tempdir().unwrap();
    let server = server(&dir);
    let mut input = b"{\"jsonrpc\":\"2.0\",\"id\":1,\"method\":\"x".to_vec();
    input.push(0xff);
    input.extend_from_slice(b"\"}\n{\"jsonrpc\":\"2.0\",\"id\":2,\"method\":\"ping\"}\n");
    let mut output = Vec::new();
    server.serve_stream(Cursor::new(input), &mut output).unwrap();

    let replies: Vec<Value> = output
        .split(|byte| *byte == b'\n')
        .filter(|line| !line.is_empty())
        .map(|line| serde_json::from_slice(line).unwrap())
        .collect();
    assert_eq!(replies.len(), 2);
    assert_eq!(replies[0]["error"]["code"], PARSE_ERROR);
    assert_eq!(replies[1]["id"], 2);
    assert_eq!(replies[1]["result"], serde_json::json!({}));
}

#[test]
fn malformed_headers_are_transport_errors() {
    for input in [
        b"X-Other: 1\r\n\r\n{}".to_vec(),
        b"Content-Length: ten\r\n\r\n".to_vec(),
        b"garbage\r\n\r\n".to_vec(),
        b"Content-Length: 2\r\n".to_vec(),
    ] {
        assert!(read_frame(&mut Cursor::new(input), 1024).is_err());
    }
}

#[test]
fn replies_use_request_framing() {
    let mut framed = Vec::new();
    write_frame(&mut framed, Framing::ContentLength, b"{}").unwrap();
    assert_eq!(framed, b"Content-Length: 2\r\n\r\n{}".to_vec());

    let mut lined = Vec::new();
    write_frame(&mut lined, Framing::Line, b"{}").unwrap();
    assert_eq!(lined, b"{}\n".to_vec());
}

// ============================================================================
// SECTION: Dispatch
// ============================================================================

#[test]
fn invalid_json_is_a_parse_error() {
    let dir = tempfile::tempdir().unwrap();
    let server = server(&dir);
    let (status, body) = reply_json(&server, "{not json");
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], PARSE_ERROR);
    assert_eq!(body["id"], Value::Null);
}

#[test]
fn wrong_protocol_version_is_rejected_with_id() {
    let dir = tempfile::tempdir().unwrap();
    let server = server(&dir);
    let (_, body) = reply_json(&server, r#"{"jsonrpc":"1.0","id":7,"method":"ping"}"#);
    assert_eq!(body["error"]["code"], INVALID_REQUEST);
    assert_eq!(body["error"]["message"], "invalid json-rpc version");
    assert_eq!(body["id"], 7);
}

#[test]
fn request_without_method_is_invalid() {
    let dir = tempfile::tempdir().unwrap();
    let server = server(&dir);
    let (_, body) = reply_json(&server, r#"{"jsonrpc":"2.0","id":1}"#);
    assert_eq!(body["error"]["code"], INVALID_REQUEST);
}

#[test]
fn notifications_get_no_reply() {
    let dir = tempfile::tempdir().unwrap();
    let server = server(&dir);
    let payload = br#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#;
    assert!(server.handle_payload(ServerTransport::Stdio, payload).is_none());
    assert_eq!(server.router().counters().snapshot().requests_total, 1);
}

#[test]
fn unknown_method_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let server = server(&dir);
    let (_, body) = reply_json(&server, r#"{"jsonrpc":"2.0","id":"x","method":"resources/list"}"#);
    assert_eq!(body["error"]["code"], METHOD_NOT_FOUND);
    assert_eq!(body["error"]["message"], "method not found: resources/list");
    assert_eq!(body["id"], "x");
}

#[test]
fn ping_and_initialize_succeed() {
    let dir = tempfile::tempdir().unwrap();
    let server = server(&dir);
    let (status, body) = reply_json(&server, r#"{"jsonrpc":"2.0","id":1,"method":"ping"}"#);
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["result"], serde_json::json!({}));

    let (_, body) = reply_json(&server, r#"{"jsonrpc":"2.0","id":2,"method":"initialize"}"#);
    assert_eq!(body["result"]["protocolVersion"], "2024-11-05");
    assert_eq!(body["result"]["serverInfo"]["name"], "branch-gate");
}
