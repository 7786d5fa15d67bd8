// crates/qa-platform-server/tests/audit_sink.rs
// ============================================================================
// Module: Audit Sink Tests
// Description: JSON-lines file sink and config-driven sink selection.
// Purpose: Ensure audit events land on disk in a stable shape.
// Dependencies: qa-platform-server, qa-platform-config, tempfile
// ============================================================================

//! ## Overview
//! Audit events are written as JSON lines and never contain raw tokens.

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "Test-only assertions and helpers are permitted."
)]

use qa_platform_config::AuditConfig;
use qa_platform_config::AuditSinkKind;
use qa_platform_server::AuditEvent;
use qa_platform_server::AuditSink;
use qa_platform_server::FileAuditSink;
use qa_platform_server::ForumRequestEvent;
use qa_platform_server::RequestOutcome;
use qa_platform_server::ServerStartEvent;
use qa_platform_server::audit::audit_sink_from_config;
use qa_platform_server::token_fingerprint;
use serde_json::Value;

fn request_event(status: u16) -> AuditEvent {
    AuditEvent::ForumRequest(ForumRequestEvent {
        timestamp_ms: 42,
        method: "POST".to_string(),
        route: "/api/user/question/{id}/upVote".to_string(),
        status,
        outcome: RequestOutcome::from_status(status),
        requester: Some(7),
        error_kind: (status >= 400).then_some("already_voted"),
        token_fingerprint: Some(token_fingerprint("secret")),
    })
}

#[test]
fn file_sink_appends_one_json_object_per_line() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("logs").join("audit.jsonl");
    let sink = FileAuditSink::open(&path).unwrap();
    sink.record(&AuditEvent::ServerStart(ServerStartEvent {
        timestamp_ms: 1,
        bind: "127.0.0.1:8080".to_string(),
        store: "memory",
        token_count: 2,
    }));
    sink.record(&request_event(400));

    let contents = std::fs::read_to_string(&path).unwrap();
    let lines: Vec<Value> =
        contents.lines().map(|line| serde_json::from_str(line).unwrap()).collect();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0]["event"], "server_start");
    assert_eq!(lines[0]["token_count"], 2);
    assert_eq!(lines[1]["event"], "forum_request");
    assert_eq!(lines[1]["outcome"], "client_error");
    assert_eq!(lines[1]["error_kind"], "already_voted");
    assert!(!contents.contains("secret"));
}

#[test]
fn file_sink_reopen_keeps_earlier_lines() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("audit.jsonl");
    FileAuditSink::open(&path).unwrap().record(&request_event(200));
    FileAuditSink::open(&path).unwrap().record(&request_event(200));
    assert_eq!(std::fs::read_to_string(&path).unwrap().lines().count(), 2);
}

#[test]
fn config_file_sink_without_path_is_rejected() {
    let config = AuditConfig {
        sink: AuditSinkKind::File,
        path: None,
    };
    assert!(audit_sink_from_config(&config).is_err());
}

#[test]
fn token_fingerprint_is_short_and_stable() {
    let first = token_fingerprint("dev-token");
    assert_eq!(first.len(), 16);
    assert_eq!(first, token_fingerprint("dev-token"));
    assert_ne!(first, token_fingerprint("dev-token-2"));
    assert_eq!(RequestOutcome::from_status(503), RequestOutcome::ServerError);
    assert_eq!(RequestOutcome::from_status(204), RequestOutcome::Ok);
}
