// crates/qa-platform-server/src/audit.rs
// ============================================================================
// Module: Forum Audit Logging
// Description: Structured JSON-lines audit events and sinks.
// Purpose: Record one event per request and one at startup.
// Dependencies: qa-platform-config, serde, serde_json, sha2
// ============================================================================

//! ## Overview
//! Audit events are serialized as one JSON object per line. Sinks never fail
//! the request: write errors are dropped. Bearer tokens are never logged;
//! events carry a short SHA-256 fingerprint instead.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs::File;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::sync::Mutex;

use qa_platform_config::AuditConfig;
use qa_platform_config::AuditSinkKind;
use serde::Serialize;
use sha2::Digest;
use sha2::Sha256;

// ============================================================================
// SECTION: Events
// ============================================================================

/// Number of hex characters kept from a token digest.
const FINGERPRINT_HEX_CHARS: usize = 16;

/// Request outcome class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestOutcome {
    /// 2xx response.
    Ok,
    /// 4xx response.
    ClientError,
    /// 5xx response.
    ServerError,
}

impl RequestOutcome {
    /// Classifies an HTTP status code.
    #[must_use]
    pub const fn from_status(status: u16) -> Self {
        match status {
            500..=599 => Self::ServerError,
            400..=499 => Self::ClientError,
            _ => Self::Ok,
        }
    }
}

/// One handled HTTP request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ForumRequestEvent {
    /// Unix time in milliseconds.
    pub timestamp_ms: i64,
    /// HTTP method.
    pub method: String,
    /// Matched route template.
    pub route: String,
    /// Response status.
    pub status: u16,
    /// Outcome class.
    pub outcome: RequestOutcome,
    /// Authenticated user, if any.
    pub requester: Option<u64>,
    /// Error label for non-2xx responses.
    pub error_kind: Option<&'static str>,
    /// Fingerprint of the presented bearer token.
    pub token_fingerprint: Option<String>,
}

/// Server startup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServerStartEvent {
    /// Unix time in milliseconds.
    pub timestamp_ms: i64,
    /// Bound socket address.
    pub bind: String,
    /// Store backend label.
    pub store: &'static str,
    /// Number of configured bearer tokens.
    pub token_count: usize,
}

/// Audit event envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum AuditEvent {
    /// One handled request.
    ForumRequest(ForumRequestEvent),
    /// Server startup.
    ServerStart(ServerStartEvent),
}

/// Returns a short, stable fingerprint for a bearer token.
#[must_use]
pub fn token_fingerprint(token: &str) -> String {
    let digest = Sha256::digest(token.as_bytes());
    let mut hex = String::with_capacity(FINGERPRINT_HEX_CHARS);
    for byte in digest.iter().take(FINGERPRINT_HEX_CHARS / 2) {
        hex.push_str(&format!("{byte:02x}"));
    }
    hex
}

// ============================================================================
// SECTION: Sinks
// ============================================================================

/// Destination for audit events.
pub trait AuditSink: Send + Sync {
    /// Records one event.
    fn record(&self, event: &AuditEvent);
}

/// Shared audit sink handle.
pub type SharedAuditSink = Arc<dyn AuditSink>;

/// Writes JSON lines to stderr.
#[derive(Debug, Default, Clone, Copy)]
pub struct StderrAuditSink;

impl AuditSink for StderrAuditSink {
    fn record(&self, event: &AuditEvent) {
        if let Ok(line) = serde_json::to_string(event) {
            let mut stderr = std::io::stderr().lock();
            let _ = writeln!(stderr, "{line}");
        }
    }
}

/// Appends JSON lines to a file.
#[derive(Debug)]
pub struct FileAuditSink {
    /// Open log file.
    file: Mutex<File>,
}

impl FileAuditSink {
    /// Opens `path` for appending, creating it if needed.
    ///
    /// # Errors
    ///
    /// Returns [`std::io::Error`] when the file cannot be opened.
    pub fn open(path: &Path) -> std::io::Result<Self> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }
}

impl AuditSink for FileAuditSink {
    fn record(&self, event: &AuditEvent) {
        let Ok(line) = serde_json::to_string(event) else {
            return;
        };
        if let Ok(mut file) = self.file.lock() {
            let _ = writeln!(file, "{line}");
        }
    }
}

/// Discards events.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopAuditSink;

impl AuditSink for NoopAuditSink {
    fn record(&self, _event: &AuditEvent) {}
}

/// Builds the sink selected by configuration.
///
/// # Errors
///
/// Returns [`std::io::Error`] when a file sink cannot be opened.
pub fn audit_sink_from_config(config: &AuditConfig) -> std::io::Result<SharedAuditSink> {
    Ok(match (config.sink, &config.path) {
        (AuditSinkKind::Stderr, _) => Arc::new(StderrAuditSink),
        (AuditSinkKind::None, _) => Arc::new(NoopAuditSink),
        (AuditSinkKind::File, Some(path)) => Arc::new(FileAuditSink::open(path)?),
        (AuditSinkKind::File, None) => {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "file audit sink requires path",
            ));
        }
    })
}
