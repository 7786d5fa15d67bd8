// crates/qa-platform-server/src/lib.rs
// ============================================================================
// Module: QA Platform Server Library
// Description: Public API surface for the forum HTTP server.
// Purpose: Expose server construction, routing, auth and audit types.
// Dependencies: crate::{audit, auth, error, params, routes, server}
// ============================================================================

//! ## Overview
//! HTTP surface for the QA platform. All routes live under `/api/user`,
//! require a bearer token, and are audited as JSON lines.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod audit;
pub mod auth;
pub mod error;
pub mod params;
pub mod routes;
pub mod server;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use audit::AuditEvent;
pub use audit::AuditSink;
pub use audit::FileAuditSink;
pub use audit::ForumRequestEvent;
pub use audit::NoopAuditSink;
pub use audit::RequestOutcome;
pub use audit::ServerStartEvent;
pub use audit::SharedAuditSink;
pub use audit::StderrAuditSink;
pub use audit::token_fingerprint;
pub use auth::Requester;
pub use auth::TokenTable;
pub use error::ApiError;
pub use params::QueryParams;
pub use server::ForumServer;
pub use server::ForumServerError;
pub use server::ServerState;
pub use server::build_router;
pub use server::open_store;
