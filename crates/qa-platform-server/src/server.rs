// crates/qa-platform-server/src/server.rs
// ============================================================================
// Module: Forum HTTP Server
// Description: Server state, router assembly and listener lifecycle.
// Purpose: Wire configuration, store, auth and audit into an axum service.
// Dependencies: axum, qa-platform-{config, core, store-sqlite}, tokio
// ============================================================================

//! ## Overview
//! [`ForumServer`] owns the shared [`ServerState`] and serves the route table
//! from [`crate::routes`]. Every route is wrapped in two route layers: the
//! audit layer (outermost) records one [`ForumRequestEvent`] per request, and
//! the auth layer rejects requests without a known bearer token.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::future::Future;
use std::sync::Arc;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::extract::MatchedPath;
use axum::extract::Request;
use axum::extract::State;
use axum::middleware;
use axum::middleware::Next;
use axum::response::Response;
use qa_platform_config::QaPlatformConfig;
use qa_platform_config::StoreConfig;
use qa_platform_core::ForumService;
use qa_platform_core::InMemoryForumStore;
use qa_platform_core::SharedClock;
use qa_platform_core::SharedForumStore;
use qa_platform_core::SystemClock;
use qa_platform_store_sqlite::SqliteForumStore;
use thiserror::Error;
use tokio::net::TcpListener;

use crate::audit::AuditEvent;
use crate::audit::ForumRequestEvent;
use crate::audit::RequestOutcome;
use crate::audit::ServerStartEvent;
use crate::audit::SharedAuditSink;
use crate::audit::audit_sink_from_config;
use crate::audit::token_fingerprint;
use crate::auth::Requester;
use crate::auth::TokenTable;
use crate::auth::authenticate;
use crate::auth::bearer_token;
use crate::error::ErrorKind;
use crate::routes::forum_routes;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Server startup and runtime failures.
#[derive(Debug, Error)]
pub enum ForumServerError {
    /// Configuration was rejected.
    #[error("server config error: {0}")]
    Config(String),
    /// The store could not be opened.
    #[error("server store error: {0}")]
    Store(String),
    /// The audit sink could not be opened.
    #[error("server audit error: {0}")]
    Audit(String),
    /// Binding or serving failed.
    #[error("server io error: {0}")]
    Io(String),
}

// ============================================================================
// SECTION: State
// ============================================================================

/// State shared by every handler.
#[derive(Clone)]
pub struct ServerState {
    /// Forum operations.
    service: ForumService,
    /// Bearer token table.
    tokens: Arc<TokenTable>,
    /// Audit destination.
    audit: SharedAuditSink,
    /// Time source for audit timestamps.
    clock: SharedClock,
}

impl ServerState {
    /// Returns the forum service.
    #[must_use]
    pub const fn service(&self) -> &ForumService {
        &self.service
    }

    /// Returns the bearer token table.
    #[must_use]
    pub fn tokens(&self) -> &TokenTable {
        &self.tokens
    }

    /// Returns the audit sink.
    #[must_use]
    pub fn audit(&self) -> &SharedAuditSink {
        &self.audit
    }
}

/// Opens the configured forum store.
///
/// # Errors
///
/// Returns [`ForumServerError::Store`] when the `SQLite` store cannot be
/// opened.
pub fn open_store(config: &StoreConfig) -> Result<SharedForumStore, ForumServerError> {
    Ok(match config {
        StoreConfig::Memory => Arc::new(InMemoryForumStore::new()),
        StoreConfig::Sqlite(sqlite) => Arc::new(
            SqliteForumStore::new(sqlite.clone())
                .map_err(|err| ForumServerError::Store(err.to_string()))?,
        ),
    })
}

/// Returns the log label of a store backend.
const fn store_label(config: &StoreConfig) -> &'static str {
    match config {
        StoreConfig::Memory => "memory",
        StoreConfig::Sqlite(_) => "sqlite",
    }
}

// ============================================================================
// SECTION: Server
// ============================================================================

/// Configured forum HTTP server.
pub struct ForumServer {
    /// Validated configuration.
    config: QaPlatformConfig,
    /// Shared handler state.
    state: ServerState,
}

impl ForumServer {
    /// Builds a server from validated configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ForumServerError`] when validation fails or the store or
    /// audit sink cannot be opened.
    pub fn from_config(config: QaPlatformConfig) -> Result<Self, ForumServerError> {
        config.validate().map_err(|err| ForumServerError::Config(err.to_string()))?;
        let store = open_store(&config.store)?;
        let audit = audit_sink_from_config(&config.server.audit)
            .map_err(|err| ForumServerError::Audit(err.to_string()))?;
        Ok(Self::with_parts(config, store, Arc::new(SystemClock), audit))
    }

    /// Builds a server around an existing store, clock and audit sink.
    #[must_use]
    pub fn with_parts(
        config: QaPlatformConfig,
        store: SharedForumStore,
        clock: SharedClock,
        audit: SharedAuditSink,
    ) -> Self {
        let service =
            ForumService::new(store, clock.clone(), config.pagination.to_pagination());
        let state = ServerState {
            service,
            tokens: Arc::new(TokenTable::from_config(&config.auth)),
            audit,
            clock,
        };
        Self {
            config,
            state,
        }
    }

    /// Returns the shared handler state.
    #[must_use]
    pub const fn state(&self) -> &ServerState {
        &self.state
    }

    /// Returns the configured router.
    #[must_use]
    pub fn router(&self) -> Router {
        build_router(self.state.clone(), self.config.server.max_body_bytes)
    }

    /// Binds the configured address and serves until Ctrl-C.
    ///
    /// # Errors
    ///
    /// Returns [`ForumServerError`] when binding or serving fails.
    pub async fn serve(self) -> Result<(), ForumServerError> {
        let addr =
            self.config.server.bind_addr().map_err(|err| ForumServerError::Config(err.to_string()))?;
        let listener =
            TcpListener::bind(addr).await.map_err(|err| ForumServerError::Io(err.to_string()))?;
        self.serve_with_shutdown(listener, shutdown_signal()).await
    }

    /// Serves on an already bound listener until the process stops.
    ///
    /// # Errors
    ///
    /// Returns [`ForumServerError::Io`] when serving fails.
    pub async fn serve_on(self, listener: TcpListener) -> Result<(), ForumServerError> {
        self.serve_with_shutdown(listener, std::future::pending()).await
    }

    /// Serves on `listener` until `shutdown` resolves.
    ///
    /// # Errors
    ///
    /// Returns [`ForumServerError::Io`] when serving fails.
    pub async fn serve_with_shutdown(
        self,
        listener: TcpListener,
        shutdown: impl Future<Output = ()> + Send + 'static,
    ) -> Result<(), ForumServerError> {
        let bind = listener
            .local_addr()
            .map_err(|err| ForumServerError::Io(err.to_string()))?
            .to_string();
        self.state.audit.record(&AuditEvent::ServerStart(ServerStartEvent {
            timestamp_ms: self.state.clock.now().as_unix_millis(),
            bind,
            store: store_label(&self.config.store),
            token_count: self.state.tokens.len(),
        }));
        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|err| ForumServerError::Io(err.to_string()))
    }
}

/// Resolves on Ctrl-C.
async fn shutdown_signal() {
    wait_for_signal(tokio::signal::ctrl_c()).await;
}

/// Resolves when `signal` reports delivery.
///
/// A signal that cannot be installed never resolves, so the server keeps
/// running rather than shutting down at once.
async fn wait_for_signal<E>(signal: impl Future<Output = Result<(), E>>) {
    if signal.await.is_err() {
        std::future::pending::<()>().await;
    }
}

// ============================================================================
// SECTION: Router
// ============================================================================

/// Assembles the authenticated, audited route table.
pub fn build_router(state: ServerState, max_body_bytes: usize) -> Router {
    forum_routes()
        .route_layer(middleware::from_fn_with_state(state.clone(), authenticate))
        .route_layer(middleware::from_fn_with_state(state.clone(), audit_request))
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .with_state(state)
}

/// Records one audit event per routed request.
async fn audit_request(State(state): State<ServerState>, request: Request, next: Next) -> Response {
    let method = request.method().to_string();
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map_or_else(|| request.uri().path().to_string(), |path| path.as_str().to_string());
    let fingerprint = bearer_token(request.headers()).map(token_fingerprint);
    let response = next.run(request).await;
    let status = response.status().as_u16();
    let event = ForumRequestEvent {
        timestamp_ms: state.clock.now().as_unix_millis(),
        method,
        route,
        status,
        outcome: RequestOutcome::from_status(status),
        requester: response.extensions().get::<Requester>().map(|requester| requester.0.get()),
        error_kind: response.extensions().get::<ErrorKind>().map(|kind| kind.0),
        token_fingerprint: fingerprint,
    };
    state.audit.record(&AuditEvent::ForumRequest(event));
    response
}

// ============================================================================
// SECTION: Tests
// ============================================================================
