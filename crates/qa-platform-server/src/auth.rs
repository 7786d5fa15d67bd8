// crates/qa-platform-server/src/auth.rs
// ============================================================================
// Module: Bearer Authentication
// Description: Maps bearer tokens to forum users.
// Purpose: Reject unauthenticated requests and expose the requester.
// Dependencies: axum, qa-platform-config, qa-platform-core
// ============================================================================

//! ## Overview
//! Every forum route requires `Authorization: Bearer <token>`. A known token
//! resolves to the configured [`UserId`], stored as a [`Requester`] request
//! extension for handlers and copied onto the response for the audit layer.
//! Anything else is answered with 401 before the handler runs.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use axum::extract::Request;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::http::header::AUTHORIZATION;
use axum::middleware::Next;
use axum::response::IntoResponse;
use axum::response::Response;
use qa_platform_config::AuthConfig;
use qa_platform_core::UserId;

use crate::error::ApiError;
use crate::server::ServerState;

// ============================================================================
// SECTION: Token Table
// ============================================================================

/// Authenticated caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Requester(pub UserId);

/// Bearer token lookup table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenTable {
    /// Token to user mapping.
    tokens: BTreeMap<String, UserId>,
}

impl TokenTable {
    /// Builds the table from configuration.
    #[must_use]
    pub fn from_config(config: &AuthConfig) -> Self {
        Self {
            tokens: config
                .tokens
                .iter()
                .map(|entry| (entry.token.clone(), entry.user_id))
                .collect(),
        }
    }

    /// Returns the number of tokens.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Returns true when no token is configured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Resolves a token.
    #[must_use]
    pub fn user(&self, token: &str) -> Option<UserId> {
        self.tokens.get(token).copied()
    }
}

/// Extracts the bearer token from request headers.
#[must_use]
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

// ============================================================================
// SECTION: Middleware
// ============================================================================

/// Resolves the requester or answers 401.
pub async fn authenticate(
    State(state): State<ServerState>,
    mut request: Request,
    next: Next,
) -> Response {
    let Some(user) = bearer_token(request.headers()).and_then(|token| state.tokens().user(token))
    else {
        return ApiError::Unauthorized.into_response();
    };
    let requester = Requester(user);
    request.extensions_mut().insert(requester);
    let mut response = next.run(request).await;
    response.extensions_mut().insert(requester);
    response
}
