// crates/qa-platform-server/src/error.rs
// ============================================================================
// Module: Forum API Errors
// Description: HTTP error mapping for forum routes.
// Purpose: Translate service failures and guard rejections into responses.
// Dependencies: axum, qa-platform-core, serde, thiserror
// ============================================================================

//! ## Overview
//! [`ApiError`] is the single error type returned by route handlers. Every
//! error renders as `{"error": kind, "message": text}` and tags the response
//! with an [`ErrorKind`] extension so the audit layer can record it. Store
//! failures are reported with a generic message.

// ============================================================================
// SECTION: Imports
// ============================================================================

use axum::Json;
use axum::http::HeaderValue;
use axum::http::StatusCode;
use axum::http::header::WWW_AUTHENTICATE;
use axum::response::IntoResponse;
use axum::response::Response;
use qa_platform_core::ServiceError;
use qa_platform_core::ValidationError;
use serde::Serialize;
use thiserror::Error;

// ============================================================================
// SECTION: Error Types
// ============================================================================

/// Error label attached to error responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErrorKind(pub &'static str);

/// Route handler failures.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Missing or unknown bearer token.
    #[error("missing or invalid bearer token")]
    Unauthorized,
    /// Malformed input or a rejected guard (400).
    #[error("{message}")]
    BadRequest {
        /// Stable error label.
        kind: &'static str,
        /// Human-readable detail.
        message: String,
    },
    /// The addressed entity does not exist (404).
    #[error("{0}")]
    NotFound(String),
    /// The server failed (500).
    #[error("internal server error")]
    Internal,
}

impl ApiError {
    /// Builds an [`ApiError::BadRequest`].
    #[must_use]
    pub fn bad_request(kind: &'static str, message: impl Into<String>) -> Self {
        Self::BadRequest {
            kind,
            message: message.into(),
        }
    }

    /// Returns the HTTP status.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::BadRequest {
                ..
            } => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns the stable error label.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Unauthorized => "unauthorized",
            Self::BadRequest {
                kind, ..
            } => kind,
            Self::NotFound(_) => "not_found",
            Self::Internal => "internal",
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(error: ValidationError) -> Self {
        Self::bad_request(error.kind(), error.to_string())
    }
}

impl From<ServiceError> for ApiError {
    fn from(error: ServiceError) -> Self {
        match error {
            ServiceError::Validation(error) => error.into(),
            ServiceError::NotFound {
                ..
            } => Self::NotFound(error.to_string()),
            ServiceError::Store(_) => Self::Internal,
        }
    }
}

// ============================================================================
// SECTION: Response Rendering
// ============================================================================

/// JSON error body.
#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    /// Stable error label.
    error: &'static str,
    /// Human-readable detail.
    message: &'a str,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let kind = self.kind();
        let message = self.to_string();
        let mut response = (
            self.status(),
            Json(ErrorBody {
                error: kind,
                message: &message,
            }),
        )
            .into_response();
        if matches!(self, Self::Unauthorized) {
            response.headers_mut().insert(WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }
        response.extensions_mut().insert(ErrorKind(kind));
        response
    }
}
