// crates/qa-platform-config/src/lib.rs
// ============================================================================
// Module: QA Platform Config Library
// Description: Public API surface for platform configuration.
// Purpose: Expose the configuration model, loader and validation.
// Dependencies: crate::config
// ============================================================================

//! ## Overview
//! Canonical configuration for the QA platform server and CLI.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::AuditConfig;
pub use config::AuditSinkKind;
pub use config::AuthConfig;
pub use config::AuthTokenConfig;
pub use config::CONFIG_ENV_VAR;
pub use config::ConfigError;
pub use config::DEFAULT_BIND;
pub use config::DEFAULT_CONFIG_FILE;
pub use config::DEFAULT_MAX_BODY_BYTES;
pub use config::PaginationSettings;
pub use config::QaPlatformConfig;
pub use config::ServerConfig;
pub use config::StoreConfig;
