// crates/qa-platform-config/src/config.rs
// ============================================================================
// Module: QA Platform Configuration
// Description: TOML configuration model, loading and validation.
// Purpose: Provide one fail-closed configuration surface for server and CLI.
// Dependencies: qa-platform-core, qa-platform-store-sqlite, serde, toml
// ============================================================================

//! ## Overview
//! Configuration is read from an explicit path, the `QA_PLATFORM_CONFIG`
//! environment variable, or `qa-platform.toml` in the working directory, in
//! that order. Loading enforces path and size limits before parsing, and
//! [`QaPlatformConfig::validate`] rejects anything the server could not run
//! with safely.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;
use std::net::SocketAddr;
use std::path::Path;
use std::path::PathBuf;

use qa_platform_core::DEFAULT_ITEMS_ON_PAGE;
use qa_platform_core::DEFAULT_MAX_ITEMS_ON_PAGE;
use qa_platform_core::PaginationConfig;
use qa_platform_core::UserId;
use qa_platform_store_sqlite::SqliteStoreConfig;
use serde::Deserialize;
use thiserror::Error;

// ============================================================================
// SECTION: Limits and Defaults
// ============================================================================

/// Environment variable naming the configuration file.
pub const CONFIG_ENV_VAR: &str = "QA_PLATFORM_CONFIG";
/// Configuration file used when no path is given.
pub const DEFAULT_CONFIG_FILE: &str = "qa-platform.toml";
/// Default bind address.
pub const DEFAULT_BIND: &str = "127.0.0.1:8080";
/// Default request body limit.
pub const DEFAULT_MAX_BODY_BYTES: usize = 64 * 1024;

/// Maximum configuration file size.
const MAX_CONFIG_FILE_BYTES: u64 = 1_048_576;
/// Maximum total path length.
const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Maximum length of a single path component.
const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Largest accepted request body limit.
const MAX_BODY_BYTES_LIMIT: usize = 16 * 1024 * 1024;
/// Maximum number of bearer tokens.
const MAX_AUTH_TOKENS: usize = 64;
/// Maximum bearer token length.
const MAX_AUTH_TOKEN_LENGTH: usize = 256;
/// Largest accepted page size cap.
const MAX_PAGE_SIZE_CAP: u64 = 10_000;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("config io error: {0}")]
    Io(String),
    /// The configuration file is not valid TOML for this model.
    #[error("config parse error: {0}")]
    Parse(String),
    /// The configuration violates a constraint.
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Builds a [`ConfigError::Invalid`].
fn invalid(message: impl Into<String>) -> ConfigError {
    ConfigError::Invalid(message.into())
}

// ============================================================================
// SECTION: Model
// ============================================================================

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct QaPlatformConfig {
    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,
    /// Bearer token table.
    #[serde(default)]
    pub auth: AuthConfig,
    /// Storage backend.
    #[serde(default)]
    pub store: StoreConfig,
    /// Page size limits.
    #[serde(default)]
    pub pagination: PaginationSettings,
}

/// HTTP server settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Socket address to bind.
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Maximum accepted request body size.
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
    /// Audit log destination.
    #[serde(default)]
    pub audit: AuditConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            audit: AuditConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Parses the bind address.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when the address does not parse.
    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.bind.parse().map_err(|_| invalid(format!("invalid bind address: {}", self.bind)))
    }
}

/// Returns the default bind address.
fn default_bind() -> String {
    DEFAULT_BIND.to_string()
}

/// Returns the default request body limit.
const fn default_max_body_bytes() -> usize {
    DEFAULT_MAX_BODY_BYTES
}

/// Audit sink selection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditSinkKind {
    /// JSON lines on stderr.
    #[default]
    Stderr,
    /// JSON lines appended to a file.
    File,
    /// Discard events.
    None,
}

/// Audit log configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AuditConfig {
    /// Destination.
    #[serde(default)]
    pub sink: AuditSinkKind,
    /// File path for the `file` sink.
    #[serde(default)]
    pub path: Option<PathBuf>,
}

/// Bearer token table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AuthConfig {
    /// Accepted tokens and the users they authenticate.
    #[serde(default)]
    pub tokens: Vec<AuthTokenConfig>,
}

/// One bearer token.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AuthTokenConfig {
    /// Opaque token value.
    pub token: String,
    /// User authenticated by the token.
    pub user_id: UserId,
}

/// Storage backend selection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StoreConfig {
    /// Volatile in-memory store.
    #[default]
    Memory,
    /// Durable `SQLite` store.
    Sqlite(SqliteStoreConfig),
}

/// Page size limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PaginationSettings {
    /// Page size used when a request omits one.
    #[serde(default = "default_items_on_page")]
    pub default_items_on_page: u64,
    /// Largest accepted page size.
    #[serde(default = "default_max_items_on_page")]
    pub max_items_on_page: u64,
}

impl Default for PaginationSettings {
    fn default() -> Self {
        Self {
            default_items_on_page: DEFAULT_ITEMS_ON_PAGE,
            max_items_on_page: DEFAULT_MAX_ITEMS_ON_PAGE,
        }
    }
}

impl PaginationSettings {
    /// Converts into the engine's pagination limits.
    #[must_use]
    pub const fn to_pagination(self) -> PaginationConfig {
        PaginationConfig {
            default_items_on_page: self.default_items_on_page,
            max_items_on_page: self.max_items_on_page,
        }
    }
}

/// Returns the default page size.
const fn default_items_on_page() -> u64 {
    DEFAULT_ITEMS_ON_PAGE
}

/// Returns the default page size cap.
const fn default_max_items_on_page() -> u64 {
    DEFAULT_MAX_ITEMS_ON_PAGE
}

// ============================================================================
// SECTION: Loading
// ============================================================================

impl QaPlatformConfig {
    /// Loads and validates configuration.
    ///
    /// The path is `path`, else `QA_PLATFORM_CONFIG`, else
    /// `qa-platform.toml`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the file is unreadable, malformed, or
    /// invalid.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let resolved = resolve_path(path);
        validate_path(&resolved)?;
        let bytes = read_limited(&resolved)?;
        let text =
            std::str::from_utf8(&bytes).map_err(|_| invalid("config file must be utf-8"))?;
        let config = Self::from_toml(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Parses configuration from TOML text without validating it.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] when the text does not match the model.
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|err| ConfigError::Parse(err.to_string()))
    }

    /// Validates every section.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] describing the first violation.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_server()?;
        self.validate_auth()?;
        self.validate_store()?;
        self.validate_pagination()
    }

    /// Returns the user authenticated by `token`, if any.
    #[must_use]
    pub fn user_for_token(&self, token: &str) -> Option<UserId> {
        self.auth.tokens.iter().find(|entry| entry.token == token).map(|entry| entry.user_id)
    }

    /// Validates the server section.
    fn validate_server(&self) -> Result<(), ConfigError> {
        self.server.bind_addr()?;
        if self.server.max_body_bytes == 0 || self.server.max_body_bytes > MAX_BODY_BYTES_LIMIT {
            return Err(invalid(format!(
                "max_body_bytes must be between 1 and {MAX_BODY_BYTES_LIMIT}"
            )));
        }
        match (self.server.audit.sink, &self.server.audit.path) {
            (AuditSinkKind::File, None) => Err(invalid("file audit sink requires path")),
            (AuditSinkKind::File, Some(path)) if path.as_os_str().is_empty() => {
                Err(invalid("file audit sink requires path"))
            }
            (AuditSinkKind::File, Some(path)) => validate_path(path),
            _ => Ok(()),
        }
    }

    /// Validates the bearer token table.
    fn validate_auth(&self) -> Result<(), ConfigError> {
        let tokens = &self.auth.tokens;
        if tokens.is_empty() {
            return Err(invalid("auth requires at least one token"));
        }
        if tokens.len() > MAX_AUTH_TOKENS {
            return Err(invalid(format!("too many auth tokens (max {MAX_AUTH_TOKENS})")));
        }
        let mut seen = BTreeSet::new();
        for entry in tokens {
            if entry.token.is_empty() {
                return Err(invalid("auth token must not be empty"));
            }
            if entry.token.len() > MAX_AUTH_TOKEN_LENGTH {
                return Err(invalid("auth token too long"));
            }
            if entry.token.chars().any(char::is_whitespace) {
                return Err(invalid("auth token must not contain whitespace"));
            }
            if !seen.insert(entry.token.as_str()) {
                return Err(invalid("duplicate auth token"));
            }
        }
        Ok(())
    }

    /// Validates the store section.
    fn validate_store(&self) -> Result<(), ConfigError> {
        match &self.store {
            StoreConfig::Memory => Ok(()),
            StoreConfig::Sqlite(sqlite) => {
                if sqlite.path.as_os_str().is_empty() {
                    return Err(invalid("sqlite store requires path"));
                }
                if sqlite.busy_timeout_ms == 0 {
                    return Err(invalid("sqlite busy_timeout_ms must be positive"));
                }
                validate_path(&sqlite.path)
            }
        }
    }

    /// Validates the pagination section.
    fn validate_pagination(&self) -> Result<(), ConfigError> {
        let pagination = self.pagination;
        if pagination.default_items_on_page == 0 {
            return Err(invalid("default_items_on_page must be positive"));
        }
        if pagination.max_items_on_page > MAX_PAGE_SIZE_CAP {
            return Err(invalid(format!("max_items_on_page must not exceed {MAX_PAGE_SIZE_CAP}")));
        }
        if pagination.default_items_on_page > pagination.max_items_on_page {
            return Err(invalid("default_items_on_page must not exceed max_items_on_page"));
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Path Helpers
// ============================================================================

/// Resolves the configuration path.
fn resolve_path(path: Option<&Path>) -> PathBuf {
    if let Some(path) = path {
        return path.to_path_buf();
    }
    match std::env::var_os(CONFIG_ENV_VAR) {
        Some(value) if !value.is_empty() => PathBuf::from(value),
        _ => PathBuf::from(DEFAULT_CONFIG_FILE),
    }
}

/// Rejects overlong paths and path components.
fn validate_path(path: &Path) -> Result<(), ConfigError> {
    if path.as_os_str().len() > MAX_TOTAL_PATH_LENGTH {
        return Err(invalid("config path exceeds max length"));
    }
    if path.components().any(|component| component.as_os_str().len() > MAX_PATH_COMPONENT_LENGTH) {
        return Err(invalid("config path component too long"));
    }
    Ok(())
}

/// Reads a file, failing when it exceeds the size limit.
fn read_limited(path: &Path) -> Result<Vec<u8>, ConfigError> {
    let metadata = std::fs::metadata(path)
        .map_err(|err| ConfigError::Io(format!("{}: {err}", path.display())))?;
    if metadata.len() > MAX_CONFIG_FILE_BYTES {
        return Err(invalid("config file exceeds size limit"));
    }
    std::fs::read(path).map_err(|err| ConfigError::Io(format!("{}: {err}", path.display())))
}
