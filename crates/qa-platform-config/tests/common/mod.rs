// crates/qa-platform-config/tests/common/mod.rs
// =============================================================================
// Module: Config Test Helpers
// Description: Shared builders for configuration tests.
// Purpose: Provide a minimal valid configuration to mutate per test.
// =============================================================================

//! Shared helpers for qa-platform-config tests.

#![allow(dead_code, reason = "Shared helpers are not used by every test binary.")]

use qa_platform_config::ConfigError;
use qa_platform_config::QaPlatformConfig;

/// Minimal valid configuration text.
pub const MINIMAL_TOML: &str = r#"
[[auth.tokens]]
token = "dev-token-100"
user_id = 100
"#;

/// Returns a parsed minimal configuration.
pub fn minimal_config() -> Result<QaPlatformConfig, ConfigError> {
    QaPlatformConfig::from_toml(MINIMAL_TOML)
}

/// Asserts that `result` fails with a message containing `needle`.
pub fn assert_invalid<T>(result: Result<T, ConfigError>, needle: &str) -> Result<(), String> {
    match result {
        Err(error) => {
            let message = error.to_string();
            if message.contains(needle) {
                Ok(())
            } else {
                Err(format!("error '{message}' did not contain '{needle}'"))
            }
        }
        Ok(_) => Err("expected invalid config".to_string()),
    }
}
