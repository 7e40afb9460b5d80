// SPDX-FileCopyrightText: 2026 Steeple Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration system for the Steeple messaging gateway.
//!
//! Provides TOML configuration parsing with strict validation
//! (`deny_unknown_fields`), XDG file hierarchy lookup, and environment
//! variable overrides.

pub mod error;
pub mod loader;
pub mod model;
pub mod validation;

pub use error::{figment_to_config_errors, render_errors, ConfigError};
pub use loader::{load_config, load_config_from_path, load_config_from_str};
pub use model::SteepleConfig;

/// Load configuration from the XDG hierarchy and validate it.
///
/// Returns either a valid `SteepleConfig` or the full list of problems.
pub fn load_and_validate() -> Result<SteepleConfig, Vec<ConfigError>> {
    match loader::load_config() {
        Ok(config) => {
            validation::validate_config(&config)?;
            Ok(config)
        }
        Err(err) => Err(figment_to_config_errors(err)),
    }
}

/// Load configuration from a specific TOML string and validate it.
///
/// Useful for testing and explicit configuration.
pub fn load_and_validate_str(toml_content: &str) -> Result<SteepleConfig, Vec<ConfigError>> {
    match loader::load_config_from_str(toml_content) {
        Ok(config) => {
            validation::validate_config(&config)?;
            Ok(config)
        }
        Err(err) => Err(figment_to_config_errors(err)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = load_and_validate_str("").expect("default config should be valid");
        assert_eq!(config.gateway.host, "127.0.0.1");
        assert_eq!(config.gateway.port, 8080);
        assert_eq!(config.provider.replay_window_secs, 300);
        assert_eq!(config.resilience.breaker.failure_threshold, 5);
        assert!(config.provider.public_key_hex.is_none());
    }

    #[test]
    fn toml_overrides_defaults() {
        let config = load_and_validate_str(
            r#"
            [gateway]
            port = 9090

            [provider]
            api_key = "sk-test"
            public_key_hex = "0000000000000000000000000000000000000000000000000000000000000000"

            [resilience.retry]
            max_retries = 2
            "#,
        )
        .unwrap();
        assert_eq!(config.gateway.port, 9090);
        assert_eq!(config.provider.api_key.as_deref(), Some("sk-test"));
        assert_eq!(config.resilience.retry.max_retries, 2);
        // Untouched sections keep their defaults.
        assert_eq!(config.resilience.retry.initial_delay_ms, 250);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let result = load_and_validate_str(
            r#"
            [gateway]
            prot = 9090
            "#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn bad_public_key_is_a_validation_error() {
        let result = load_and_validate_str(
            r#"
            [provider]
            public_key_hex = "deadbeef"
            "#,
        );
        let errors = result.unwrap_err();
        assert!(errors
            .iter()
            .any(|e| e.to_string().contains("public_key_hex")));
    }

    #[test]
    fn out_of_range_jitter_is_a_validation_error() {
        let result = load_and_validate_str(
            r#"
            [resilience.retry]
            jitter_factor = 1.5
            "#,
        );
        let errors = result.unwrap_err();
        assert!(errors.iter().any(|e| e.to_string().contains("jitter_factor")));
    }

    #[test]
    fn collects_multiple_validation_errors() {
        let result = load_and_validate_str(
            r#"
            [gateway]
            host = ""

            [storage]
            registry_path = ""
            tenant_dir = ""
            "#,
        );
        let errors = result.unwrap_err();
        assert!(errors.len() >= 3);
    }
}
