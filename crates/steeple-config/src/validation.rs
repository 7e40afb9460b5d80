// SPDX-FileCopyrightText: 2026 Steeple Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde
//! attributes. Collects every problem instead of failing fast so the
//! operator sees the full list in one run.

use crate::error::ConfigError;
use crate::model::SteepleConfig;

/// Validate a deserialized configuration for semantic correctness.
pub fn validate_config(config: &SteepleConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    let host = config.gateway.host.trim();
    if host.is_empty() {
        errors.push(ConfigError::Validation {
            message: "gateway.host must not be empty".to_string(),
        });
    } else {
        let is_valid_ip = host.parse::<std::net::IpAddr>().is_ok();
        let is_valid_hostname = host
            .chars()
            .all(|c| c.is_alphanumeric() || c == '.' || c == '-' || c == ':');
        if !is_valid_ip && !is_valid_hostname {
            errors.push(ConfigError::Validation {
                message: format!(
                    "gateway.host `{host}` is not a valid IP address or hostname"
                ),
            });
        }
    }

    if config.storage.registry_path.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "storage.registry_path must not be empty".to_string(),
        });
    }
    if config.storage.tenant_dir.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "storage.tenant_dir must not be empty".to_string(),
        });
    }

    if config.provider.replay_window_secs <= 0 {
        errors.push(ConfigError::Validation {
            message: format!(
                "provider.replay_window_secs must be positive, got {}",
                config.provider.replay_window_secs
            ),
        });
    }

    if let Some(ref key) = config.provider.public_key_hex {
        match hex::decode(key) {
            Ok(bytes) if bytes.len() == 32 => {}
            Ok(bytes) => errors.push(ConfigError::Validation {
                message: format!(
                    "provider.public_key_hex must decode to 32 bytes, got {}",
                    bytes.len()
                ),
            }),
            Err(_) => errors.push(ConfigError::Validation {
                message: "provider.public_key_hex is not valid hex".to_string(),
            }),
        }
    }

    if config.resilience.breaker.failure_threshold < 1 {
        errors.push(ConfigError::Validation {
            message: "resilience.breaker.failure_threshold must be at least 1".to_string(),
        });
    }
    if config.resilience.breaker.half_open_probes < 1 {
        errors.push(ConfigError::Validation {
            message: "resilience.breaker.half_open_probes must be at least 1".to_string(),
        });
    }

    let retry = &config.resilience.retry;
    if retry.backoff_multiplier < 1.0 {
        errors.push(ConfigError::Validation {
            message: format!(
                "resilience.retry.backoff_multiplier must be at least 1.0, got {}",
                retry.backoff_multiplier
            ),
        });
    }
    if !(0.0..1.0).contains(&retry.jitter_factor) {
        errors.push(ConfigError::Validation {
            message: format!(
                "resilience.retry.jitter_factor must be in [0, 1), got {}",
                retry.jitter_factor
            ),
        });
    }
    if retry.initial_delay_ms > retry.max_delay_ms {
        errors.push(ConfigError::Validation {
            message: format!(
                "resilience.retry.initial_delay_ms ({}) exceeds max_delay_ms ({})",
                retry.initial_delay_ms, retry.max_delay_ms
            ),
        });
    }

    if config.messaging.auto_reply.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "messaging.auto_reply must not be empty".to_string(),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
