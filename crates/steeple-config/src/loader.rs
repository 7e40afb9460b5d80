// SPDX-FileCopyrightText: 2026 Steeple Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports the XDG hierarchy: `./steeple.toml` >
//! `~/.config/steeple/steeple.toml` > `/etc/steeple/steeple.toml`
//! with environment variable overrides via the `STEEPLE_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::SteepleConfig;

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/steeple/steeple.toml` (system-wide)
/// 3. `~/.config/steeple/steeple.toml` (user XDG config)
/// 4. `./steeple.toml` (local directory)
/// 5. `STEEPLE_*` environment variables
pub fn load_config() -> Result<SteepleConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(SteepleConfig::default()))
        .merge(Toml::file("/etc/steeple/steeple.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("steeple/steeple.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("steeple.toml"))
        .merge(env_provider())
        .extract()
}

/// Load configuration from a TOML string only (no XDG lookup).
///
/// Used for testing and explicit configuration.
pub fn load_config_from_str(toml_content: &str) -> Result<SteepleConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(SteepleConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<SteepleConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(SteepleConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Create the environment variable provider using explicit `map()` for
/// section-to-dot mapping.
///
/// Uses `Env::map()` NOT `Env::split("_")` to avoid ambiguity with
/// underscore-containing key names: `STEEPLE_PROVIDER_PUBLIC_KEY_HEX`
/// must map to `provider.public_key_hex`, not `provider.public.key.hex`.
fn env_provider() -> Env {
    Env::prefixed("STEEPLE_").map(|key| {
        // `key` is the lowercased env var name with prefix stripped.
        // Example: STEEPLE_PROVIDER_API_KEY -> "provider_api_key"
        let key_str = key.as_str();
        let mapped = key_str
            .replacen("gateway_", "gateway.", 1)
            .replacen("provider_", "provider.", 1)
            .replacen("storage_", "storage.", 1)
            .replacen("resilience_breaker_", "resilience.breaker.", 1)
            .replacen("resilience_retry_", "resilience.retry.", 1)
            .replacen("messaging_", "messaging.", 1);
        mapped.into()
    })
}
