// SPDX-FileCopyrightText: 2026 Steeple Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Steeple messaging gateway.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use serde::{Deserialize, Serialize};

/// Top-level Steeple configuration.
///
/// Loaded from TOML files following the XDG hierarchy, with environment
/// variable overrides. All sections are optional and default to sensible
/// values; the provider section must be filled in for production use.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SteepleConfig {
    /// HTTP gateway settings.
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// SMS/MMS provider settings.
    #[serde(default)]
    pub provider: ProviderConfig,

    /// Storage paths.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Circuit breaker and retry settings.
    #[serde(default)]
    pub resilience: ResilienceConfig,

    /// Inbound/outbound pipeline behavior.
    #[serde(default)]
    pub messaging: MessagingConfig,
}

/// HTTP gateway configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GatewayConfig {
    /// Host address to bind.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to bind.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            log_level: default_log_level(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_log_level() -> String {
    "info".to_string()
}

/// SMS/MMS provider configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ProviderConfig {
    /// Base URL of the provider's REST API.
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// Provider API key. `None` disables outbound sends.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Hex-encoded Ed25519 public key used to verify webhook signatures.
    /// `None` rejects all webhooks (fail-closed).
    #[serde(default)]
    pub public_key_hex: Option<String>,

    /// Maximum age (seconds) of a webhook timestamp before it is
    /// rejected as a replay.
    #[serde(default = "default_replay_window")]
    pub replay_window_secs: i64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            api_key: None,
            public_key_hex: None,
            replay_window_secs: default_replay_window(),
        }
    }
}

fn default_api_base() -> String {
    "https://api.provider.example/v2".to_string()
}

fn default_replay_window() -> i64 {
    300
}

/// Storage paths.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the central registry database file.
    #[serde(default = "default_registry_path")]
    pub registry_path: String,

    /// Directory holding per-tenant database files.
    #[serde(default = "default_tenant_dir")]
    pub tenant_dir: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            registry_path: default_registry_path(),
            tenant_dir: default_tenant_dir(),
        }
    }
}

fn default_registry_path() -> String {
    "data/registry.db".to_string()
}

fn default_tenant_dir() -> String {
    "data/tenants".to_string()
}

/// Circuit breaker and retry configuration for the provider dependency.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ResilienceConfig {
    #[serde(default)]
    pub breaker: BreakerSection,

    #[serde(default)]
    pub retry: RetrySection,
}

/// Circuit breaker tuning.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BreakerSection {
    /// Consecutive failures before the breaker opens.
    #[serde(default = "default_failure_threshold")]
    pub failure_threshold: u32,

    /// Cool-down before a half-open probe is allowed, in milliseconds.
    #[serde(default = "default_reset_timeout_ms")]
    pub reset_timeout_ms: u64,

    /// Concurrent probes allowed while half-open.
    #[serde(default = "default_half_open_probes")]
    pub half_open_probes: u32,
}

impl Default for BreakerSection {
    fn default() -> Self {
        Self {
            failure_threshold: default_failure_threshold(),
            reset_timeout_ms: default_reset_timeout_ms(),
            half_open_probes: default_half_open_probes(),
        }
    }
}

fn default_failure_threshold() -> u32 {
    5
}

fn default_reset_timeout_ms() -> u64 {
    30_000
}

fn default_half_open_probes() -> u32 {
    2
}

/// Retry executor tuning for the messaging provider.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RetrySection {
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,

    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,

    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,

    /// Uniform jitter fraction in `[0, 1)`.
    #[serde(default = "default_jitter_factor")]
    pub jitter_factor: f64,
}

impl Default for RetrySection {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            initial_delay_ms: default_initial_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            backoff_multiplier: default_backoff_multiplier(),
            jitter_factor: default_jitter_factor(),
        }
    }
}

fn default_max_retries() -> u32 {
    4
}

fn default_initial_delay_ms() -> u64 {
    250
}

fn default_max_delay_ms() -> u64 {
    5_000
}

fn default_backoff_multiplier() -> f64 {
    2.0
}

fn default_jitter_factor() -> f64 {
    0.2
}

/// Inbound/outbound pipeline behavior.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct MessagingConfig {
    /// One-time auto-reply sent to senders who are not members.
    #[serde(default = "default_auto_reply")]
    pub auto_reply: String,

    /// Chat-ops webhook for operational alerts. `None` disables alerting.
    #[serde(default)]
    pub notify_webhook_url: Option<String>,

    /// TTL of the send-time `provider_message_id -> tenant_id` route
    /// cache used by the delivery reconciler, in seconds.
    #[serde(default = "default_route_cache_ttl")]
    pub route_cache_ttl_secs: u64,
}

impl Default for MessagingConfig {
    fn default() -> Self {
        Self {
            auto_reply: default_auto_reply(),
            notify_webhook_url: None,
            route_cache_ttl_secs: default_route_cache_ttl(),
        }
    }
}

fn default_auto_reply() -> String {
    "This number sends updates from your congregation. Ask a staff member to add \
     your number, then text again."
        .to_string()
}

fn default_route_cache_ttl() -> u64 {
    3_600
}
