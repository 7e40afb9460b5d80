// SPDX-FileCopyrightText: 2026 Steeple Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Composition root for the gateway server.
//!
//! Everything stateful is constructed exactly once here and injected by
//! reference: the circuit breaker instance shared by all concurrent
//! sends, the route cache shared between pipeline and reconciler, and
//! the store handles. There are no ambient singletons.

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use steeple_config::SteepleConfig;
use steeple_core::{NotificationSink, SendApi, SteepleError};
use steeple_gateway::{GatewayState, HealthState, ServerConfig};
use steeple_messaging::{
    DeliveryReconciler, InboundProcessor, NullNotifier, RouteCache, SendPipeline,
    WebhookNotifier,
};
use steeple_metrics::PrometheusRecorder;
use steeple_provider::{ProviderClient, SignatureVerifier};
use steeple_resilience::{BreakerConfig, CircuitBreaker, RetryPolicy};
use steeple_storage::{RegistryStore, TenantResolver};

/// Dead letters resolved this long ago are purged.
const DEAD_LETTER_RETENTION_DAYS: i64 = 30;

/// How often the retention purge runs.
const RETENTION_SWEEP_INTERVAL: Duration = Duration::from_secs(60 * 60);

/// Build the full stack from config and serve until the process exits.
pub async fn run(config: SteepleConfig) -> Result<(), SteepleError> {
    let prometheus = match PrometheusRecorder::install() {
        Ok(recorder) => Some(Arc::new(recorder)),
        Err(err) => {
            warn!(error = %err, "metrics disabled");
            None
        }
    };

    // Storage.
    std::fs::create_dir_all(&config.storage.tenant_dir).map_err(|e| {
        SteepleError::Storage { source: e.into() }
    })?;
    if let Some(parent) = std::path::Path::new(&config.storage.registry_path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .map_err(|e| SteepleError::Storage { source: e.into() })?;
        }
    }
    let registry = Arc::new(RegistryStore::open(&config.storage.registry_path).await?);
    let resolver = Arc::new(TenantResolver::new(
        Arc::clone(&registry),
        config.storage.tenant_dir.clone(),
    ));

    // Resilience stack for the provider dependency.
    let breaker = Arc::new(CircuitBreaker::new(
        "sms-provider",
        BreakerConfig {
            failure_threshold: config.resilience.breaker.failure_threshold,
            reset_timeout: Duration::from_millis(config.resilience.breaker.reset_timeout_ms),
            half_open_probes: config.resilience.breaker.half_open_probes,
        },
    ));
    let retry = RetryPolicy {
        max_retries: config.resilience.retry.max_retries,
        initial_delay: Duration::from_millis(config.resilience.retry.initial_delay_ms),
        max_delay: Duration::from_millis(config.resilience.retry.max_delay_ms),
        backoff_multiplier: config.resilience.retry.backoff_multiplier,
        jitter_factor: config.resilience.retry.jitter_factor,
    };

    // Provider client.
    let api_key = config.provider.api_key.clone().unwrap_or_else(|| {
        warn!("provider.api_key not configured; outbound sends will be rejected");
        String::new()
    });
    let client: Arc<dyn SendApi> =
        Arc::new(ProviderClient::new(&config.provider.api_base, &api_key)?);

    // Operational alerting.
    let notifier: Arc<dyn NotificationSink> = match &config.messaging.notify_webhook_url {
        Some(url) => Arc::new(WebhookNotifier::new(url.clone())),
        None => Arc::new(NullNotifier),
    };

    let route_cache = Arc::new(RouteCache::new(Duration::from_secs(
        config.messaging.route_cache_ttl_secs,
    )));
    let dead_letters = registry.dead_letters();

    let pipeline = Arc::new(SendPipeline::new(
        client,
        Arc::clone(&breaker),
        retry,
        dead_letters.clone(),
        Arc::clone(&route_cache),
        notifier,
    ));

    if config.provider.public_key_hex.is_none() {
        warn!("provider.public_key_hex not configured; all webhooks will be rejected");
    }
    let inbound = Arc::new(InboundProcessor::new(
        SignatureVerifier::from_hex_key(
            config.provider.public_key_hex.as_deref(),
            config.provider.replay_window_secs,
        ),
        Arc::clone(&resolver),
        Arc::clone(&pipeline),
        dead_letters.clone(),
        config.messaging.auto_reply.clone(),
    ));
    let reconciler = Arc::new(DeliveryReconciler::new(
        Arc::clone(&resolver),
        Arc::clone(&route_cache),
    ));

    // Retention sweep for resolved dead letters.
    {
        let dead_letters = dead_letters.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(RETENTION_SWEEP_INTERVAL);
            loop {
                ticker.tick().await;
                let cutoff = (chrono::Utc::now()
                    - chrono::Duration::days(DEAD_LETTER_RETENTION_DAYS))
                .format("%Y-%m-%dT%H:%M:%S%.3fZ")
                .to_string();
                match dead_letters.purge_resolved_before(&cutoff).await {
                    Ok(0) => {}
                    Ok(purged) => info!(purged, "dead letter retention purge"),
                    Err(err) => warn!(error = %err, "dead letter retention purge failed"),
                }
            }
        });
    }

    let state = GatewayState {
        inbound,
        reconciler,
        verifier: Arc::new(SignatureVerifier::from_hex_key(
            config.provider.public_key_hex.as_deref(),
            config.provider.replay_window_secs,
        )),
        health: HealthState {
            start_time: std::time::Instant::now(),
            prometheus_render: prometheus
                .map(|p| Arc::new(move || p.render()) as Arc<dyn Fn() -> String + Send + Sync>),
        },
    };

    info!(
        host = %config.gateway.host,
        port = config.gateway.port,
        "starting webhook gateway"
    );
    steeple_gateway::start_server(
        &ServerConfig {
            host: config.gateway.host.clone(),
            port: config.gateway.port,
        },
        state,
    )
    .await
}
