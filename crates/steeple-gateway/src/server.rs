// SPDX-FileCopyrightText: 2026 Steeple Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gateway HTTP server built on axum.
//!
//! Sets up routes and shared state. The webhook handlers read the raw
//! request body; no body-transforming middleware may sit in front of
//! them or signature verification breaks.

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;

use steeple_core::SteepleError;
use steeple_messaging::{DeliveryReconciler, InboundProcessor};
use steeple_provider::SignatureVerifier;

use crate::handlers;

/// Health state for the unauthenticated health/metrics endpoints.
#[derive(Clone)]
pub struct HealthState {
    /// Process start time for uptime calculation.
    pub start_time: std::time::Instant,
    /// Optional Prometheus metrics render function.
    pub prometheus_render: Option<Arc<dyn Fn() -> String + Send + Sync>>,
}

/// Shared state for axum request handlers.
#[derive(Clone)]
pub struct GatewayState {
    /// Inbound webhook processor (verifies message webhooks itself).
    pub inbound: Arc<InboundProcessor>,
    /// Delivery receipt reconciler.
    pub reconciler: Arc<DeliveryReconciler>,
    /// Verifier for the status webhook endpoint.
    pub verifier: Arc<SignatureVerifier>,
    /// Health state for unauthenticated endpoints.
    pub health: HealthState,
}

/// Gateway server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Build the gateway router. Exposed separately from [`start_server`] so
/// tests can drive it without binding a socket.
pub fn router(state: GatewayState) -> Router {
    let webhook_routes = Router::new()
        .route(
            "/webhooks/provider/messages",
            post(handlers::post_message_webhook),
        )
        .route(
            "/webhooks/provider/status",
            post(handlers::post_status_webhook),
        )
        .with_state(state.clone());

    let public_routes = Router::new()
        .route("/health", get(handlers::get_health))
        .route("/metrics", get(handlers::get_metrics))
        .with_state(state);

    Router::new()
        .merge(webhook_routes)
        .merge(public_routes)
        .layer(CorsLayer::permissive())
}

/// Start the gateway HTTP server and serve until the process exits.
pub async fn start_server(
    config: &ServerConfig,
    state: GatewayState,
) -> Result<(), SteepleError> {
    let app = router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| SteepleError::Internal(format!("failed to bind gateway to {addr}: {e}")))?;

    tracing::info!("gateway listening on {addr}");

    axum::serve(listener, app)
        .await
        .map_err(|e| SteepleError::Internal(format!("gateway server error: {e}")))?;

    Ok(())
}
