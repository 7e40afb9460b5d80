// SPDX-FileCopyrightText: 2026 Steeple Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP request handlers for the provider webhooks.
//!
//! Response contract: 200 with `{"received": true}` on every terminal
//! outcome (processed, duplicate, unknown tenant, non-member, ignored,
//! deferred), 400 on malformed requests, 401 on signature failure, 500
//! reserved for truly unexpected faults.

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::{error, warn};

use steeple_core::SteepleError;
use steeple_provider::{parse_webhook, WebhookEvent};

use crate::server::GatewayState;

/// Acknowledgment body for webhook deliveries.
#[derive(Debug, Serialize)]
pub struct WebhookAck {
    pub received: bool,
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

fn ack() -> Response {
    (StatusCode::OK, Json(WebhookAck { received: true })).into_response()
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
        .into_response()
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> &'a str {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
}

/// POST /webhooks/provider/messages
///
/// Raw body in, because signature verification covers the exact bytes
/// received. Every terminal outcome is acknowledged so the provider does
/// not retry-storm us.
pub async fn post_message_webhook(
    State(state): State<GatewayState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let signature = header_str(&headers, "signature");
    let timestamp = header_str(&headers, "timestamp");

    match state.inbound.process(&body, signature, timestamp).await {
        Ok(_outcome) => ack(),
        Err(SteepleError::Authentication(message)) => {
            warn!("message webhook rejected: {message}");
            error_response(StatusCode::UNAUTHORIZED, message)
        }
        Err(SteepleError::Validation(message)) => {
            error_response(StatusCode::BAD_REQUEST, message)
        }
        Err(err) => {
            error!(error = %err, "message webhook failed unexpectedly");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "internal error")
        }
    }
}

/// POST /webhooks/provider/status
///
/// Delivery receipts: same signature scheme, then reconciliation. A
/// receipt that matches nothing is still acknowledged (late or
/// out-of-order delivery).
pub async fn post_status_webhook(
    State(state): State<GatewayState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let signature = header_str(&headers, "signature");
    let timestamp = header_str(&headers, "timestamp");

    if !state.verifier.verify(&body, signature, timestamp) {
        warn!("status webhook rejected: signature verification failed");
        return error_response(StatusCode::UNAUTHORIZED, "webhook signature rejected");
    }

    let receipt = match parse_webhook(&body) {
        Ok(WebhookEvent::DeliveryReceipt(receipt)) => receipt,
        Ok(_) => return ack(), // not a receipt; acknowledge and drop
        Err(SteepleError::Validation(message)) => {
            return error_response(StatusCode::BAD_REQUEST, message);
        }
        Err(err) => {
            error!(error = %err, "status webhook failed unexpectedly");
            return error_response(StatusCode::INTERNAL_SERVER_ERROR, "internal error");
        }
    };

    match state
        .reconciler
        .apply_receipt(&receipt.provider_message_id, &receipt.status)
        .await
    {
        Ok(_outcome) => ack(),
        Err(err) => {
            error!(error = %err, "delivery reconciliation failed unexpectedly");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "internal error")
        }
    }
}

/// Response body for GET /health.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
}

/// GET /health, unauthenticated, for systemd and load balancers.
pub async fn get_health(State(state): State<GatewayState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.health.start_time.elapsed().as_secs(),
    })
}

/// GET /metrics in Prometheus text format, unauthenticated.
pub async fn get_metrics(State(state): State<GatewayState>) -> Response {
    match &state.health.prometheus_render {
        Some(render) => (StatusCode::OK, render()).into_response(),
        None => error_response(StatusCode::NOT_FOUND, "metrics not enabled"),
    }
}
