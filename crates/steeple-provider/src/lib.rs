// SPDX-FileCopyrightText: 2026 Steeple Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Provider integration for the Steeple messaging gateway.
//!
//! Covers the three protocol surfaces of the external SMS/MMS provider:
//! Ed25519 webhook signature verification with replay-window enforcement,
//! typed parsing of the webhook envelopes, and the send-API client.

pub mod client;
pub mod verify;
pub mod webhook;

pub use client::ProviderClient;
pub use verify::{SignatureVerifier, DEFAULT_REPLAY_WINDOW_SECS};
pub use webhook::{
    map_delivery_status, parse_webhook, DeliveryReceipt, InboundSms, WebhookEvent,
    EVENT_DELIVERY_UPDATE, EVENT_MESSAGE_RECEIVED,
};
