// SPDX-FileCopyrightText: 2026 Steeple Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Provider send API collaborator.

use async_trait::async_trait;

use crate::error::SteepleError;
use crate::types::{SendReceipt, SendRequest};

/// The outbound half of the SMS/MMS provider integration.
///
/// Implementations raise `SteepleError::Provider` with the HTTP status
/// attached so the retry executor can classify transient (network, 5xx,
/// 429) versus permanent (other 4xx) failures.
#[async_trait]
pub trait SendApi: Send + Sync + 'static {
    /// Submit one message to the provider. Returns the provider-assigned
    /// message id used later to correlate delivery receipts.
    async fn send_message(&self, request: &SendRequest)
        -> Result<SendReceipt, SteepleError>;
}
