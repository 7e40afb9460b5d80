// SPDX-FileCopyrightText: 2026 Steeple Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Capturing mock of the notification sink.

use async_trait::async_trait;
use tokio::sync::Mutex;

use steeple_core::NotificationSink;

/// Records every notification instead of delivering it.
pub struct CapturingSink {
    events: Mutex<Vec<(String, String)>>,
}

impl CapturingSink {
    pub fn new() -> Self {
        Self {
            events: Mutex::new(Vec::new()),
        }
    }

    pub async fn events(&self) -> Vec<(String, String)> {
        self.events.lock().await.clone()
    }
}

impl Default for CapturingSink {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl NotificationSink for CapturingSink {
    async fn notify(&self, subject: &str, body: &str) {
        self.events
            .lock()
            .await
            .push((subject.to_string(), body.to_string()));
    }
}
