// SPDX-FileCopyrightText: 2026 Steeple Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Steeple integration tests.
//!
//! Provides the mock send API, a capturing notification sink, and
//! [`TestHarness`], which assembles the full gateway stack against temp
//! SQLite stores.

pub mod harness;
pub mod mock_notify;
pub mod mock_send;

pub use harness::{TestHarness, TestHarnessBuilder, MEMBER_PHONE, TENANT_PHONE};
pub use mock_notify::CapturingSink;
pub use mock_send::{MockSendApi, SendOutcome};
