// SPDX-FileCopyrightText: 2026 Steeple Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain model types for storage entities.
//!
//! The canonical types are defined in `steeple-core::types` for use across
//! collaborator trait boundaries. This module re-exports them for
//! convenience within the storage crate.

pub use steeple_core::types::{
    Conversation, ConversationMessage, ConversationState, DeadLetterCategory,
    DeadLetterEntry, DeadLetterStatus, DeliveryState, Direction, Member, Tenant,
};
