// SPDX-FileCopyrightText: 2026 Steeple Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Phone number normalization and the deterministic search hash.
//!
//! Member phone numbers are matched by hash, never by raw string, so the
//! hash input must be byte-identical at member creation time and at
//! inbound webhook time. Everything funnels through [`normalize_phone`].

use sha2::{Digest, Sha256};

/// Normalize a phone number to E.164-ish form: digits only, a US country
/// code assumed for bare 10-digit numbers, leading `+`.
pub fn normalize_phone(raw: &str) -> String {
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
    let digits = if digits.len() == 10 {
        format!("1{digits}")
    } else {
        digits
    };
    format!("+{digits}")
}

/// Deterministic, reversible-search hash of a phone number: SHA-256 of
/// the normalized form, hex-encoded. The same scheme is used at member
/// creation and at inbound sender matching.
pub fn search_hash(raw: &str) -> String {
    let normalized = normalize_phone(raw);
    hex::encode(Sha256::digest(normalized.as_bytes()))
}
