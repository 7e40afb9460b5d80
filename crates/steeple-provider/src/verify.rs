// SPDX-FileCopyrightText: 2026 Steeple Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Webhook signature verification.
//!
//! The provider signs `timestamp || "|" || raw_body` with Ed25519 and
//! sends the signature and timestamp as headers. Verification is pure
//! and fail-closed: every malformed input path returns `false`, never an
//! error. Callers log outcomes.

use ed25519_dalek::{Signature, Verifier, VerifyingKey};

/// Default replay window in seconds.
pub const DEFAULT_REPLAY_WINDOW_SECS: i64 = 300;

/// Verifies provider webhook signatures against a configured public key.
pub struct SignatureVerifier {
    key: Option<VerifyingKey>,
    replay_window_secs: i64,
}

impl SignatureVerifier {
    /// Build a verifier from a hex-encoded 32-byte Ed25519 public key.
    ///
    /// An absent or undecodable key yields a verifier that rejects
    /// everything (fail-closed), so a misconfigured deployment never
    /// accepts unauthenticated traffic.
    pub fn from_hex_key(hex_key: Option<&str>, replay_window_secs: i64) -> Self {
        let key = hex_key.and_then(decode_key);
        Self {
            key,
            replay_window_secs,
        }
    }

    pub fn from_key(key: VerifyingKey, replay_window_secs: i64) -> Self {
        Self {
            key: Some(key),
            replay_window_secs,
        }
    }

    /// True when a public key is configured and decoded.
    pub fn is_configured(&self) -> bool {
        self.key.is_some()
    }

    /// Validate `raw_body` against the signature and timestamp headers.
    ///
    /// `raw_body` must be the exact bytes received on the wire, not a
    /// re-serialized form. The replay-window check runs only after the
    /// signature itself verifies: the timestamp is attacker-controlled
    /// until then, and is used purely as a freshness bound.
    pub fn verify(&self, raw_body: &[u8], signature: &str, timestamp: &str) -> bool {
        let Some(key) = &self.key else {
            return false;
        };
        if signature.is_empty() || timestamp.is_empty() {
            return false;
        }
        let Ok(sig_bytes) = hex::decode(signature) else {
            return false;
        };
        let sig_array: [u8; 64] = match sig_bytes.try_into() {
            Ok(array) => array,
            Err(_) => return false,
        };
        let signature = Signature::from_bytes(&sig_array);

        let mut message = Vec::with_capacity(timestamp.len() + 1 + raw_body.len());
        message.extend_from_slice(timestamp.as_bytes());
        message.push(b'|');
        message.extend_from_slice(raw_body);

        if key.verify(&message, &signature).is_err() {
            return false;
        }

        // Freshness bound, checked after authenticity is established.
        let Ok(signed_at) = timestamp.parse::<i64>() else {
            return false;
        };
        let now = chrono::Utc::now().timestamp();
        (now - signed_at).abs() <= self.replay_window_secs
    }
}

fn decode_key(hex_key: &str) -> Option<VerifyingKey> {
    let bytes = hex::decode(hex_key).ok()?;
    let array: [u8; 32] = bytes.try_into().ok()?;
    VerifyingKey::from_bytes(&array).ok()
}
