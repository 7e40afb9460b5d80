// SPDX-FileCopyrightText: 2026 Steeple Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration error types and rendering.

use thiserror::Error;

/// A single configuration problem.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config sources could not be parsed or merged.
    #[error("{message}")]
    Parse { message: String },

    /// The config parsed but a value is semantically invalid.
    #[error("{message}")]
    Validation { message: String },
}

/// Render collected config errors for the operator, one per line.
pub fn render_errors(errors: &[ConfigError]) {
    for error in errors {
        eprintln!("steeple: config error: {error}");
    }
    eprintln!(
        "steeple: {} configuration error(s); see steeple.toml or STEEPLE_* env vars",
        errors.len()
    );
}

/// Convert a figment extraction failure into config errors.
pub fn figment_to_config_errors(err: figment::Error) -> Vec<ConfigError> {
    err.into_iter()
        .map(|e| ConfigError::Parse {
            message: e.to_string(),
        })
        .collect()
}
