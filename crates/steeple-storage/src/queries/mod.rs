// SPDX-FileCopyrightText: 2026 Steeple Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Typed query modules, one per entity.
//!
//! Every function takes `&Database` and routes through the single
//! background writer via `connection().call()`.

pub mod conversations;
pub mod dead_letters;
pub mod members;
pub mod messages;
pub mod tenants;

/// Current UTC time in the millisecond RFC 3339 form used everywhere in
/// the schema (`2026-01-01T00:00:00.000Z`).
pub(crate) fn now_rfc3339() -> String {
    chrono::Utc::now().format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
}

/// Parse a TEXT enum column, mapping failures to a rusqlite conversion
/// error so row closures stay uniform.
pub(crate) fn parse_enum<T>(idx: usize, value: String) -> Result<T, rusqlite::Error>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    value.parse().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(
            idx,
            rusqlite::types::Type::Text,
            Box::new(e),
        )
    })
}
