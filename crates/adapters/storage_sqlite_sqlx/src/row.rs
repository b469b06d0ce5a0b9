//! Column decoding shared by the repositories.
//!
//! Identifiers are stored as hyphenated UUID text and timestamps in the
//! canonical form produced by [`to_canonical`](tutorhub_domain::time::to_canonical).

use std::str::FromStr;

use serde::de::DeserializeOwned;
use sqlx::Row;
use sqlx::sqlite::SqliteRow;
use tutorhub_domain::time::Timestamp;

use crate::error::decode;

/// Parse a text column (ids, statuses) through the type's `FromStr`.
pub(crate) fn parsed<T>(row: &SqliteRow, column: &str) -> Result<T, sqlx::Error>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let raw: String = row.try_get(column)?;
    T::from_str(&raw).map_err(decode)
}

pub(crate) fn maybe_parsed<T>(row: &SqliteRow, column: &str) -> Result<Option<T>, sqlx::Error>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let raw: Option<String> = row.try_get(column)?;
    raw.map(|raw| T::from_str(&raw).map_err(decode)).transpose()
}

pub(crate) fn timestamp(row: &SqliteRow, column: &str) -> Result<Timestamp, sqlx::Error> {
    let raw: String = row.try_get(column)?;
    chrono::DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.to_utc())
        .map_err(decode)
}

pub(crate) fn json<T: DeserializeOwned>(row: &SqliteRow, column: &str) -> Result<T, sqlx::Error> {
    let raw: String = row.try_get(column)?;
    serde_json::from_str(&raw).map_err(decode)
}

/// Row counts come back as `i64`.
pub(crate) fn count(value: i64) -> usize {
    usize::try_from(value).unwrap_or_default()
}
