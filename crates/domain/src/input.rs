//! Lenient parsing of client input.
//!
//! Request bodies come from browser forms as often as from typed clients, so
//! list fields may arrive as comma-separated strings and numbers as strings.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::error::ValidationError;
use crate::time::Timestamp;

/// Normalise a list-ish JSON value.
///
/// Arrays keep their non-blank items (stringified and trimmed), strings are
/// split on commas, `null` yields `None`.
#[must_use]
pub fn normalize_list(value: &Value) -> Option<Vec<String>> {
    match value {
        Value::Null => None,
        Value::Array(items) => Some(
            items
                .iter()
                .map(value_to_text)
                .map(|item| item.trim().to_string())
                .filter(|item| !item.is_empty())
                .collect(),
        ),
        other => Some(
            value_to_text(other)
                .split(',')
                .map(str::trim)
                .filter(|part| !part.is_empty())
                .map(str::to_string)
                .collect(),
        ),
    }
}

/// Interpret a JSON value as a number when possible.
#[must_use]
pub fn maybe_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Parse a lesson price.
///
/// Absent, `null` and blank values mean "no price".
///
/// # Errors
///
/// Returns [`ValidationError::InvalidPrice`] for anything that is not a
/// number or numeric string.
pub fn parse_price(value: &Value) -> Result<Option<f64>, ValidationError> {
    match value {
        Value::Null => Ok(None),
        Value::String(s) if s.trim().is_empty() => Ok(None),
        other => maybe_number(other)
            .filter(|n| n.is_finite())
            .map(Some)
            .ok_or(ValidationError::InvalidPrice),
    }
}

/// Parse an ISO-8601 instant.
///
/// Offsets are honoured; naive date-times and bare dates are taken as UTC.
///
/// # Errors
///
/// Returns [`ValidationError::InvalidDateTime`] naming `field`.
pub fn parse_instant(raw: &str, field: &'static str) -> Result<Timestamp, ValidationError> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.to_utc());
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Ok(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
        .ok_or(ValidationError::InvalidDateTime(field))
}

/// Serde adapter for `Option<Vec<String>>` fields using [`normalize_list`].
///
/// # Errors
///
/// Only fails when the input is not valid JSON.
pub fn string_list<'de, D>(deserializer: D) -> Result<Option<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(normalize_list(&value))
}

/// Serde adapter for `Option<f64>` fields using [`maybe_number`].
///
/// # Errors
///
/// Only fails when the input is not valid JSON.
pub fn lenient_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(maybe_number(&value))
}

/// Serde adapter for optional strings that are trimmed, blank meaning absent.
///
/// # Errors
///
/// Fails when the value is neither a string nor `null`.
pub fn trimmed<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<String> = Option::deserialize(deserializer)?;
    Ok(value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty()))
}

fn value_to_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
