//! Time and timestamp helpers.

use chrono::{DateTime, SecondsFormat, Utc};

/// UTC timestamp used for `created_at`, `updated_at`, booking slots, etc.
pub type Timestamp = DateTime<Utc>;

/// Return the current UTC time.
#[must_use]
pub fn now() -> Timestamp {
    Utc::now()
}

/// Canonical fixed-width text form (`2025-03-10T14:00:00.000000Z`).
///
/// Two equal instants always produce the same string, so the text can be
/// compared, sorted and indexed.
#[must_use]
pub fn to_canonical(ts: Timestamp) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Parse any RFC 3339 string back into UTC.
#[must_use]
pub fn from_rfc3339(raw: &str) -> Option<Timestamp> {
    DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.to_utc())
}
