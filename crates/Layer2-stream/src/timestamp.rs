//! Timestamp codec for `<RFC3339 timestamp> <message>` log lines.

use chrono::{DateTime, SecondsFormat, Utc};
use skiff_foundation::{Error, Result};

/// Split a raw line into its message and the timestamp the runtime prefixed.
///
/// Accepts RFC3339 with or without fractional seconds. Callers fall back to
/// their receipt time on error; the line itself must never be dropped.
pub fn parse_log_line(raw: &str) -> Result<(&str, DateTime<Utc>)> {
    let (raw_timestamp, message) = raw
        .split_once(' ')
        .ok_or_else(|| Error::MalformedLine("missing timestamp separator".to_string()))?;

    let timestamp = parse_timestamp(raw_timestamp)?;
    Ok((message, timestamp))
}

/// Parse an RFC3339 / RFC3339Nano timestamp, normalised to UTC
pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| Error::MalformedLine(format!("parse timestamp {:?}: {}", raw, e)))
}

/// Render a timestamp the way log providers prefix lines (RFC3339Nano, `Z`)
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Nanos, true)
}
