//! Field coercion shared by every reader of store documents.
//!
//! Documents written by different backend versions disagree on types:
//! timestamps arrive as native dates or strings, numbers sometimes as
//! strings. Everything that reads a raw field goes through here.

use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, TimeZone, Utc};
use rust_decimal::Decimal;
use serde_json::Value;

/// Ordered coalescing over alternative field names.
///
/// Returns the value of the first key in `keys` that is present and not
/// `null`. Precedence is the order of `keys`, so call sites name their
/// preferred field first.
pub fn first_present<'a>(doc: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|key| doc.get(*key))
        .find(|value| !value.is_null())
}

/// Read a decimal from a JSON number or numeric string.
pub fn decimal(value: &Value) -> Option<Decimal> {
    match value {
        Value::Number(n) => parse_decimal_text(&n.to_string()),
        Value::String(s) => parse_decimal_text(s.trim()),
        _ => None,
    }
}

fn parse_decimal_text(text: &str) -> Option<Decimal> {
    Decimal::from_str(text)
        .or_else(|_| Decimal::from_scientific(text))
        .ok()
}

/// Read a point in time from any of the shapes the store produces:
/// RFC 3339 / ISO strings, epoch milliseconds, or extended-JSON
/// `{"$date": ...}` wrappers around either.
pub fn timestamp(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => parse_time_str(s),
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .and_then(from_millis),
        Value::Object(map) => {
            if let Some(inner) = map.get("$date") {
                timestamp(inner)
            } else if let Some(Value::String(long)) = map.get("$numberLong") {
                long.parse::<i64>().ok().and_then(from_millis)
            } else {
                None
            }
        }
        _ => None,
    }
}

/// Parse a date string. Offsets are honoured; naive values are taken as UTC.
pub fn parse_time_str(raw: &str) -> Option<DateTime<Utc>> {
    let s = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

pub fn from_millis(ms: i64) -> Option<DateTime<Utc>> {
    Utc.timestamp_millis_opt(ms).single()
}

/// The string form used for every timestamp this service emits.
pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}
