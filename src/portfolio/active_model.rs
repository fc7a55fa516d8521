use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use super::fields;
use crate::models::NO_MODEL;

/// Switch history as stored on the user: time key -> model name.
pub type ActiveModelHistory = BTreeMap<String, String>;

/// Interpret a history key as a point in time.
///
/// Keys that parse entirely as an integer are Unix milliseconds; anything
/// else is a legacy date string.
pub fn key_time(key: &str) -> Option<DateTime<Utc>> {
    match key.trim().parse::<i64>() {
        Ok(ms) => fields::from_millis(ms),
        Err(_) => fields::parse_time_str(key),
    }
}

/// The most recent history entry, by absolute time.
///
/// Unparseable keys rank oldest; equal instants fall back to the key text so
/// the result never depends on map iteration order.
pub fn latest_entry(history: &ActiveModelHistory) -> Option<(&str, &str)> {
    history
        .iter()
        .max_by(|(a, _), (b, _)| key_time(a).cmp(&key_time(b)).then_with(|| a.cmp(b)))
        .map(|(k, v)| (k.as_str(), v.as_str()))
}

/// The model currently selected, or `None` when nothing is selected.
pub fn resolve_current_model(history: &ActiveModelHistory) -> Option<String> {
    latest_entry(history)
        .map(|(_, model)| model)
        .filter(|model| *model != NO_MODEL)
        .map(str::to_string)
}

/// Key for a new history entry written at `now`.
///
/// Always strictly later than every existing entry, so appending never
/// replaces an earlier switch even when two land in the same millisecond.
pub fn next_history_key(history: &ActiveModelHistory, now: DateTime<Utc>) -> String {
    let newest = history
        .keys()
        .filter_map(|k| key_time(k))
        .map(|t| t.timestamp_millis())
        .max();

    let mut ms = now.timestamp_millis();
    if let Some(newest) = newest {
        ms = ms.max(newest + 1);
    }
    ms.to_string()
}
