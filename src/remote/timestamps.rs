//! Normalization of the store's native timestamp shapes.
//!
//! The remote store surfaces timestamps either as `{seconds, nanos}` maps
//! or as epoch-millisecond integers on `*_at` keys, depending on SDK
//! version and write path. Every defensive parse runs this pass first so
//! the schema layer only ever sees RFC3339 strings.

use chrono::DateTime;
use serde_json::Value as JsonValue;

/// Recursively rewrites timestamp shapes into RFC3339 strings, in place.
///
/// Values that do not match a known shape are left untouched; a timestamp
/// this pass cannot decode will be caught by schema validation instead.
pub fn normalize_timestamps(value: &mut JsonValue) {
    match value {
        JsonValue::Object(map) => {
            if let Some(rendered) = seconds_nanos_to_rfc3339(map) {
                *value = JsonValue::String(rendered);
                return;
            }
            for (key, entry) in map.iter_mut() {
                if key.ends_with("_at") {
                    if let Some(millis) = entry.as_i64() {
                        if let Some(rendered) = epoch_millis_to_rfc3339(millis) {
                            *entry = JsonValue::String(rendered);
                            continue;
                        }
                    }
                }
                normalize_timestamps(entry);
            }
        }
        JsonValue::Array(items) => {
            for item in items {
                normalize_timestamps(item);
            }
        }
        _ => {}
    }
}

fn seconds_nanos_to_rfc3339(map: &serde_json::Map<String, JsonValue>) -> Option<String> {
    if map.len() != 2 {
        return None;
    }
    let seconds = map.get("seconds")?.as_i64()?;
    let nanos = map.get("nanos")?.as_i64()?;
    let nanos = u32::try_from(nanos).ok()?;
    let stamp = DateTime::from_timestamp(seconds, nanos)?;
    Some(stamp.to_rfc3339())
}

fn epoch_millis_to_rfc3339(millis: i64) -> Option<String> {
    DateTime::from_timestamp_millis(millis).map(|stamp| stamp.to_rfc3339())
}
