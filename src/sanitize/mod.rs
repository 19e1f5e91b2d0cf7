//! Pure sanitization utilities applied on both sides of the trust boundary:
//! to input payloads before they are persisted and to documents read back
//! from the remote store.

use lazy_static::lazy_static;
use regex::Regex;
use serde_json::Value as JsonValue;

lazy_static! {
    static ref WHITESPACE_RUN: Regex = Regex::new(r"\s+").expect("static whitespace pattern");
    static ref PHONE_NOISE: Regex = Regex::new(r"[^\d+]").expect("static phone pattern");
}

/// Trims and collapses internal whitespace runs to single spaces.
pub fn sanitize_string(raw: &str) -> String {
    WHITESPACE_RUN.replace_all(raw.trim(), " ").into_owned()
}

/// Lowercases and strips all whitespace from an email address.
///
/// Shape validation belongs to the schema layer; this only normalizes.
pub fn sanitize_email(raw: &str) -> String {
    raw.chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_lowercase()
}

/// Keeps digits and a single leading `+`, dropping separators and noise.
pub fn sanitize_phone(raw: &str) -> String {
    let stripped = PHONE_NOISE.replace_all(raw.trim(), "").into_owned();
    match stripped.strip_prefix('+') {
        Some(rest) => format!("+{}", rest.replace('+', "")),
        None => stripped.replace('+', ""),
    }
}

/// Trims a URL and prepends `https://` when no scheme is present.
pub fn sanitize_url(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return String::new();
    }
    if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("https://{}", trimmed)
    }
}

/// Recursively sanitizes every string in a JSON tree.
pub fn sanitize_json_strings(value: &mut JsonValue) {
    match value {
        JsonValue::String(s) => {
            *s = sanitize_string(s);
        }
        JsonValue::Array(items) => {
            for item in items {
                sanitize_json_strings(item);
            }
        }
        JsonValue::Object(map) => {
            for (_, item) in map.iter_mut() {
                sanitize_json_strings(item);
            }
        }
        _ => {}
    }
}

/// Recursively removes null-valued entries from objects.
///
/// The remote store rejects writes carrying unset fields; an optional that
/// was never set must be absent from the payload, not null. Array elements
/// are left alone: a null inside an array is positional data.
pub fn remove_missing_values(value: &mut JsonValue) {
    match value {
        JsonValue::Object(map) => {
            map.retain(|_, entry| !entry.is_null());
            for (_, entry) in map.iter_mut() {
                remove_missing_values(entry);
            }
        }
        JsonValue::Array(items) => {
            for item in items {
                remove_missing_values(item);
            }
        }
        _ => {}
    }
}
