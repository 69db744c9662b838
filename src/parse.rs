use chrono::NaiveDateTime;
use serde_json::Value;

const RAW_DATETIME_FORMAT: &str = "%m/%d/%Y %H:%M:%S";

/// Parses the datastore's `MM/DD/YYYY HH:MM:SS` timestamps.
pub fn parse_datetime(raw: &str) -> Option<NaiveDateTime> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    NaiveDateTime::parse_from_str(trimmed, RAW_DATETIME_FORMAT).ok()
}

/// Decodes the nested players document.
///
/// The datastore stores it as a JSON string, sometimes wrapped in an extra
/// pair of quotes with every inner quote doubled. Already-decoded values are
/// returned as they are. Empty strings and nulls yield `None`.
pub fn parse_players_payload(raw: &Value) -> Option<Value> {
    match raw {
        Value::Null => None,
        Value::String(s) => decode_players_str(s),
        other => Some(other.clone()),
    }
}

fn decode_players_str(raw: &str) -> Option<Value> {
    if raw.is_empty() {
        return None;
    }
    let unwrapped = raw
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .unwrap_or(raw);
    let collapsed = unwrapped.replace("\"\"", "\"");
    serde_json::from_str::<Value>(&collapsed)
        .or_else(|_| serde_json::from_str::<Value>(raw))
        .ok()
}
