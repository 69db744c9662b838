use serde_json::Value;

pub const DEFAULT_TURNS: i64 = 0;
pub const DEFAULT_ACTIONS: i64 = 0;
pub const DEFAULT_COUNT: i64 = 1;

/// Integer-like field: native numbers are taken as-is, strings only when
/// they are made entirely of ASCII digits. Anything else yields `default`.
pub fn int_or(value: Option<&Value>, default: i64) -> i64 {
    match value {
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f as i64))
            .unwrap_or(default),
        Some(Value::String(s)) => parse_digits(s).unwrap_or(default),
        _ => default,
    }
}

/// Card counts are at least one.
pub fn count_or_default(value: Option<&Value>) -> u32 {
    let count = int_or(value, DEFAULT_COUNT);
    u32::try_from(count)
        .ok()
        .filter(|c| *c >= 1)
        .unwrap_or(DEFAULT_COUNT as u32)
}

/// Boolean-like field: native booleans as-is, strings true iff they read
/// "true" in any case.
pub fn bool_or_false(value: Option<&Value>) -> bool {
    match value {
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => s.eq_ignore_ascii_case("true"),
        _ => false,
    }
}

/// String-like field. Numbers and booleans keep their textual form, null and
/// missing fall back to `default`.
pub fn text_or(value: Option<&Value>, default: &str) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => default.to_string(),
    }
}

fn parse_digits(raw: &str) -> Option<i64> {
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    raw.parse::<i64>().ok()
}
