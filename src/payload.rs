//! Helpers for the loosely typed `arg0`/`arg1` values host commands receive.
//!
//! Hosts call commands either positionally (`connect("S123")`) or with an
//! object (`connect({ serialNumber: "S123" })`); both shapes are accepted.

use serde_json::Value;

/// First non-empty trimmed string found under any of `keys`.
pub(crate) fn value_str(v: &Value, keys: &[&str]) -> Option<String> {
    for key in keys {
        if let Some(s) = v.get(*key).and_then(|x| x.as_str()) {
            let trimmed = s.trim();
            if !trimmed.is_empty() {
                return Some(trimmed.to_string());
            }
        }
    }
    None
}

/// `arg0` as a string, either directly or looked up in an object payload.
pub(crate) fn payload_arg0_as_string(arg0: Option<Value>, keys: &[&str]) -> Option<String> {
    match arg0 {
        Some(Value::String(s)) => {
            let t = s.trim();
            if t.is_empty() {
                None
            } else {
                Some(t.to_string())
            }
        }
        Some(Value::Object(obj)) => value_str(&Value::Object(obj), keys),
        _ => None,
    }
}

/// Integer from an integral number or a numeric string. Fractional values
/// are rejected rather than truncated.
pub(crate) fn value_to_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.is_finite() && f.fract() == 0.0)
                .filter(|f| *f >= i64::MIN as f64 && *f <= i64::MAX as f64)
                .map(|f| f as i64)
        }),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

/// First non-null value found under any of `keys`.
pub(crate) fn field<'a>(v: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|key| v.get(*key))
        .find(|value| !value.is_null())
}
