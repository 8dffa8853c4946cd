//! Semantic comparison of serialized field values.
//!
//! Two values are equivalent when they are structurally equal as JSON:
//! object key order is irrelevant and numbers compare by value, so `1`
//! and `1.0` are the same. `null` is treated as "no value".

use serde_json::Value;

/// Deep structural equality over JSON values.
pub fn json_equivalent(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => numbers_equal(x, y),
        (Value::Array(xs), Value::Array(ys)) => {
            xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| json_equivalent(x, y))
        }
        (Value::Object(xs), Value::Object(ys)) => {
            xs.len() == ys.len()
                && xs
                    .iter()
                    .all(|(key, x)| ys.get(key).is_some_and(|y| json_equivalent(x, y)))
        }
        _ => a == b,
    }
}

fn numbers_equal(x: &serde_json::Number, y: &serde_json::Number) -> bool {
    if let (Some(a), Some(b)) = (x.as_i64(), y.as_i64()) {
        return a == b;
    }
    if let (Some(a), Some(b)) = (x.as_u64(), y.as_u64()) {
        return a == b;
    }
    match (x.as_f64(), y.as_f64()) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

/// Drops `null`, which carries the same meaning as an absent value.
pub fn normalize(value: Option<Value>) -> Option<Value> {
    value.filter(|v| !v.is_null())
}

/// Whether a field moved from `old` to `new`.
pub fn has_changed(old: Option<&Value>, new: Option<&Value>) -> bool {
    let old = old.filter(|v| !v.is_null());
    let new = new.filter(|v| !v.is_null());
    match (old, new) {
        (None, None) => false,
        (Some(a), Some(b)) => !json_equivalent(a, b),
        _ => true,
    }
}
