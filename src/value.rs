//! The loose-emptiness policy `remember` applies to cached values.

pub use serde_json::Value;

/// Whether a cached value counts as "empty" and therefore as a miss.
///
/// [`remember`](crate::ReadThroughCache::remember) recomputes whenever the
/// cached value is empty, not only when the entry is absent. Empty means,
/// variant by variant:
///
/// - `Null`
/// - `Bool(false)`
/// - any `Number` equal to zero (`0`, `0.0`, `-0.0`)
/// - `String("")`
/// - `Array([])`
/// - `Object({})`
///
/// Consequence: storing any of these values is indistinguishable from a miss
/// on the next `remember` call, so they are recomputed every time. Callers
/// rely on this; do not tighten the predicate without auditing them.
pub fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !*b,
        Value::Number(n) => n.as_f64().map(|f| f == 0.0).unwrap_or(false),
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
    }
}

/// Whether a produced value is the "do not cache this" sentinel.
///
/// A producer may return `Bool(false)` to hand the caller a usable result
/// while keeping it out of the backend. The sentinel is exactly
/// `Bool(false)`: other empty values are stored as usual (and then
/// recomputed on the next call per [`is_empty_value`]).
pub fn is_non_cacheable(value: &Value) -> bool {
    matches!(value, Value::Bool(false))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn empty_values() {
        for value in [
            Value::Null,
            json!(false),
            json!(0),
            json!(0.0),
            json!(-0.0),
            json!(""),
            json!([]),
            json!({}),
        ] {
            assert!(is_empty_value(&value), "expected {} to be empty", value);
        }
    }

    #[test]
    fn non_empty_values() {
        for value in [
            json!(true),
            json!(1),
            json!(-1),
            json!(0.5),
            json!(u64::MAX),
            json!("0"),
            json!(" "),
            json!([0]),
            json!([[]]),
            json!({ "count": 0 }),
        ] {
            assert!(!is_empty_value(&value), "expected {} to be non-empty", value);
        }
    }

    #[test]
    fn only_false_is_non_cacheable() {
        assert!(is_non_cacheable(&json!(false)));
        for value in [Value::Null, json!(true), json!(0), json!(""), json!([])] {
            assert!(!is_non_cacheable(&value), "{} is cacheable", value);
        }
    }
}
