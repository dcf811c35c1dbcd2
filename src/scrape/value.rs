//! Optional-navigation helpers for loosely-typed JSON documents.
//!
//! Embedded page data is an untyped tree whose shape changes without
//! notice, so every step returns an `Option` instead of failing. Callers
//! compose these into a fixed traversal path and never trust the structure
//! beyond one failed step.

use serde_json::Value;

/// Child value under `key`, only if it is a JSON object.
pub fn get_map<'a>(value: &'a Value, key: &str) -> Option<&'a Value> {
    value.get(key).filter(|v| v.is_object())
}

/// Child array under `key`.
pub fn get_list<'a>(value: &'a Value, key: &str) -> Option<&'a [Value]> {
    value.get(key)?.as_array().map(Vec::as_slice)
}

/// Child string under `key`.
pub fn get_str<'a>(value: &'a Value, key: &str) -> Option<&'a str> {
    value.get(key)?.as_str()
}

/// Child boolean under `key`.
pub fn get_bool(value: &Value, key: &str) -> Option<bool> {
    value.get(key)?.as_bool()
}

/// Child integer under `key`. Sources emit counts and epoch seconds as
/// plain numbers; a float is truncated rather than rejected.
pub fn get_i64(value: &Value, key: &str) -> Option<i64> {
    let v = value.get(key)?;
    v.as_i64().or_else(|| v.as_f64().map(|f| f as i64))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_get_map_rejects_non_object() {
        let v = json!({"a": {"b": 1}, "c": "str"});
        assert!(get_map(&v, "a").is_some());
        assert!(get_map(&v, "c").is_none());
        assert!(get_map(&v, "missing").is_none());
    }

    #[test]
    fn test_get_list() {
        let v = json!({"edges": [1, 2, 3], "not": "a list"});
        assert_eq!(get_list(&v, "edges").unwrap().len(), 3);
        assert!(get_list(&v, "not").is_none());
    }

    #[test]
    fn test_get_i64_accepts_float() {
        let v = json!({"count": 42.0, "exact": 7});
        assert_eq!(get_i64(&v, "count"), Some(42));
        assert_eq!(get_i64(&v, "exact"), Some(7));
        assert_eq!(get_i64(&v, "missing"), None);
    }

    #[test]
    fn test_get_str_rejects_number() {
        let v = json!({"id": 123});
        assert!(get_str(&v, "id").is_none());
    }
}
