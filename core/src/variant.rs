//! Generic key-value record used for building save/load.

use serde_json::{Map, Value};

/// A flat save record. Keys are camelCase to stay compatible with
/// existing save files.
pub type VariantMap = Map<String, Value>;

pub fn get_i64(stream: &VariantMap, key: &str) -> Option<i64> {
    stream.get(key).and_then(Value::as_i64)
}

pub fn get_u32(stream: &VariantMap, key: &str) -> Option<u32> {
    get_i64(stream, key).map(|v| v.clamp(0, u32::MAX as i64) as u32)
}

pub fn get_f64(stream: &VariantMap, key: &str) -> Option<f64> {
    stream.get(key).and_then(Value::as_f64)
}

pub fn get_bool(stream: &VariantMap, key: &str) -> Option<bool> {
    stream.get(key).and_then(Value::as_bool)
}

pub fn get_str<'a>(stream: &'a VariantMap, key: &str) -> Option<&'a str> {
    stream.get(key).and_then(Value::as_str)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn typed_getters_ignore_mismatched_values() {
        let mut stream = VariantMap::new();
        stream.insert("count".into(), json!(12));
        stream.insert("negative".into(), json!(-4));
        stream.insert("flag".into(), json!("yes"));

        assert_eq!(get_u32(&stream, "count"), Some(12));
        assert_eq!(get_u32(&stream, "negative"), Some(0));
        assert_eq!(get_bool(&stream, "flag"), None);
        assert_eq!(get_str(&stream, "flag"), Some("yes"));
        assert_eq!(get_i64(&stream, "missing"), None);
    }
}
