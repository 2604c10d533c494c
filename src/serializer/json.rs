//! Textual JSON serializer, restricted to JSON-representable values.

use super::Serializer;
use crate::error::{CacheError, CacheResult};

#[derive(Debug, Default)]
pub struct JsonSerializer;

impl Serializer for JsonSerializer {
    fn name(&self) -> &'static str {
        "json"
    }

    fn extension(&self) -> &'static str {
        "json"
    }

    fn is_binary(&self) -> bool {
        false
    }

    fn serialize_value(&self, value: &serde_json::Value) -> CacheResult<Vec<u8>> {
        serde_json::to_vec(value).map_err(|e| CacheError::Serialization(e.to_string()))
    }

    fn deserialize_value(&self, bytes: &[u8]) -> CacheResult<serde_json::Value> {
        serde_json::from_slice(bytes).map_err(|e| CacheError::Serialization(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn round_trips_json_value() {
        let serializer = JsonSerializer;
        let value = json!({"a": 1, "b": [true, null, "x"]});
        let bytes = serializer.serialize_value(&value).unwrap();
        let back = serializer.deserialize_value(&bytes).unwrap();
        assert_eq!(value, back);
    }

    #[test]
    fn declares_textual_json() {
        let serializer = JsonSerializer;
        assert_eq!(serializer.extension(), "json");
        assert!(!serializer.is_binary());
    }
}
