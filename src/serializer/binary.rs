//! Binary "pickle"-equivalent serializer: a language-native binary format
//! (`bincode`) supporting arbitrary values, not just JSON-representable
//! ones.

use serde::{Deserialize, Serialize};

use super::Serializer;
use crate::error::{CacheError, CacheResult};

/// `bincode` cannot deserialize directly into `serde_json::Value`: `Value`'s
/// `Deserialize` impl calls `deserialize_any`, which non-self-describing
/// formats like bincode don't support. `BinValue` mirrors `Value`'s shape
/// with an ordinary derived enum (which deserializes via `deserialize_enum`,
/// which bincode handles fine), so the value-level round-trip contract
/// still holds for this serializer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
enum BinValue {
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    Array(Vec<BinValue>),
    Object(Vec<(String, BinValue)>),
}

impl From<&serde_json::Value> for BinValue {
    fn from(value: &serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => BinValue::Null,
            serde_json::Value::Bool(b) => BinValue::Bool(*b),
            serde_json::Value::Number(n) => BinValue::Number(n.as_f64().unwrap_or(0.0)),
            serde_json::Value::String(s) => BinValue::String(s.clone()),
            serde_json::Value::Array(items) => {
                BinValue::Array(items.iter().map(BinValue::from).collect())
            }
            serde_json::Value::Object(map) => BinValue::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), BinValue::from(v)))
                    .collect(),
            ),
        }
    }
}

impl From<BinValue> for serde_json::Value {
    fn from(value: BinValue) -> Self {
        match value {
            BinValue::Null => serde_json::Value::Null,
            BinValue::Bool(b) => serde_json::Value::Bool(b),
            BinValue::Number(n) => serde_json::json!(n),
            BinValue::String(s) => serde_json::Value::String(s),
            BinValue::Array(items) => {
                serde_json::Value::Array(items.into_iter().map(Into::into).collect())
            }
            BinValue::Object(entries) => serde_json::Value::Object(
                entries.into_iter().map(|(k, v)| (k, v.into())).collect(),
            ),
        }
    }
}

#[derive(Debug, Default)]
pub struct BinarySerializer;

impl Serializer for BinarySerializer {
    fn name(&self) -> &'static str {
        "pickle"
    }

    fn extension(&self) -> &'static str {
        "bin"
    }

    fn is_binary(&self) -> bool {
        true
    }

    fn serialize_value(&self, value: &serde_json::Value) -> CacheResult<Vec<u8>> {
        let mirrored = BinValue::from(value);
        bincode::serialize(&mirrored).map_err(|e| CacheError::Serialization(e.to_string()))
    }

    fn deserialize_value(&self, bytes: &[u8]) -> CacheResult<serde_json::Value> {
        let mirrored: BinValue =
            bincode::deserialize(bytes).map_err(|e| CacheError::Serialization(e.to_string()))?;
        Ok(mirrored.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn round_trips_arbitrary_value() {
        let serializer = BinarySerializer;
        let value = json!({"a": 1, "b": [true, null, "x"], "c": {"nested": 2.5}});
        let bytes = serializer.serialize_value(&value).unwrap();
        let back = serializer.deserialize_value(&bytes).unwrap();
        assert_eq!(value, back);
    }

    #[test]
    fn declares_binary_pickle() {
        let serializer = BinarySerializer;
        assert_eq!(serializer.extension(), "bin");
        assert!(serializer.is_binary());
    }
}
