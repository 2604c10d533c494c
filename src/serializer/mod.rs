//! Serializer capability: a named format that can turn a value into bytes
//! and back, plus the metadata persistence needs (extension, binary-ness).

mod binary;
mod json;

pub use binary::BinarySerializer;
pub use json::JsonSerializer;

use crate::error::CacheResult;

/// A pluggable (de)serialization format.
///
/// `serialize_value`/`deserialize_value` operate on `serde_json::Value` as a
/// universal intermediate representation, which is what makes the trait
/// object-safe without a generic method per concrete type. Whole-cache and
/// metrics snapshot persistence encodes its own concrete document types
/// directly (see `persistence.rs`) rather than routing through `Value`,
/// since not every registered format can round-trip `Value` itself (see
/// `BinarySerializer`'s docs).
pub trait Serializer: Send + Sync + std::fmt::Debug {
    /// The name this serializer is registered under.
    fn name(&self) -> &'static str;
    /// Filename suffix, without the leading dot.
    fn extension(&self) -> &'static str;
    /// Whether the payload is bytes (true) or UTF-8 text (false).
    fn is_binary(&self) -> bool;
    fn serialize_value(&self, value: &serde_json::Value) -> CacheResult<Vec<u8>>;
    fn deserialize_value(&self, bytes: &[u8]) -> CacheResult<serde_json::Value>;
}

/// Construct a built-in serializer by its registered name.
pub fn build_builtin(name: &str) -> Option<Box<dyn Serializer>> {
    match name {
        "json" => Some(Box::new(JsonSerializer)),
        "pickle" | "binary" => Some(Box::new(BinarySerializer)),
        _ => None,
    }
}
