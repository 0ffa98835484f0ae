//! Data Converter
//!
//! Converts between typed models and the generic [`Mapping`] shape by going
//! through an intermediate JSON byte buffer.
//!
//! - [`encode`] is best-effort: any failure yields an empty mapping.
//! - [`try_encode`] is the strict variant used by the facades by default.
//! - [`decode`] and [`decode_mapping`] are strict and report
//!   [`StoreError::ParseError`].

use crate::models::Mapping;
use crate::services::{StoreError, StoreResult};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

/// Encode a model into a mapping, failing with `ParseError`.
///
/// Fails when serialization fails or the model does not serialize to an
/// object (e.g. a bare string or sequence).
pub fn try_encode<T: Serialize + ?Sized>(model: &T) -> StoreResult<Mapping> {
    let bytes = serde_json::to_vec(model).map_err(|e| {
        tracing::debug!("Model serialization failed: {}", e);
        StoreError::ParseError
    })?;

    match serde_json::from_slice::<Value>(&bytes) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => {
            tracing::debug!("Model encoded to non-object JSON: {}", json_kind(&other));
            Err(StoreError::ParseError)
        }
        Err(e) => {
            tracing::debug!("Encoded model could not be re-read: {}", e);
            Err(StoreError::ParseError)
        }
    }
}

/// Encode a model into a mapping, returning an empty mapping on failure.
pub fn encode<T: Serialize + ?Sized>(model: &T) -> Mapping {
    try_encode(model).unwrap_or_else(|_| {
        tracing::warn!(
            "Encoding {} failed; substituting an empty mapping",
            std::any::type_name::<T>()
        );
        Mapping::new()
    })
}

/// Decode an arbitrary JSON value into `T`.
pub fn decode<T: DeserializeOwned>(value: &Value) -> StoreResult<T> {
    let bytes = serde_json::to_vec(value).map_err(|e| {
        tracing::debug!("Value serialization failed: {}", e);
        StoreError::ParseError
    })?;

    serde_json::from_slice(&bytes).map_err(|e| {
        tracing::debug!("Decoding {} failed: {}", std::any::type_name::<T>(), e);
        StoreError::ParseError
    })
}

/// Decode a mapping into `T`.
pub fn decode_mapping<T: DeserializeOwned>(mapping: Mapping) -> StoreResult<T> {
    decode(&Value::Object(mapping))
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};
    use serde_json::json;
    use std::collections::HashMap;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Profile {
        id: String,
        name: String,
        age: u32,
        tags: Vec<String>,
        address: Option<Address>,
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Address {
        city: String,
        zip: String,
    }

    fn sample() -> Profile {
        Profile {
            id: "p1".to_string(),
            name: "Alice".to_string(),
            age: 30,
            tags: vec!["admin".to_string()],
            address: Some(Address {
                city: "Oslo".to_string(),
                zip: "0150".to_string(),
            }),
        }
    }

    #[test]
    fn test_encode_produces_nested_mapping() {
        let map = encode(&sample());
        assert_eq!(map.get("name"), Some(&json!("Alice")));
        assert_eq!(map.get("age"), Some(&json!(30)));
        assert_eq!(map["address"]["city"], json!("Oslo"));
        assert_eq!(map["tags"], json!(["admin"]));
    }

    #[test]
    fn test_encode_decode_round_trip() {
        let original = sample();
        let decoded: Profile = decode_mapping(encode(&original)).unwrap();
        assert_eq!(decoded, original);
    }

    #[test]
    fn test_encode_non_object_is_empty_mapping() {
        assert!(encode(&"just a string").is_empty());
        assert!(encode(&vec![1, 2, 3]).is_empty());
    }

    #[test]
    fn test_try_encode_non_object_is_parse_error() {
        assert_eq!(try_encode(&42u8), Err(StoreError::ParseError));
    }

    #[test]
    fn test_encode_non_string_keys_fails() {
        let mut map: HashMap<(u8, u8), u8> = HashMap::new();
        map.insert((1, 2), 3);
        assert_eq!(try_encode(&map), Err(StoreError::ParseError));
        assert!(encode(&map).is_empty());
    }

    #[test]
    fn test_decode_missing_field_is_parse_error() {
        let value = json!({ "id": "p1", "name": "Alice" });
        let result: StoreResult<Profile> = decode(&value);
        assert_eq!(result, Err(StoreError::ParseError));
    }

    #[test]
    fn test_decode_type_mismatch_is_parse_error() {
        let value = json!({
            "id": "p1",
            "name": "Alice",
            "age": "thirty",
            "tags": [],
            "address": null
        });
        let result: StoreResult<Profile> = decode(&value);
        assert_eq!(result, Err(StoreError::ParseError));
    }

    #[test]
    fn test_decode_scalar_values() {
        let flag: bool = decode(&json!(true)).unwrap();
        assert!(flag);
        let count: i64 = decode(&json!(7)).unwrap();
        assert_eq!(count, 7);
    }
}
