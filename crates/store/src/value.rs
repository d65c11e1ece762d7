//! Attribute value model and JSON conversion helpers.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::StoreError;

/// The whole persisted profile: attribute name to value.
pub type AttributeMap = BTreeMap<String, AttributeValue>;

/// A storable attribute value.
///
/// This is the closed set of types the store accepts; anything outside
/// it (most notably JSON `null`, at any nesting depth) is unsupported.
/// Serialized untagged so the persisted form is plain JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    List(Vec<AttributeValue>),
    Map(BTreeMap<String, AttributeValue>),
}

impl AttributeValue {
    /// Validates and converts an inbound JSON value. `key` names the
    /// attribute being converted, for error messages only.
    pub fn from_json(key: &str, value: &serde_json::Value) -> Result<Self, StoreError> {
        let unsupported = |reason: &str| StoreError::UnsupportedValue {
            key: key.to_string(),
            reason: reason.to_string(),
        };
        match value {
            serde_json::Value::Null => Err(unsupported("null is not a storable value")),
            serde_json::Value::Bool(b) => Ok(AttributeValue::Bool(*b)),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Ok(AttributeValue::Int(i))
                } else if let Some(f) = n.as_f64() {
                    Ok(AttributeValue::Float(f))
                } else {
                    Err(unsupported("number does not fit a supported numeric type"))
                }
            }
            serde_json::Value::String(s) => Ok(AttributeValue::Text(s.clone())),
            serde_json::Value::Array(items) => {
                let converted: Result<Vec<_>, _> =
                    items.iter().map(|item| Self::from_json(key, item)).collect();
                Ok(AttributeValue::List(converted?))
            }
            serde_json::Value::Object(fields) => {
                let mut converted = BTreeMap::new();
                for (k, v) in fields {
                    converted.insert(k.clone(), Self::from_json(key, v)?);
                }
                Ok(AttributeValue::Map(converted))
            }
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        match self {
            AttributeValue::Bool(b) => serde_json::Value::Bool(*b),
            AttributeValue::Int(i) => serde_json::Value::from(*i),
            AttributeValue::Float(f) => serde_json::Value::from(*f),
            AttributeValue::Text(s) => serde_json::Value::String(s.clone()),
            AttributeValue::List(items) => {
                serde_json::Value::Array(items.iter().map(AttributeValue::to_json).collect())
            }
            AttributeValue::Map(fields) => {
                let mut map = serde_json::Map::new();
                for (k, v) in fields {
                    map.insert(k.clone(), v.to_json());
                }
                serde_json::Value::Object(map)
            }
        }
    }

    /// True for the empty-string value, which by contract means "delete
    /// the attribute" rather than "store an empty string".
    pub fn is_empty_text(&self) -> bool {
        matches!(self, AttributeValue::Text(s) if s.is_empty())
    }
}

/// Renders a whole attribute map as a JSON object.
pub fn map_to_json(map: &AttributeMap) -> serde_json::Value {
    let mut fields = serde_json::Map::new();
    for (k, v) in map {
        fields.insert(k.clone(), v.to_json());
    }
    serde_json::Value::Object(fields)
}

/// Decodes a JSON object into an attribute map, rejecting unsupported
/// values. Non-object input is rejected outright.
pub fn map_from_json(value: &serde_json::Value) -> Result<AttributeMap, StoreError> {
    let fields = value.as_object().ok_or_else(|| StoreError::UnsupportedValue {
        key: String::new(),
        reason: "expected a JSON object of attributes".to_string(),
    })?;
    let mut map = AttributeMap::new();
    for (k, v) in fields {
        map.insert(k.clone(), AttributeValue::from_json(k, v)?);
    }
    Ok(map)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_json_accepts_the_supported_scalars() {
        let cases = [
            (serde_json::json!(true), AttributeValue::Bool(true)),
            (serde_json::json!(3), AttributeValue::Int(3)),
            (serde_json::json!(2.1), AttributeValue::Float(2.1)),
            (
                serde_json::json!("value1"),
                AttributeValue::Text("value1".to_string()),
            ),
        ];
        for (json, expected) in cases {
            assert_eq!(AttributeValue::from_json("k", &json).unwrap(), expected);
        }
    }

    #[test]
    fn from_json_preserves_nested_shapes() {
        let json = serde_json::json!({"a1": "xx", "a2": [1, 2]});
        let value = AttributeValue::from_json("d", &json).unwrap();
        assert_eq!(value.to_json(), json);
    }

    #[test]
    fn from_json_rejects_null_at_any_depth() {
        assert!(AttributeValue::from_json("k", &serde_json::Value::Null).is_err());
        assert!(AttributeValue::from_json("k", &serde_json::json!([1, null])).is_err());
        assert!(AttributeValue::from_json("k", &serde_json::json!({"inner": null})).is_err());
    }

    #[test]
    fn untagged_serde_round_trips_as_plain_json() {
        let map: AttributeMap = serde_json::from_str(
            r#"{"a":"aaa","b":123,"c":[1,2],"d":{"a1":"xx","a2":"yy"}}"#,
        )
        .unwrap();
        assert_eq!(map["b"], AttributeValue::Int(123));
        let rendered = serde_json::to_value(&map).unwrap();
        assert_eq!(rendered, map_to_json(&map));
    }
}
