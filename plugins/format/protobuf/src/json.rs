//! Bridge between `serde_json::Value` and the record model.
//!
//! JSON has no byte type: bytes fields travel as standard base64
//! strings in both directions.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use protoschema::{FieldKind, Record, SchemaRegistry, TypeAdapter, Value};

use crate::error::CodecError;

/// Untyped conversion. Integers become `Int64`/`UInt64`, other numbers
/// `Double`.
pub fn from_json(json: &serde_json::Value) -> Value {
    match json {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(b) => Value::Bool(*b),
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::Int64(i)
            } else if let Some(u) = n.as_u64() {
                Value::UInt64(u)
            } else {
                Value::Double(n.as_f64().unwrap_or(f64::NAN))
            }
        }
        serde_json::Value::String(s) => Value::String(s.clone()),
        serde_json::Value::Array(items) => Value::List(items.iter().map(from_json).collect()),
        serde_json::Value::Object(map) => Value::Record(
            map.iter().map(|(k, v)| (k.as_str(), from_json(v))).collect(),
        ),
    }
}

/// Conversion guided by a message type: strings in bytes fields are
/// base64-decoded, nested objects follow their own message type.
/// Keys that name no field are converted untyped (encode ignores them).
pub fn from_json_typed(
    registry: &SchemaRegistry,
    adapter: &TypeAdapter,
    json: &serde_json::Value,
) -> Result<Value, CodecError> {
    let serde_json::Value::Object(map) = json else {
        return Ok(from_json(json));
    };

    let mut record = Record::with_capacity(map.len());
    for (key, value) in map {
        let converted = match adapter.field(key) {
            Some(field) if field.is_repeated() && !field.is_map() => match value {
                serde_json::Value::Array(items) => Value::List(
                    items
                        .iter()
                        .enumerate()
                        .map(|(i, item)| {
                            element(registry, field.kind(), item)
                                .map_err(|e| e.with_context(format!("{key}[{i}]")))
                        })
                        .collect::<Result<_, _>>()?,
                ),
                other => from_json(other),
            },
            Some(field) => element(registry, field.kind(), value).map_err(|e| e.with_context(key))?,
            None => from_json(value),
        };
        record.insert(key.as_str(), converted);
    }
    Ok(Value::Record(record))
}

fn element(
    registry: &SchemaRegistry,
    kind: &FieldKind,
    json: &serde_json::Value,
) -> Result<Value, CodecError> {
    match (kind, json) {
        (FieldKind::Bytes, serde_json::Value::String(s)) => {
            STANDARD
                .decode(s)
                .map(Value::Bytes)
                .map_err(|e| CodecError::Base64 {
                    field: String::new(),
                    reason: e.to_string(),
                })
        }
        (FieldKind::Message(desc), serde_json::Value::Object(_)) => {
            let nested = registry.adapter_for(desc);
            from_json_typed(registry, &nested, json)
        }
        // map fields arrive as an array of {key, value} entry objects
        (FieldKind::Message(desc), serde_json::Value::Array(items)) => {
            let nested = registry.adapter_for(desc);
            let entries = items
                .iter()
                .map(|item| from_json_typed(registry, &nested, item))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Value::List(entries))
        }
        _ => Ok(from_json(json)),
    }
}

/// Record → JSON. Bytes become base64 strings; non-finite floats
/// become `null`.
pub fn to_json(value: &Value) -> serde_json::Value {
    match value {
        Value::Null => serde_json::Value::Null,
        Value::Bool(b) => serde_json::Value::Bool(*b),
        Value::Int32(v) => serde_json::json!(v),
        Value::Int64(v) => serde_json::json!(v),
        Value::UInt32(v) => serde_json::json!(v),
        Value::UInt64(v) => serde_json::json!(v),
        Value::Float(v) => float(f64::from(*v)),
        Value::Double(v) => float(*v),
        Value::String(s) => serde_json::Value::String(s.clone()),
        Value::Bytes(b) => serde_json::Value::String(STANDARD.encode(b)),
        Value::List(items) => serde_json::Value::Array(items.iter().map(to_json).collect()),
        Value::Record(record) => serde_json::Value::Object(
            record.iter().map(|(k, v)| (k.to_owned(), to_json(v))).collect(),
        ),
    }
}

fn float(v: f64) -> serde_json::Value {
    serde_json::Number::from_f64(v)
        .map(serde_json::Value::Number)
        .unwrap_or(serde_json::Value::Null)
}
