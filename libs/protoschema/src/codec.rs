//! Per-field conversion between wire values and host values.
//!
//! One `match` per direction over [`FieldKind`]. Message-kind fields
//! delegate to the nested [`TypeAdapter`] supplied by the caller.

use std::borrow::Cow;
use std::fmt;

use prost_reflect::{EnumDescriptor, Kind, MessageDescriptor, Value as WireValue};

use crate::adapter::TypeAdapter;
use crate::error::{Result, SchemaError};
use crate::value::Value;

/// Closed set of field kinds, collapsed from the wire types.
///
/// Wire types that differ only in encoding (`sint32`, `sfixed32`, ...)
/// map to the same kind as their plain counterpart.
#[derive(Debug, Clone)]
pub enum FieldKind {
    Int32,
    Int64,
    UInt32,
    UInt64,
    Float,
    Double,
    Bool,
    String,
    Bytes,
    Enum(EnumDescriptor),
    Message(MessageDescriptor),
}

impl FieldKind {
    pub fn of(kind: Kind) -> Self {
        match kind {
            Kind::Int32 | Kind::Sint32 | Kind::Sfixed32 => FieldKind::Int32,
            Kind::Int64 | Kind::Sint64 | Kind::Sfixed64 => FieldKind::Int64,
            Kind::Uint32 | Kind::Fixed32 => FieldKind::UInt32,
            Kind::Uint64 | Kind::Fixed64 => FieldKind::UInt64,
            Kind::Float => FieldKind::Float,
            Kind::Double => FieldKind::Double,
            Kind::Bool => FieldKind::Bool,
            Kind::String => FieldKind::String,
            Kind::Bytes => FieldKind::Bytes,
            Kind::Enum(e) => FieldKind::Enum(e),
            Kind::Message(m) => FieldKind::Message(m),
        }
    }

    pub fn message_type(&self) -> Option<&MessageDescriptor> {
        match self {
            FieldKind::Message(m) => Some(m),
            _ => None,
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldKind::Int32 => write!(f, "int32"),
            FieldKind::Int64 => write!(f, "int64"),
            FieldKind::UInt32 => write!(f, "uint32"),
            FieldKind::UInt64 => write!(f, "uint64"),
            FieldKind::Float => write!(f, "float"),
            FieldKind::Double => write!(f, "double"),
            FieldKind::Bool => write!(f, "bool"),
            FieldKind::String => write!(f, "string"),
            FieldKind::Bytes => write!(f, "bytes"),
            FieldKind::Enum(e) => write!(f, "enum:{}", e.full_name()),
            FieldKind::Message(m) => write!(f, "message:{}", m.full_name()),
        }
    }
}

// ═══════════════════════════════════════════════════════════════
//  Wire → host
// ═══════════════════════════════════════════════════════════════

/// Convert one wire value (a singular field, or one list element).
///
/// Callers drop undeclared enum numbers first (see
/// [`undeclared_enum_number`]); reaching one here is an error.
pub(crate) fn decode(
    kind: &FieldKind,
    raw: &WireValue,
    nested: Option<&TypeAdapter>,
) -> Result<Value> {
    let value = match (kind, raw) {
        (FieldKind::Message(desc), WireValue::Message(message)) => {
            let record = with_nested(desc, nested, |adapter| adapter.decode_message(message))?;
            Value::Record(record)
        }
        (FieldKind::Bytes, WireValue::Bytes(b)) => Value::Bytes(b.to_vec()),
        (FieldKind::String, WireValue::String(s)) => Value::String(s.clone()),
        (FieldKind::Int32, WireValue::I32(v)) => Value::Int32(*v),
        (FieldKind::Int64, WireValue::I64(v)) => Value::Int64(*v),
        (FieldKind::UInt32, WireValue::U32(v)) => Value::UInt32(*v),
        (FieldKind::UInt64, WireValue::U64(v)) => Value::UInt64(*v),
        (FieldKind::Float, WireValue::F32(v)) => Value::Float(*v),
        (FieldKind::Double, WireValue::F64(v)) => Value::Double(*v),
        (FieldKind::Bool, WireValue::Bool(v)) => Value::Bool(*v),
        (FieldKind::Enum(desc), WireValue::EnumNumber(n)) => match desc.get_value(*n) {
            Some(v) => Value::String(v.name().to_owned()),
            None => return Err(SchemaError::unknown_enum(desc.full_name(), n)),
        },
        (kind, raw) => {
            return Err(SchemaError::MalformedMessage {
                type_name: kind.to_string(),
                reason: format!("wire value {raw:?} does not match field kind"),
            });
        }
    };
    Ok(value)
}

/// The number of an enum wire value that names no declared value.
pub(crate) fn undeclared_enum_number(kind: &FieldKind, raw: &WireValue) -> Option<i32> {
    match (kind, raw) {
        (FieldKind::Enum(desc), WireValue::EnumNumber(n)) if desc.get_value(*n).is_none() => Some(*n),
        _ => None,
    }
}

// ═══════════════════════════════════════════════════════════════
//  Host → wire
// ═══════════════════════════════════════════════════════════════

/// Convert one host value (a singular field, or one list element).
///
/// Scalars are coerced; only messages and enums can fail.
pub(crate) fn encode(
    kind: &FieldKind,
    value: &Value,
    nested: Option<&TypeAdapter>,
) -> Result<WireValue> {
    let wire = match kind {
        FieldKind::Message(desc) => {
            let record = value.as_record().ok_or_else(SchemaError::not_an_object)?;
            let message = with_nested(desc, nested, |adapter| adapter.encode_message(record))?;
            WireValue::Message(message)
        }
        FieldKind::Bytes => WireValue::Bytes(to_bytes(value).into()),
        FieldKind::String => WireValue::String(to_text(value)),
        FieldKind::Int32 => WireValue::I32(to_i64(value) as i32),
        FieldKind::Int64 => WireValue::I64(to_i64(value)),
        FieldKind::UInt32 => WireValue::U32(to_i64(value) as u32),
        FieldKind::UInt64 => WireValue::U64(to_u64(value)),
        FieldKind::Float => WireValue::F32(to_f64(value) as f32),
        FieldKind::Double => WireValue::F64(to_f64(value)),
        FieldKind::Bool => WireValue::Bool(truthy(value)),
        FieldKind::Enum(desc) => WireValue::EnumNumber(enum_number(desc, value)?),
    };
    Ok(wire)
}

fn with_nested<T>(
    desc: &MessageDescriptor,
    nested: Option<&TypeAdapter>,
    f: impl FnOnce(&TypeAdapter) -> Result<T>,
) -> Result<T> {
    match nested {
        Some(adapter) => f(adapter),
        None => f(&TypeAdapter::detached(desc.clone())),
    }
}

fn enum_number(desc: &EnumDescriptor, value: &Value) -> Result<i32> {
    let found = match value {
        Value::String(name) => desc.get_value_by_name(name),
        v if v.is_number() => desc.get_value(to_i64(v) as i32),
        _ => None,
    };
    found
        .map(|v| v.number())
        .ok_or_else(|| SchemaError::unknown_enum(desc.full_name(), value))
}

// ---------------------------------------------------------------------------
// Coercions
// ---------------------------------------------------------------------------

fn float_to_i64(f: f64) -> i64 {
    if f.is_finite() { f.trunc() as i64 } else { 0 }
}

pub(crate) fn to_i64(value: &Value) -> i64 {
    match value {
        Value::Int32(v) => i64::from(*v),
        Value::Int64(v) => *v,
        Value::UInt32(v) => i64::from(*v),
        Value::UInt64(v) => *v as i64,
        Value::Float(v) => float_to_i64(f64::from(*v)),
        Value::Double(v) => float_to_i64(*v),
        Value::Bool(b) => i64::from(*b),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().map(float_to_i64))
                .unwrap_or(0)
        }
        Value::Null | Value::Bytes(_) | Value::List(_) | Value::Record(_) => 0,
    }
}

fn to_u64(value: &Value) -> u64 {
    match value {
        Value::UInt64(v) => *v,
        Value::String(s) => match s.trim().parse::<u64>() {
            Ok(v) => v,
            Err(_) => to_i64(value) as u64,
        },
        other => to_i64(other) as u64,
    }
}

pub(crate) fn to_f64(value: &Value) -> f64 {
    match value {
        Value::Int32(v) => f64::from(*v),
        Value::Int64(v) => *v as f64,
        Value::UInt32(v) => f64::from(*v),
        Value::UInt64(v) => *v as f64,
        Value::Float(v) => f64::from(*v),
        Value::Double(v) => *v,
        Value::Bool(b) => f64::from(u8::from(*b)),
        Value::String(s) => {
            let s = s.trim();
            if s.is_empty() {
                0.0
            } else {
                s.parse::<f64>().unwrap_or(f64::NAN)
            }
        }
        Value::Null => 0.0,
        Value::Bytes(_) | Value::List(_) | Value::Record(_) => f64::NAN,
    }
}

pub(crate) fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Int32(v) => *v != 0,
        Value::Int64(v) => *v != 0,
        Value::UInt32(v) => *v != 0,
        Value::UInt64(v) => *v != 0,
        Value::Float(v) => *v != 0.0 && !v.is_nan(),
        Value::Double(v) => *v != 0.0 && !v.is_nan(),
        Value::String(s) => !s.is_empty(),
        Value::Bytes(_) | Value::List(_) | Value::Record(_) => true,
    }
}

pub(crate) fn to_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Bytes(b) => match String::from_utf8_lossy(b) {
            Cow::Borrowed(text) => text.to_owned(),
            Cow::Owned(text) => {
                tracing::debug!(len = b.len(), "invalid UTF-8 in text field input replaced with U+FFFD");
                text
            }
        },
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn to_bytes(value: &Value) -> Vec<u8> {
    match value {
        Value::Bytes(b) => b.clone(),
        other => to_text(other).into_bytes(),
    }
}
