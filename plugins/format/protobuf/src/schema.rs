use std::fmt;
use std::sync::Arc;

use protoschema::{Record, Result, SchemaError, SchemaRegistry, TypeAdapter, Value};

/// Host-facing schema object.
///
/// Constructed with no argument it exposes the compiled-in types; with
/// a byte buffer it parses a serialized `FileDescriptorSet`.
#[derive(Debug, Clone)]
pub struct Schema {
    registry: SchemaRegistry,
}

impl Schema {
    /// Construct from an optional host argument.
    ///
    /// `None` → compiled-in registry; `Some(Value::Bytes)` → parsed
    /// descriptor set; any other value → `ArgumentType`.
    pub fn new(arg: Option<&Value>) -> Result<Self> {
        match arg {
            None => Ok(Self::builtin()),
            Some(Value::Bytes(blob)) => Self::from_bytes(blob),
            Some(_) => Err(SchemaError::argument_type()),
        }
    }

    pub fn builtin() -> Self {
        Self {
            registry: SchemaRegistry::builtin(),
        }
    }

    pub fn from_bytes(blob: &[u8]) -> Result<Self> {
        let registry = SchemaRegistry::from_bytes(blob).inspect_err(|e| {
            tracing::debug!(error = %e, "schema construction failed");
        })?;
        Ok(Self { registry })
    }

    pub fn registry(&self) -> &SchemaRegistry {
        &self.registry
    }

    /// Handle for a fully-qualified message name; `None` if unknown.
    pub fn get(&self, type_name: &str) -> Option<TypeHandle> {
        let adapter = self.registry.resolve(type_name)?;
        Some(TypeHandle {
            registry: self.registry.clone(),
            adapter,
        })
    }

    /// Every message type the schema declares, nested types included.
    pub fn type_names(&self) -> Vec<String> {
        self.registry.source().message_names().collect()
    }
}

/// Callable handle for one message type.
///
/// Keeps the schema alive, so nested adapters stay cached for as long
/// as the handle is used.
#[derive(Debug, Clone)]
pub struct TypeHandle {
    registry: SchemaRegistry,
    adapter: Arc<TypeAdapter>,
}

impl TypeHandle {
    pub fn adapter(&self) -> &Arc<TypeAdapter> {
        &self.adapter
    }

    pub fn registry(&self) -> &SchemaRegistry {
        &self.registry
    }

    pub fn full_name(&self) -> &str {
        self.adapter.full_name()
    }

    /// Decode a byte buffer argument. Non-buffer arguments fail with
    /// `ArgumentType`.
    pub fn parse(&self, arg: &Value) -> Result<Record> {
        let bytes = arg.as_bytes().ok_or_else(SchemaError::argument_type)?;
        self.adapter.decode(bytes)
    }

    /// Encode a record argument. Non-record arguments fail with
    /// `NotAnObject`.
    pub fn serialize(&self, arg: &Value) -> Result<Vec<u8>> {
        self.adapter.encode(arg)
    }

    /// Build a record from values listed in field declaration order.
    ///
    /// `Null` entries are skipped; extra trailing values are ignored.
    pub fn new_object(&self, values: Vec<Value>) -> Record {
        let fields = self.adapter.fields();
        let mut record = Record::with_capacity(fields.len());
        for (field, value) in fields.iter().zip(values) {
            if !value.is_null() {
                record.insert(field.host_name(), value);
            }
        }
        record
    }

    /// One slot per declared field, `Null` where the record has none.
    pub fn to_positional(&self, record: &Record) -> Vec<Value> {
        self.adapter
            .fields()
            .iter()
            .map(|f| record.get(f.host_name()).cloned().unwrap_or(Value::Null))
            .collect()
    }
}

impl fmt::Display for TypeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&*self.adapter, f)
    }
}
