use std::cmp::Ordering;
use std::fmt;
use std::sync::{Arc, Weak};

use prost::Message;
use prost_reflect::{
    Cardinality, DynamicMessage, FieldDescriptor, Kind, MapKey, MessageDescriptor, ReflectMessage,
    Value as WireValue,
};

use crate::codec::{self, FieldKind};
use crate::error::{Result, SchemaError};
use crate::registry::RegistryInner;
use crate::value::{Record, Value};

/// One declared field, as the adapter sees it.
#[derive(Debug, Clone)]
pub struct FieldSpec {
    descriptor: FieldDescriptor,
    host_name: String,
    kind: FieldKind,
    repeated: bool,
}

impl FieldSpec {
    fn new(descriptor: FieldDescriptor) -> Self {
        Self {
            host_name: descriptor.json_name().to_owned(),
            kind: FieldKind::of(descriptor.kind()),
            repeated: descriptor.is_list() || descriptor.is_map(),
            descriptor,
        }
    }

    /// Name used as the record key (lowerCamelCase JSON name).
    pub fn host_name(&self) -> &str {
        &self.host_name
    }

    /// Name as declared in the schema.
    pub fn name(&self) -> &str {
        self.descriptor.name()
    }

    pub fn number(&self) -> u32 {
        self.descriptor.number()
    }

    pub fn kind(&self) -> &FieldKind {
        &self.kind
    }

    pub fn is_repeated(&self) -> bool {
        self.repeated
    }

    /// Map fields are repeated entry messages with `key` and `value`.
    pub fn is_map(&self) -> bool {
        self.descriptor.is_map()
    }

    pub fn descriptor(&self) -> &FieldDescriptor {
        &self.descriptor
    }

    fn is_present(&self, message: &DynamicMessage) -> bool {
        if !self.repeated {
            return message.has_field(&self.descriptor);
        }
        match &*message.get_field(&self.descriptor) {
            WireValue::List(items) => !items.is_empty(),
            WireValue::Map(entries) => !entries.is_empty(),
            _ => false,
        }
    }
}

/// Conversion unit between wire bytes and a [`Record`] for one message
/// type.
///
/// Immutable after construction. Building an adapter never builds the
/// adapters of nested message types: they are looked up through the
/// owning registry when a nested value is actually converted, so
/// self-referential schemas are fine.
pub struct TypeAdapter {
    registry: Weak<RegistryInner>,
    descriptor: MessageDescriptor,
    fields: Vec<FieldSpec>,
}

impl fmt::Debug for TypeAdapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeAdapter")
            .field("type", &self.descriptor.full_name())
            .field("fields", &self.fields.len())
            .finish()
    }
}

impl fmt::Display for TypeAdapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.descriptor.full_name())
    }
}

impl TypeAdapter {
    pub(crate) fn new(descriptor: MessageDescriptor, registry: Weak<RegistryInner>) -> Self {
        let fields = descriptor.fields().map(FieldSpec::new).collect();
        Self {
            registry,
            descriptor,
            fields,
        }
    }

    /// An adapter bound to no registry. Nested adapters are rebuilt on
    /// every use instead of being cached.
    pub fn detached(descriptor: MessageDescriptor) -> Self {
        Self::new(descriptor, Weak::new())
    }

    pub fn full_name(&self) -> &str {
        self.descriptor.full_name()
    }

    pub fn descriptor(&self) -> &MessageDescriptor {
        &self.descriptor
    }

    /// Fields in declaration order.
    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    pub fn field(&self, host_name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.host_name == host_name)
    }

    /// Parse wire bytes into a record.
    pub fn decode(&self, bytes: &[u8]) -> Result<Record> {
        let mut message = DynamicMessage::new(self.descriptor.clone());
        if let Err(e) = message.merge(bytes) {
            tracing::debug!(type_name = %self.full_name(), error = %e, "decode failed");
            return Err(SchemaError::MalformedMessage {
                type_name: self.full_name().to_owned(),
                reason: e.to_string(),
            });
        }
        if let Some(path) = missing_required(&message) {
            tracing::debug!(type_name = %self.full_name(), field = %path, "required field missing");
            return Err(SchemaError::MalformedMessage {
                type_name: self.full_name().to_owned(),
                reason: format!("missing required field '{path}'"),
            });
        }
        self.decode_message(&message)
    }

    /// Serialize a record. Anything other than [`Value::Record`] is
    /// rejected with `NotAnObject`.
    ///
    /// Fails fast: the first field that does not fit aborts the call
    /// and no bytes are produced.
    pub fn encode(&self, value: &Value) -> Result<Vec<u8>> {
        let record = value.as_record().ok_or_else(SchemaError::not_an_object)?;
        self.encode_record(record)
    }

    pub fn encode_record(&self, record: &Record) -> Result<Vec<u8>> {
        match self.encode_message(record) {
            Ok(message) => Ok(message.encode_to_vec()),
            Err(e) => {
                tracing::debug!(type_name = %self.full_name(), error = %e, "encode failed");
                Err(e)
            }
        }
    }

    /// Convert a message already bound to this adapter's type.
    ///
    /// Only present fields appear in the result, in declaration order.
    pub fn decode_message(&self, message: &DynamicMessage) -> Result<Record> {
        let mut record = Record::with_capacity(self.fields.len());
        for field in &self.fields {
            if !field.is_present(message) {
                continue;
            }
            let nested = self.nested(&field.kind);
            let nested = nested.as_deref();
            let raw = message.get_field(&field.descriptor);
            let value = match &*raw {
                WireValue::Map(entries) => Value::List(self.decode_map(field, entries, nested)?),
                WireValue::List(items) => {
                    let items = items
                        .iter()
                        .filter(|item| !self.undeclared_enum(field, item))
                        .map(|item| codec::decode(&field.kind, item, nested))
                        .collect::<Result<Vec<_>>>()?;
                    if items.is_empty() {
                        continue;
                    }
                    Value::List(items)
                }
                single if self.undeclared_enum(field, single) => continue,
                single => codec::decode(&field.kind, single, nested)?,
            };
            record.insert(field.host_name.clone(), value);
        }
        Ok(record)
    }

    /// Enum numbers without a declared name are dropped like unknown
    /// fields: an enum value in a record is always a declared name.
    fn undeclared_enum(&self, field: &FieldSpec, raw: &WireValue) -> bool {
        let Some(number) = codec::undeclared_enum_number(&field.kind, raw) else {
            return false;
        };
        tracing::debug!(
            type_name = %self.full_name(),
            field = %field.host_name,
            number,
            "undeclared enum number dropped"
        );
        true
    }

    /// Build a message of this adapter's type from a record.
    ///
    /// Missing and `Null` entries are skipped. Zero, empty and `false`
    /// are values like any other and are set.
    pub fn encode_message(&self, record: &Record) -> Result<DynamicMessage> {
        let mut message = DynamicMessage::new(self.descriptor.clone());
        for field in &self.fields {
            let value = match record.get(&field.host_name) {
                None | Some(Value::Null) => continue,
                Some(v) => v,
            };
            let wire = self
                .encode_field(field, value)
                .map_err(|e| e.with_context(&field.host_name))?;
            self.set(&mut message, &field.descriptor, wire)?;
        }
        Ok(message)
    }

    fn set(&self, message: &mut DynamicMessage, field: &FieldDescriptor, value: WireValue) -> Result<()> {
        message
            .try_set_field(field, value)
            .map_err(|e| SchemaError::MalformedMessage {
                type_name: self.full_name().to_owned(),
                reason: e.to_string(),
            })
    }

    fn encode_field(&self, field: &FieldSpec, value: &Value) -> Result<WireValue> {
        let nested = self.nested(&field.kind);
        let nested = nested.as_deref();
        if !field.repeated {
            return codec::encode(&field.kind, value, nested);
        }

        let items = value.as_list().ok_or_else(SchemaError::not_an_array)?;
        if field.is_map() {
            return self.encode_map(field, items, nested);
        }
        let list = items
            .iter()
            .enumerate()
            .map(|(i, item)| {
                codec::encode(&field.kind, item, nested).map_err(|e| e.with_context(format!("[{i}]")))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(WireValue::List(list))
    }

    /// Adapter for a message-kind field, resolved through the registry
    /// cache. `None` for every other kind.
    fn nested(&self, kind: &FieldKind) -> Option<Arc<TypeAdapter>> {
        let desc = kind.message_type()?;
        let adapter = match self.registry.upgrade() {
            Some(registry) => registry.adapter_for(desc),
            None => Arc::new(TypeAdapter::detached(desc.clone())),
        };
        Some(adapter)
    }

    // -----------------------------------------------------------------------
    // Map fields
    // -----------------------------------------------------------------------

    /// Entries become `{key, value}` records, ordered by key.
    fn decode_map(
        &self,
        field: &FieldSpec,
        entries: &std::collections::HashMap<MapKey, WireValue>,
        entry_adapter: Option<&TypeAdapter>,
    ) -> Result<Vec<Value>> {
        let Some(entry_desc) = field.kind.message_type() else {
            return Ok(Vec::new());
        };
        let key_field = entry_desc.map_entry_key_field();
        let value_field = entry_desc.map_entry_value_field();

        let mut sorted: Vec<_> = entries.iter().collect();
        sorted.sort_by(|(a, _), (b, _)| compare_keys(a, b));

        let mut out = Vec::with_capacity(sorted.len());
        for (key, value) in sorted {
            let mut entry = DynamicMessage::new(entry_desc.clone());
            self.set(&mut entry, &key_field, map_key_to_value(key))?;
            self.set(&mut entry, &value_field, value.clone())?;
            let wire = WireValue::Message(entry);
            out.push(codec::decode(&field.kind, &wire, entry_adapter)?);
        }
        Ok(out)
    }

    fn encode_map(
        &self,
        field: &FieldSpec,
        items: &[Value],
        entry_adapter: Option<&TypeAdapter>,
    ) -> Result<WireValue> {
        let Some(entry_desc) = field.kind.message_type() else {
            return Ok(WireValue::Map(Default::default()));
        };
        let key_field = entry_desc.map_entry_key_field();
        let value_field = entry_desc.map_entry_value_field();

        let mut map = std::collections::HashMap::with_capacity(items.len());
        for (i, item) in items.iter().enumerate() {
            let wire = codec::encode(&field.kind, item, entry_adapter)
                .map_err(|e| e.with_context(format!("[{i}]")))?;
            let WireValue::Message(entry) = wire else {
                continue;
            };
            let Some(key) = value_to_map_key(entry.get_field(&key_field).into_owned()) else {
                continue;
            };
            map.insert(key, entry.get_field(&value_field).into_owned());
        }
        Ok(WireValue::Map(map))
    }
}

/// Path of the first unset `required` field, searching every nested
/// message that is present.
fn missing_required(message: &DynamicMessage) -> Option<String> {
    for field in message.descriptor().fields() {
        let present = message.has_field(&field);
        if matches!(field.cardinality(), Cardinality::Required) && !present {
            return Some(field.name().to_owned());
        }
        if !present || !matches!(field.kind(), Kind::Message(_)) {
            continue;
        }
        let inner = match &*message.get_field(&field) {
            WireValue::Message(nested) => missing_required(nested).map(|p| format!(".{p}")),
            WireValue::List(items) => items.iter().enumerate().find_map(|(i, item)| match item {
                WireValue::Message(nested) => missing_required(nested).map(|p| format!("[{i}].{p}")),
                _ => None,
            }),
            WireValue::Map(entries) => entries.values().find_map(|value| match value {
                WireValue::Message(nested) => missing_required(nested).map(|p| format!(".value.{p}")),
                _ => None,
            }),
            _ => None,
        };
        if let Some(path) = inner {
            return Some(format!("{}{path}", field.name()));
        }
    }
    None
}

fn map_key_to_value(key: &MapKey) -> WireValue {
    match key {
        MapKey::Bool(v) => WireValue::Bool(*v),
        MapKey::I32(v) => WireValue::I32(*v),
        MapKey::I64(v) => WireValue::I64(*v),
        MapKey::U32(v) => WireValue::U32(*v),
        MapKey::U64(v) => WireValue::U64(*v),
        MapKey::String(v) => WireValue::String(v.clone()),
    }
}

fn value_to_map_key(value: WireValue) -> Option<MapKey> {
    match value {
        WireValue::Bool(v) => Some(MapKey::Bool(v)),
        WireValue::I32(v) => Some(MapKey::I32(v)),
        WireValue::I64(v) => Some(MapKey::I64(v)),
        WireValue::U32(v) => Some(MapKey::U32(v)),
        WireValue::U64(v) => Some(MapKey::U64(v)),
        WireValue::String(v) => Some(MapKey::String(v)),
        _ => None,
    }
}

fn compare_keys(a: &MapKey, b: &MapKey) -> Ordering {
    match (a, b) {
        (MapKey::Bool(a), MapKey::Bool(b)) => a.cmp(b),
        (MapKey::I32(a), MapKey::I32(b)) => a.cmp(b),
        (MapKey::I64(a), MapKey::I64(b)) => a.cmp(b),
        (MapKey::U32(a), MapKey::U32(b)) => a.cmp(b),
        (MapKey::U64(a), MapKey::U64(b)) => a.cmp(b),
        (MapKey::String(a), MapKey::String(b)) => a.cmp(b),
        _ => Ordering::Equal,
    }
}
