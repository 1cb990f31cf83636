//! Host surface over `protoschema`: schema/type handles, a JSON bridge
//! and a config-driven codec mapping wire bytes to `serde_json::Value`.

pub mod config;
pub mod error;
pub mod json;
pub mod schema;

pub use config::CodecConfig;
pub use error::CodecError;
pub use schema::{Schema, TypeHandle};

use protoschema::Value;

// ---- Codec ----

/// Bytes ↔ JSON for one configured message type.
#[derive(Debug, Clone)]
pub struct ProtobufCodec {
    handle: TypeHandle,
}

impl ProtobufCodec {
    pub fn new(handle: TypeHandle) -> Self {
        Self { handle }
    }

    pub fn handle(&self) -> &TypeHandle {
        &self.handle
    }

    pub fn deserialize(&self, data: &[u8]) -> Result<serde_json::Value, CodecError> {
        let record = self.handle.adapter().decode(data).inspect_err(|e| {
            tracing::debug!(
                message_type = self.handle.full_name(),
                error = %e,
                "protobuf deserialize failed"
            );
        })?;
        Ok(json::to_json(&Value::Record(record)))
    }

    pub fn serialize(&self, value: &serde_json::Value) -> Result<Vec<u8>, CodecError> {
        let value = json::from_json_typed(self.handle.registry(), self.handle.adapter(), value)?;
        Ok(self.handle.serialize(&value)?)
    }

    /// As [`serialize`](Self::serialize), from JSON text.
    pub fn serialize_str(&self, json: &str) -> Result<Vec<u8>, CodecError> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        self.serialize(&value)
    }
}
