use std::path::Path;

use crate::error::CodecError;
use crate::schema::Schema;
use crate::ProtobufCodec;

/// Codec configuration.
///
/// ```toml
/// descriptor_path = "schemas/market.bin"
/// message_type = "market.Quote"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Deserialize)]
#[serde(default)]
pub struct CodecConfig {
    /// Path to a FileDescriptorSet (`protoc --descriptor_set_out`).
    /// Empty selects the compiled-in descriptors.
    pub descriptor_path: String,
    /// Fully-qualified message type name (e.g. "market.Quote").
    pub message_type: String,
}

impl CodecConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, CodecError> {
        toml::from_str(content).map_err(|e| CodecError::Config(e.to_string()))
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, CodecError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content).map_err(|e| e.with_context(path.display()))
    }

    pub fn build_schema(&self) -> Result<Schema, CodecError> {
        if self.descriptor_path.is_empty() {
            return Ok(Schema::builtin());
        }
        let blob = std::fs::read(&self.descriptor_path).inspect_err(|e| {
            tracing::warn!(path = %self.descriptor_path, error = %e, "failed to read descriptor file");
        })?;
        Ok(Schema::from_bytes(&blob)?)
    }

    pub fn build_codec(&self) -> Result<ProtobufCodec, CodecError> {
        if self.message_type.is_empty() {
            return Err(CodecError::Config("message_type is required".into()));
        }
        let schema = self.build_schema()?;
        let handle = schema
            .get(&self.message_type)
            .ok_or_else(|| CodecError::TypeNotFound(self.message_type.clone()))?;
        tracing::info!(
            message_type = %self.message_type,
            descriptor_path = %self.descriptor_path,
            "protobuf codec ready"
        );
        Ok(ProtobufCodec::new(handle))
    }
}
