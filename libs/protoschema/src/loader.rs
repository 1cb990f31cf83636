use std::fmt;

use prost_reflect::{DescriptorPool, MessageDescriptor};

use crate::error::{Result, SchemaError};

/// Where a [`DescriptorSource`] got its types from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    /// The process-wide registry of compiled-in descriptors.
    Builtin,
    /// A pool decoded from a serialized `FileDescriptorSet`.
    Bytes,
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceKind::Builtin => write!(f, "builtin"),
            SourceKind::Bytes => write!(f, "bytes"),
        }
    }
}

/// Resolves message type names to descriptors.
#[derive(Clone)]
pub struct DescriptorSource {
    pool: DescriptorPool,
    kind: SourceKind,
}

impl fmt::Debug for DescriptorSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DescriptorSource")
            .field("kind", &self.kind)
            .field("messages", &self.pool.all_messages().count())
            .finish()
    }
}

impl DescriptorSource {
    /// Bind to the compiled-in descriptor registry. Never fails.
    ///
    /// Register descriptors with [`register_builtin`] before calling
    /// this.
    pub fn from_builtin() -> Self {
        Self {
            pool: DescriptorPool::global(),
            kind: SourceKind::Builtin,
        }
    }

    /// Parse `blob` as a serialized `FileDescriptorSet`.
    ///
    /// The resulting source is independent of every other source and
    /// holds exactly the files in the blob. On failure nothing is built.
    pub fn from_bytes(blob: &[u8]) -> Result<Self> {
        let pool = DescriptorPool::decode(blob)?;
        Ok(Self {
            pool,
            kind: SourceKind::Bytes,
        })
    }

    pub fn kind(&self) -> SourceKind {
        self.kind
    }

    pub fn pool(&self) -> &DescriptorPool {
        &self.pool
    }

    /// Look up a fully-qualified message name (e.g. `"demo.Point"`).
    pub fn resolve_type(&self, name: &str) -> Option<MessageDescriptor> {
        self.pool.get_message_by_name(name)
    }

    /// Fully-qualified names of every message type, nested ones included.
    pub fn message_names(&self) -> impl Iterator<Item = String> + '_ {
        self.pool
            .all_messages()
            .map(|m| m.full_name().to_owned())
    }
}

/// Add the files of a serialized `FileDescriptorSet` to the compiled-in
/// registry, as generated code does at startup.
pub fn register_builtin(blob: &[u8]) -> Result<()> {
    DescriptorPool::decode_global_file_descriptor_set(blob).map_err(SchemaError::from)
}
