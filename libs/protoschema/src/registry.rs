use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use prost_reflect::MessageDescriptor;

use crate::adapter::TypeAdapter;
use crate::error::Result;
use crate::loader::DescriptorSource;

/// Entry point applications hold: a descriptor source plus the lazily
/// built adapter for every message type referenced so far.
///
/// Cloning is cheap and shares the cache. Every lookup of the same
/// type returns the same `Arc<TypeAdapter>` for as long as any clone
/// of the registry is alive.
#[derive(Debug, Clone)]
pub struct SchemaRegistry {
    inner: Arc<RegistryInner>,
}

#[derive(Debug)]
pub(crate) struct RegistryInner {
    source: DescriptorSource,
    /// Keyed by fully-qualified name, unique within one source.
    adapters: RwLock<HashMap<String, Arc<TypeAdapter>>>,
}

impl SchemaRegistry {
    pub fn new(source: DescriptorSource) -> Self {
        tracing::debug!(
            source = %source.kind(),
            messages = source.message_names().count(),
            "schema registry created"
        );
        Self {
            inner: Arc::new(RegistryInner {
                source,
                adapters: RwLock::new(HashMap::new()),
            }),
        }
    }

    /// Registry over the compiled-in descriptors.
    pub fn builtin() -> Self {
        Self::new(DescriptorSource::from_builtin())
    }

    /// Registry over a serialized `FileDescriptorSet`.
    pub fn from_bytes(blob: &[u8]) -> Result<Self> {
        Ok(Self::new(DescriptorSource::from_bytes(blob)?))
    }

    pub fn source(&self) -> &DescriptorSource {
        &self.inner.source
    }

    /// Adapter for a fully-qualified type name, or `None` when the
    /// source has no such message type.
    pub fn resolve(&self, type_name: &str) -> Option<Arc<TypeAdapter>> {
        let descriptor = self.inner.source.resolve_type(type_name)?;
        Some(self.inner.adapter_for(&descriptor))
    }

    /// Adapter for a descriptor, built on first reference.
    pub fn adapter_for(&self, descriptor: &MessageDescriptor) -> Arc<TypeAdapter> {
        self.inner.adapter_for(descriptor)
    }

    /// Number of adapters built so far.
    pub fn cached_len(&self) -> usize {
        self.inner.read().len()
    }
}

impl RegistryInner {
    pub(crate) fn adapter_for(self: &Arc<Self>, descriptor: &MessageDescriptor) -> Arc<TypeAdapter> {
        if let Some(adapter) = self.read().get(descriptor.full_name()) {
            return adapter.clone();
        }

        // Re-checked under the write lock: first build wins.
        let mut guard = self.write();
        guard
            .entry(descriptor.full_name().to_owned())
            .or_insert_with(|| {
                let adapter = TypeAdapter::new(descriptor.clone(), Arc::downgrade(self));
                tracing::debug!(
                    type_name = %descriptor.full_name(),
                    fields = adapter.fields().len(),
                    "type adapter built"
                );
                Arc::new(adapter)
            })
            .clone()
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, Arc<TypeAdapter>>> {
        match self.adapters.read() {
            Ok(g) => g,
            Err(poisoned) => {
                tracing::warn!("adapter cache read lock was poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, Arc<TypeAdapter>>> {
        match self.adapters.write() {
            Ok(g) => g,
            Err(poisoned) => {
                tracing::warn!("adapter cache write lock was poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }
}
