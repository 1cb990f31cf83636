//! Runtime-described protobuf messages.
//!
//! A [`SchemaRegistry`] wraps a descriptor source (the compiled-in
//! registry, or a serialized `FileDescriptorSet`) and hands out one
//! [`TypeAdapter`] per message type. An adapter converts wire bytes to
//! a generic [`Record`] and back without any generated code.
//!
//! ```no_run
//! use protoschema::{Record, SchemaRegistry, Value};
//!
//! # fn main() -> Result<(), protoschema::SchemaError> {
//! # let descriptor_set: Vec<u8> = Vec::new();
//! let registry = SchemaRegistry::from_bytes(&descriptor_set)?;
//! if let Some(point) = registry.resolve("demo.Point") {
//!     let mut record = Record::new();
//!     record.insert("x", 3);
//!     record.insert("y", 4);
//!     let bytes = point.encode(&Value::Record(record))?;
//!     assert_eq!(bytes, [0x08, 0x03, 0x10, 0x04]);
//! }
//! # Ok(())
//! # }
//! ```

pub mod adapter;
pub mod codec;
pub mod error;
pub mod loader;
pub mod registry;
pub mod value;

pub use adapter::{FieldSpec, TypeAdapter};
pub use codec::FieldKind;
pub use error::{ErrorKind, Result, SchemaError};
pub use loader::{register_builtin, DescriptorSource, SourceKind};
pub use registry::SchemaRegistry;
pub use value::{Record, Value};
