use std::fmt;

/// Error kind, stable across context wrapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    ArgumentType,
    MalformedDescriptor,
    MalformedMessage,
    NotAnObject,
    NotAnArray,
    UnknownEnum,
}

/// Error returned by schema construction, decode and encode.
///
/// All variants describe caller data that does not match what was
/// expected. None of them are transient: retrying with the same input
/// fails the same way.
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    #[error("argument should be a byte buffer{}", at(.context))]
    ArgumentType { context: String },

    #[error("Malformed descriptor: {reason}")]
    MalformedDescriptor { reason: String },

    #[error("Malformed message ({type_name}): {reason}")]
    MalformedMessage { type_name: String, reason: String },

    #[error("Not an object{}", at(.context))]
    NotAnObject { context: String },

    #[error("Not an array{}", at(.context))]
    NotAnArray { context: String },

    #[error("Unknown enum value{}: {value} is not a member of {enum_name}", at(.context))]
    UnknownEnum {
        context: String,
        enum_name: String,
        value: String,
    },
}

fn at(context: &str) -> String {
    if context.is_empty() {
        String::new()
    } else {
        format!(" at '{context}'")
    }
}

impl SchemaError {
    pub fn argument_type() -> Self {
        SchemaError::ArgumentType { context: String::new() }
    }

    pub fn not_an_object() -> Self {
        SchemaError::NotAnObject { context: String::new() }
    }

    pub fn not_an_array() -> Self {
        SchemaError::NotAnArray { context: String::new() }
    }

    pub fn unknown_enum(enum_name: impl Into<String>, value: impl fmt::Display) -> Self {
        SchemaError::UnknownEnum {
            context: String::new(),
            enum_name: enum_name.into(),
            value: value.to_string(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            SchemaError::ArgumentType { .. } => ErrorKind::ArgumentType,
            SchemaError::MalformedDescriptor { .. } => ErrorKind::MalformedDescriptor,
            SchemaError::MalformedMessage { .. } => ErrorKind::MalformedMessage,
            SchemaError::NotAnObject { .. } => ErrorKind::NotAnObject,
            SchemaError::NotAnArray { .. } => ErrorKind::NotAnArray,
            SchemaError::UnknownEnum { .. } => ErrorKind::UnknownEnum,
        }
    }

    /// Prepend a field path segment, preserving the kind.
    ///
    /// Nested failures surface as `outer.inner` (or `list[2]` for an
    /// index segment), innermost segment last.
    pub fn with_context(self, segment: impl fmt::Display) -> Self {
        fn join(segment: impl fmt::Display, context: String) -> String {
            if context.is_empty() {
                segment.to_string()
            } else if context.starts_with('[') {
                format!("{segment}{context}")
            } else {
                format!("{segment}.{context}")
            }
        }

        match self {
            SchemaError::ArgumentType { context } => SchemaError::ArgumentType {
                context: join(segment, context),
            },
            SchemaError::NotAnObject { context } => SchemaError::NotAnObject {
                context: join(segment, context),
            },
            SchemaError::NotAnArray { context } => SchemaError::NotAnArray {
                context: join(segment, context),
            },
            SchemaError::UnknownEnum { context, enum_name, value } => SchemaError::UnknownEnum {
                context: join(segment, context),
                enum_name,
                value,
            },
            other => other,
        }
    }
}

impl From<prost_reflect::DescriptorError> for SchemaError {
    fn from(e: prost_reflect::DescriptorError) -> Self {
        SchemaError::MalformedDescriptor { reason: e.to_string() }
    }
}

pub type Result<T, E = SchemaError> = std::result::Result<T, E>;
