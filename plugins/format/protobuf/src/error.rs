use protoschema::SchemaError;

#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("{0}")]
    Schema(#[from] SchemaError),

    #[error("config error: {0}")]
    Config(String),

    #[error("message type '{0}' not found in descriptor")]
    TypeNotFound(String),

    #[error("bytes field '{field}': invalid base64: {reason}")]
    Base64 { field: String, reason: String },

    #[error("json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl CodecError {
    /// Add context to the error.
    ///
    /// Schema errors keep their kind; the context goes into the message
    /// of the other variants.
    pub fn with_context(self, ctx: impl std::fmt::Display) -> Self {
        match self {
            CodecError::Schema(e) => CodecError::Schema(e.with_context(ctx)),
            CodecError::Config(msg) => CodecError::Config(format!("{ctx}: {msg}")),
            CodecError::Base64 { field, reason } => CodecError::Base64 {
                field: if field.is_empty() {
                    ctx.to_string()
                } else {
                    format!("{ctx}.{field}")
                },
                reason,
            },
            other => other,
        }
    }
}
