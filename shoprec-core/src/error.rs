use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Upstream error: {0}")]
    Upstream(#[from] UpstreamError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    #[error("Operation timeout after {seconds} seconds")]
    Timeout { seconds: u64 },

    #[error("Resource not found: {resource}")]
    NotFound { resource: String },
}

impl CoreError {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        CoreError::InvalidInput {
            message: message.into(),
        }
    }

    pub fn product_not_found(product_id: &str) -> Self {
        CoreError::NotFound {
            resource: format!("product {product_id}"),
        }
    }
}

/// Failures of an external collaborator (the re-ranking service).
///
/// Timeouts are not part of this enum: they surface as [`CoreError::Timeout`]
/// so callers can tell "try later" apart from "the service misbehaved".
#[derive(Error, Debug, Clone, PartialEq)]
pub enum UpstreamError {
    #[error("Upstream returned HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    #[error("Network failure talking to upstream: {details}")]
    Network { details: String },

    #[error("Invalid upstream response: {details}")]
    InvalidResponse { details: String },

    #[error("Upstream request cancelled")]
    Cancelled,
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Catalog is empty, embedding dimension is undefined")]
    EmptyCatalog,

    #[error("Configuration file not found: {path}")]
    FileNotFound { path: String },

    #[error("Missing required field: {field}")]
    MissingField { field: String },

    #[error("Invalid value for {field}: {value}")]
    InvalidValue { field: String, value: String },

    #[error("Configuration validation failed: {reason}")]
    ValidationFailed { reason: String },

    #[error("Configuration parsing error: {0}")]
    Parse(#[from] toml::de::Error),
}
