//! Error types for the extractor.
//!
//! Extraction itself never fails: unparsable fragments are represented by
//! absence. Errors only arise at the edges (payload validation, I/O, fetching
//! a page, loading dictionaries, editing fields).

use thiserror::Error;

/// Main error type for the extractor library.
#[derive(Debug, Error)]
pub enum ExtractorError {
    /// Payload exceeds the configured size cap.
    #[error("Payload of {size} bytes exceeds the limit of {limit} bytes")]
    PayloadTooLarge { size: usize, limit: usize },

    /// Declared content type is not HTML or plain text.
    #[error("Unsupported media type: '{0}'. Expected text/html")]
    UnsupportedMediaType(String),

    /// Payload is empty or whitespace only.
    #[error("Empty payload")]
    EmptyPayload,

    /// Payload is not valid UTF-8.
    #[error("Payload is not valid UTF-8 at byte {0}")]
    InvalidEncoding(usize),

    /// Payload does not look like HTML.
    #[error("Payload does not look like HTML")]
    NotHtml,

    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// All retry attempts exhausted.
    #[error("Request failed after {attempts} attempts: {message}")]
    RetriesExhausted { attempts: u32, message: String },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML serialization error.
    #[error("YAML serialization failed: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),

    /// No descriptor for a field key.
    #[error("Unknown field: '{0}'")]
    UnknownField(String),

    /// Value of the wrong shape for a field.
    #[error("Invalid value for field '{field}': expected {expected}")]
    FieldType {
        field: String,
        expected: &'static str,
    },
}

impl ExtractorError {
    /// HTTP status code a service boundary should answer with.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self {
            Self::PayloadTooLarge { .. } => 413,
            Self::UnsupportedMediaType(_) => 415,
            Self::EmptyPayload
            | Self::InvalidEncoding(_)
            | Self::NotHtml
            | Self::Json(_)
            | Self::UnknownField(_)
            | Self::FieldType { .. } => 400,
            Self::Http(_) | Self::RetriesExhausted { .. } => 502,
            Self::Io(_) | Self::Yaml(_) => 500,
        }
    }
}

/// Result type alias for extractor operations.
pub type Result<T> = std::result::Result<T, ExtractorError>;
