//! Error types for the adapter layer

use thiserror::Error;

/// Result type alias using [`AdapterError`]
pub type Result<T> = std::result::Result<T, AdapterError>;

/// Main error type for the adapter layer
///
/// Nothing here is retried internally; retry policy belongs to the caller.
#[derive(Debug, Error)]
pub enum AdapterError {
    /// Missing or unusable configuration, caught at adapter construction
    /// before any network call
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    /// Provider rejected the request
    #[error("API error from {provider}: {message}")]
    Api { provider: String, message: String },

    /// HTTP transport error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Provider returned an unusable payload
    #[error("Provider error: {0}")]
    Provider(String),

    /// Operation this provider cannot perform (e.g. embeddings on a
    /// text-only backend)
    #[error("{operation} is not supported by {provider}")]
    Unsupported { provider: String, operation: String },

    /// Reserved for strict schema validation; translation currently degrades
    /// unknown shapes to unconstrained instead of failing
    #[error("Schema translation error: {0}")]
    SchemaTranslation(String),
}

impl AdapterError {
    /// Shorthand for [`AdapterError::Unsupported`]
    #[must_use]
    pub fn unsupported(provider: &str, operation: &str) -> Self {
        Self::Unsupported {
            provider: provider.to_string(),
            operation: operation.to_string(),
        }
    }
}
