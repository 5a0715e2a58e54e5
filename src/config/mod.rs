//! Configuration surface consumed by the adapter layer
//!
//! Auth methods, known model identifiers, and the active model/auth binding.
//! Everything here is read-only from the adapters' perspective: loading,
//! merging, and persisting settings belong to the host application, as does
//! credential storage and refresh.

pub mod binding;

use serde::{Deserialize, Serialize};

pub use self::binding::{AdapterBinding, BindingRegistry};

/// Selectable authentication routes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AuthMethod {
    /// Personal OAuth login against the native backend
    OauthPersonal,
    /// API key for the native backend
    GeminiApiKey,
    /// Platform auth for the native backend hosted on Vertex
    VertexAi,
    /// API key for the bridged backend
    ClaudeApiKey,
}

impl AuthMethod {
    /// Provider family this auth method selects
    #[must_use]
    pub const fn provider(self) -> ProviderKind {
        match self {
            Self::OauthPersonal | Self::GeminiApiKey | Self::VertexAi => ProviderKind::Gemini,
            Self::ClaudeApiKey => ProviderKind::Claude,
        }
    }

    /// Environment variable consulted when the binding carries no explicit
    /// credential
    #[must_use]
    pub const fn credential_env_var(self) -> &'static str {
        match self {
            Self::ClaudeApiKey => "ANTHROPIC_API_KEY",
            Self::VertexAi => "GOOGLE_API_KEY",
            Self::OauthPersonal | Self::GeminiApiKey => "GEMINI_API_KEY",
        }
    }
}

/// Provider families with a concrete adapter variant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Gemini,
    Claude,
}

impl ProviderKind {
    /// Short name used in logs and error messages
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Gemini => "gemini",
            Self::Claude => "claude",
        }
    }

    /// Model a fresh binding for this family points at
    #[must_use]
    pub const fn default_model(self) -> &'static str {
        match self {
            Self::Gemini => catalog::GEMINI_PRO,
            Self::Claude => catalog::CLAUDE_SONNET,
        }
    }

    /// Whether a model identifier belongs to this family
    #[must_use]
    pub fn owns_model(self, model: &str) -> bool {
        match self {
            Self::Gemini => model.starts_with("gemini-"),
            Self::Claude => model.starts_with("claude-"),
        }
    }
}

/// Known model identifiers, grouped by provider family
pub mod catalog {
    pub const GEMINI_PRO: &str = "gemini-2.5-pro";
    pub const GEMINI_FLASH: &str = "gemini-2.5-flash";
    pub const GEMINI_EMBEDDING: &str = "gemini-embedding-001";

    pub const CLAUDE_SONNET: &str = "claude-sonnet-4-20250514";
    pub const CLAUDE_OPUS: &str = "claude-opus-4-20250514";
    pub const CLAUDE_HAIKU: &str = "claude-3-5-haiku-20241022";
}
