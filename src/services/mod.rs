//! Provider adapters
//!
//! One adapter per backend, all speaking the unified request/response types:
//! - Gemini-style native backend (pass-through wire shape)
//! - Claude, bridged through a flat-prompt generation SDK
//!
//! Adapters translate; they never execute tools and never retry. Tool
//! execution belongs to the calling loop, retry policy to the caller and
//! transport.

pub mod claude;
pub mod flatten;
pub mod gemini;
pub mod normalize;
pub mod schema;
pub mod sdk;
pub mod streaming;

use std::pin::Pin;

use async_trait::async_trait;
use futures::Stream;

use crate::{
    config::{AdapterBinding, ProviderKind},
    content::{EmbedRequest, EmbedResponse, UnifiedRequest, UnifiedResponse},
    error::Result,
};

/// Stream of response increments.
///
/// Lazy, finite, non-restartable; the end of the stream is the completion
/// marker. Dropping the stream early cancels the request and closes the
/// underlying connection.
pub type ResponseStream = Pin<Box<dyn Stream<Item = Result<UnifiedResponse>> + Send>>;

/// Core trait implemented by every provider adapter
///
/// Each request is handled by exactly one adapter invocation. Adapters hold
/// only read-only configuration, so one instance may serve many concurrent
/// requests.
#[async_trait]
pub trait ProviderAdapter: Send + Sync {
    /// Provider name (e.g. "gemini", "claude")
    fn provider(&self) -> &str;

    /// Model this adapter was bound to at dispatch time
    fn model(&self) -> &str;

    /// Single-shot generation
    async fn generate(&self, request: UnifiedRequest) -> Result<UnifiedResponse>;

    /// Streaming generation
    async fn generate_stream(&self, request: UnifiedRequest) -> Result<ResponseStream>;

    /// Token count for the request, from the native tokenizer when the
    /// backend has one, otherwise estimated
    async fn count_tokens(&self, request: &UnifiedRequest) -> Result<u32>;

    /// Embedding; fails with [`crate::AdapterError::Unsupported`] on
    /// text-only backends
    async fn embed(&self, request: EmbedRequest) -> Result<EmbedResponse>;
}

/// Factory selecting the adapter variant for a binding
///
/// Dispatch happens here, on the binding's auth method. Shared logic never
/// branches on model-name strings; new providers are added as new adapter
/// implementations plus a factory arm.
pub struct AdapterFactory;

impl AdapterFactory {
    /// Create an adapter for the captured binding
    ///
    /// # Errors
    ///
    /// Returns [`crate::AdapterError::Configuration`] when the binding has no
    /// resolvable credential.
    pub fn create(binding: &AdapterBinding) -> Result<Box<dyn ProviderAdapter>> {
        match binding.provider() {
            ProviderKind::Gemini => Ok(Box::new(gemini::GeminiAdapter::new(binding.clone())?)),
            ProviderKind::Claude => Ok(Box::new(claude::ClaudeAdapter::new(binding.clone())?)),
        }
    }
}
