//! Bridged adapter for the flat-prompt generation SDK
//!
//! The backend behind this adapter takes one prompt string and an SDK-native
//! tool schema, and returns one complete result per call. Each request is
//! bridged into that shape: flatten the conversation, translate the tool
//! declarations, call the SDK, normalize the result.
//!
//! Tool execution authority stays with the caller. The executors handed to
//! the SDK never run anything; they answer every call with a `pending`
//! payload telling the caller to execute the tool and resubmit the result as
//! a new turn.

use std::sync::Arc;

use async_trait::async_trait;
use indexmap::IndexMap;
use serde_json::json;

use crate::{
    config::AdapterBinding,
    content::{EmbedRequest, EmbedResponse, ToolDeclaration, UnifiedRequest, UnifiedResponse},
    error::{AdapterError, Result},
    estimator,
};

use super::{
    flatten::flatten_conversation,
    normalize::normalize_result,
    schema::translate_parameters,
    sdk::{GenerateTextRequest, GenerationSdk, HttpGenerationSdk, SdkTool},
    streaming::single_increment,
    ProviderAdapter, ResponseStream,
};

/// Maximum internal reasoning/tool steps per SDK call.
///
/// Hard contract, not a default: one step means the SDK gets exactly one
/// tool-call opportunity before control returns to the caller, which
/// executes the tool and resubmits the result as a new turn. The constant is
/// passed into every SDK call; raising it would let the backend run tool
/// rounds the caller never sees.
pub const TOOL_STEP_LIMIT: u32 = 1;

/// Adapter bridging the foreign generate-text SDK into the unified contract
pub struct ClaudeAdapter {
    sdk: Arc<dyn GenerationSdk>,
    binding: AdapterBinding,
}

impl std::fmt::Debug for ClaudeAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClaudeAdapter")
            .field("binding", &self.binding)
            .finish_non_exhaustive()
    }
}

impl ClaudeAdapter {
    /// Create an adapter for the binding.
    ///
    /// # Errors
    ///
    /// Returns [`AdapterError::Configuration`] when the binding has no
    /// resolvable credential. Checked here, before any network call.
    pub fn new(binding: AdapterBinding) -> Result<Self> {
        let api_key = binding.resolve_credential()?;
        let sdk = Arc::new(HttpGenerationSdk::new(&api_key)?);
        Ok(Self { sdk, binding })
    }

    /// Adapter over a caller-supplied SDK (tests, alternate transports)
    #[must_use]
    pub fn with_sdk(binding: AdapterBinding, sdk: Arc<dyn GenerationSdk>) -> Self {
        Self { sdk, binding }
    }

    /// Build the SDK tool map from the request's declarations.
    ///
    /// Translation degrades malformed pieces instead of failing, so one bad
    /// declaration cannot take down the rest of the map.
    fn build_tool_map(tools: Option<&[ToolDeclaration]>) -> IndexMap<String, SdkTool> {
        let mut map = IndexMap::new();

        for declaration in tools.unwrap_or_default() {
            let name = declaration.name.clone();
            let description = if declaration.description.is_empty() {
                name.clone()
            } else {
                declaration.description.clone()
            };
            let parameters = translate_parameters(&declaration.parameters);

            let executor_name = name.clone();
            map.insert(
                name,
                SdkTool {
                    description,
                    parameters,
                    execute: Arc::new(move |args| {
                        tracing::debug!(tool = %executor_name, "tool call requested; deferring to caller");
                        json!({
                            "status": "pending",
                            "message": format!("Tool {executor_name} will be executed by the caller"),
                            "args": args,
                        })
                    }),
                },
            );
        }

        map
    }

    fn build_sdk_request(&self, request: &UnifiedRequest) -> GenerateTextRequest {
        GenerateTextRequest {
            model: self.binding.model.clone(),
            prompt: flatten_conversation(&request.turns),
            tools: Self::build_tool_map(request.tools.as_deref()),
            max_steps: TOOL_STEP_LIMIT,
        }
    }
}

#[async_trait]
impl ProviderAdapter for ClaudeAdapter {
    fn provider(&self) -> &str {
        "claude"
    }

    fn model(&self) -> &str {
        &self.binding.model
    }

    async fn generate(&self, request: UnifiedRequest) -> Result<UnifiedResponse> {
        let sdk_request = self.build_sdk_request(&request);
        tracing::debug!(
            model = %sdk_request.model,
            tools = sdk_request.tools.len(),
            "bridged generate"
        );
        let result = self.sdk.generate_text(sdk_request).await?;
        Ok(normalize_result(result))
    }

    /// One complete result per backend call, so the stream is a single
    /// increment followed by the end marker. Tool calls always arrive whole,
    /// never split across increments, guaranteed by [`TOOL_STEP_LIMIT`].
    async fn generate_stream(&self, request: UnifiedRequest) -> Result<ResponseStream> {
        let response = self.generate(request).await?;
        Ok(single_increment(response))
    }

    /// No native tokenizer on this backend; estimated from the flattened
    /// transcript.
    async fn count_tokens(&self, request: &UnifiedRequest) -> Result<u32> {
        Ok(estimator::estimate_tokens(&flatten_conversation(
            &request.turns,
        )))
    }

    async fn embed(&self, _request: EmbedRequest) -> Result<EmbedResponse> {
        Err(AdapterError::unsupported("claude", "embeddings"))
    }
}
