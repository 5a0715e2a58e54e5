//! Foreign generation SDK surface
//!
//! The bridged adapter reaches its backend through this flat interface: one
//! prompt string, an SDK-native tool map, and a step limit in; text, a
//! tool-call list, a tool-result list, and usage counters out. The trait is
//! object-safe so tests can substitute a recording mock for the HTTP client.

use std::sync::Arc;

use async_trait::async_trait;
use indexmap::IndexMap;
use reqwest::{header, Client};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{AdapterError, Result};

/// SDK-native schema node
///
/// Optionality lives on the enclosing object's fields, not on the node
/// itself, mirroring how the SDK's schema builder works.
#[derive(Debug, Clone, PartialEq)]
pub enum SdkSchema {
    Object {
        properties: IndexMap<String, SdkProperty>,
    },
    String,
    Number,
    Boolean,
    Array {
        items: Box<SdkSchema>,
    },
    /// Accepts any value
    Any,
}

/// One field of an SDK object schema
#[derive(Debug, Clone, PartialEq)]
pub struct SdkProperty {
    pub schema: SdkSchema,
    pub optional: bool,
    pub description: Option<String>,
}

impl SdkSchema {
    /// An object schema with no fields
    #[must_use]
    pub fn empty_object() -> Self {
        Self::Object {
            properties: IndexMap::new(),
        }
    }

    /// Render as a JSON Schema fragment for wire formats that take one
    #[must_use]
    pub fn to_json_schema(&self) -> Value {
        match self {
            Self::Object { properties } => {
                let mut props = serde_json::Map::new();
                let mut required = Vec::new();
                for (name, property) in properties {
                    let mut fragment = property.schema.to_json_schema();
                    if let (Some(description), Some(object)) =
                        (&property.description, fragment.as_object_mut())
                    {
                        object.insert("description".into(), Value::String(description.clone()));
                    }
                    props.insert(name.clone(), fragment);
                    if !property.optional {
                        required.push(Value::String(name.clone()));
                    }
                }

                let mut out = serde_json::Map::new();
                out.insert("type".into(), Value::String("object".into()));
                out.insert("properties".into(), Value::Object(props));
                if !required.is_empty() {
                    out.insert("required".into(), Value::Array(required));
                }
                Value::Object(out)
            }
            Self::String => serde_json::json!({ "type": "string" }),
            Self::Number => serde_json::json!({ "type": "number" }),
            Self::Boolean => serde_json::json!({ "type": "boolean" }),
            Self::Array { items } => {
                serde_json::json!({ "type": "array", "items": items.to_json_schema() })
            }
            // An empty schema accepts anything
            Self::Any => Value::Object(serde_json::Map::new()),
        }
    }
}

/// Executor the SDK invokes when the model requests a tool call
pub type ToolExecutor = Arc<dyn Fn(&serde_json::Map<String, Value>) -> Value + Send + Sync>;

/// One entry of the SDK tool map
#[derive(Clone)]
pub struct SdkTool {
    pub description: String,
    pub parameters: SdkSchema,
    pub execute: ToolExecutor,
}

/// Request for one generate-text call
#[derive(Clone)]
pub struct GenerateTextRequest {
    pub model: String,
    pub prompt: String,
    /// Tool map in declaration order
    pub tools: IndexMap<String, SdkTool>,
    /// Maximum internal reasoning/tool steps before control returns
    pub max_steps: u32,
}

/// Tool call surfaced by the SDK
#[derive(Debug, Clone, PartialEq)]
pub struct SdkToolCall {
    pub id: String,
    pub name: String,
    pub args: serde_json::Map<String, Value>,
}

/// Result of an executor run, paired with the originating call
#[derive(Debug, Clone, PartialEq)]
pub struct SdkToolResult {
    pub call_id: String,
    pub result: Value,
}

/// Usage counters as reported by the SDK; any counter may be missing
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SdkUsage {
    pub prompt_tokens: Option<u32>,
    pub completion_tokens: Option<u32>,
    pub total_tokens: Option<u32>,
}

/// Aggregated result of one generate-text call
#[derive(Debug, Clone, Default)]
pub struct GenerateTextResult {
    pub text: String,
    pub tool_calls: Vec<SdkToolCall>,
    pub tool_results: Vec<SdkToolResult>,
    pub usage: Option<SdkUsage>,
}

/// The generate-text surface of the foreign SDK
#[async_trait]
pub trait GenerationSdk: Send + Sync {
    async fn generate_text(&self, request: GenerateTextRequest) -> Result<GenerateTextResult>;
}

/// Default endpoint of the bridged backend
pub const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";

const API_VERSION: &str = "2023-06-01";
const DEFAULT_MAX_TOKENS: u32 = 8192;

/// HTTP-backed [`GenerationSdk`] speaking the messages API
pub struct HttpGenerationSdk {
    client: Client,
    base_url: String,
}

impl HttpGenerationSdk {
    /// Create a client against the default endpoint
    ///
    /// # Errors
    ///
    /// Returns [`AdapterError::Configuration`] for a key that cannot form a
    /// valid header, or an HTTP error if the client cannot be built.
    pub fn new(api_key: &str) -> Result<Self> {
        Self::with_base_url(api_key, DEFAULT_BASE_URL)
    }

    /// Create a client against a custom endpoint (tests, proxies)
    ///
    /// # Errors
    ///
    /// Same failure modes as [`HttpGenerationSdk::new`].
    pub fn with_base_url(api_key: &str, base_url: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .default_headers({
                let mut headers = header::HeaderMap::new();
                headers.insert(
                    "x-api-key",
                    header::HeaderValue::from_str(api_key).map_err(|_| {
                        AdapterError::Configuration("invalid API key format".to_string())
                    })?,
                );
                headers.insert(
                    "anthropic-version",
                    header::HeaderValue::from_static(API_VERSION),
                );
                headers
            })
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    async fn call_model(
        &self,
        model: &str,
        prompt: &str,
        tools: &IndexMap<String, SdkTool>,
    ) -> Result<MessagesResponse> {
        let request = MessagesRequest {
            model: model.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            messages: vec![WireMessage {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
            tools: if tools.is_empty() {
                None
            } else {
                Some(
                    tools
                        .iter()
                        .map(|(name, tool)| WireTool {
                            name: name.clone(),
                            description: tool.description.clone(),
                            input_schema: tool.parameters.to_json_schema(),
                        })
                        .collect(),
                )
            },
        };

        let response = self
            .client
            .post(format!("{}/v1/messages", self.base_url))
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AdapterError::Api {
                provider: "claude".to_string(),
                message: format!("HTTP {status}: {body}"),
            });
        }

        Ok(response.json().await?)
    }
}

#[async_trait]
impl GenerationSdk for HttpGenerationSdk {
    /// Runs at most `max_steps` model calls.
    ///
    /// Tool calls are answered through the executors in the tool map; once
    /// the step budget is spent, the accumulated calls and results go back
    /// to the caller unresolved.
    async fn generate_text(&self, request: GenerateTextRequest) -> Result<GenerateTextResult> {
        let mut result = GenerateTextResult::default();
        let mut prompt = request.prompt.clone();
        let mut prompt_tokens = 0u32;
        let mut completion_tokens = 0u32;
        let mut saw_usage = false;

        for step in 0..request.max_steps.max(1) {
            tracing::debug!(model = %request.model, step, tools = request.tools.len(), "generate_text step");
            let response = self
                .call_model(&request.model, &prompt, &request.tools)
                .await?;

            if let Some(usage) = response.usage {
                saw_usage = true;
                prompt_tokens += usage.input_tokens;
                completion_tokens += usage.output_tokens;
            }

            let mut step_text = String::new();
            let mut calls = Vec::new();
            for block in response.content {
                match block {
                    WireContentBlock::Text { text } => step_text.push_str(&text),
                    WireContentBlock::ToolUse { id, name, input } => {
                        let args = input.as_object().cloned().unwrap_or_default();
                        calls.push(SdkToolCall { id, name, args });
                    }
                }
            }
            result.text = step_text;

            if calls.is_empty() {
                break;
            }

            // Answer each call through its executor; a call naming an
            // undeclared tool gets an error payload instead of aborting.
            let mut step_results = Vec::new();
            for call in &calls {
                let value = request.tools.get(&call.name).map_or_else(
                    || serde_json::json!({ "error": format!("unknown tool: {}", call.name) }),
                    |tool| (tool.execute)(&call.args),
                );
                step_results.push(SdkToolResult {
                    call_id: call.id.clone(),
                    result: value,
                });
            }
            result.tool_calls.extend(calls);

            let out_of_steps = step + 1 >= request.max_steps;
            if !out_of_steps {
                // Feed the results back as transcript lines for the next step.
                for tool_result in &step_results {
                    prompt.push_str(&format!(
                        "\n\nTool {} returned: {}",
                        tool_result.call_id, tool_result.result
                    ));
                }
            }
            result.tool_results.extend(step_results);
            if out_of_steps {
                break;
            }
        }

        if saw_usage {
            result.usage = Some(SdkUsage {
                prompt_tokens: Some(prompt_tokens),
                completion_tokens: Some(completion_tokens),
                total_tokens: Some(prompt_tokens + completion_tokens),
            });
        }

        Ok(result)
    }
}

// Messages API wire types

#[derive(Debug, Clone, Serialize)]
struct MessagesRequest {
    model: String,
    max_tokens: u32,
    messages: Vec<WireMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<WireTool>>,
}

#[derive(Debug, Clone, Serialize)]
struct WireMessage {
    role: String,
    content: String,
}

#[derive(Debug, Clone, Serialize)]
struct WireTool {
    name: String,
    description: String,
    input_schema: Value,
}

#[derive(Debug, Clone, Deserialize)]
struct MessagesResponse {
    content: Vec<WireContentBlock>,
    #[serde(default)]
    usage: Option<WireUsage>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum WireContentBlock {
    Text { text: String },
    ToolUse { id: String, name: String, input: Value },
}

#[derive(Debug, Clone, Deserialize)]
struct WireUsage {
    input_tokens: u32,
    output_tokens: u32,
}
