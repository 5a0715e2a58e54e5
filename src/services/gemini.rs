//! Native adapter for the Gemini-style generate-content API
//!
//! The backend's wire shape already matches the unified model (role-tagged
//! turns of text/function-call/function-response parts, a finish reason,
//! usage counters), so this adapter is a near pass-through: serialize the
//! request, deserialize the response, map names. Streaming is genuinely
//! incremental; every SSE data frame is a complete response chunk that is
//! normalized independently and forwarded in arrival order.

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::{Stream, StreamExt};
use reqwest::{header, Client};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    config::AdapterBinding,
    content::{
        ContentPart, EmbedRequest, EmbedResponse, FinishReason, Role, UnifiedRequest,
        UnifiedResponse, UsageMetadata,
    },
    error::{AdapterError, Result},
};

use super::{streaming::DataFrameParser, ProviderAdapter, ResponseStream};

/// Default endpoint of the native backend
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Native generate-content adapter
pub struct GeminiAdapter {
    client: Client,
    binding: AdapterBinding,
    base_url: String,
}

impl GeminiAdapter {
    /// Create an adapter for the binding.
    ///
    /// # Errors
    ///
    /// Returns [`AdapterError::Configuration`] when the binding has no
    /// resolvable credential. Checked here, before any network call.
    pub fn new(binding: AdapterBinding) -> Result<Self> {
        let api_key = binding.resolve_credential()?;

        let client = Client::builder()
            .default_headers({
                let mut headers = header::HeaderMap::new();
                headers.insert(
                    "x-goog-api-key",
                    header::HeaderValue::from_str(&api_key).map_err(|_| {
                        AdapterError::Configuration("invalid API key format".to_string())
                    })?,
                );
                headers
            })
            .build()?;

        Ok(Self {
            client,
            binding,
            base_url: DEFAULT_BASE_URL.to_string(),
        })
    }

    /// Point the adapter at a custom endpoint (tests, proxies)
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Model named by the request, falling back to the binding
    fn wire_model<'a>(&'a self, request: &'a UnifiedRequest) -> &'a str {
        if request.config.model.is_empty() {
            &self.binding.model
        } else {
            &request.config.model
        }
    }

    fn endpoint(&self, model: &str, verb: &str) -> String {
        format!("{}/models/{model}:{verb}", self.base_url)
    }

    fn build_request(request: &UnifiedRequest) -> GenerateContentRequest {
        let contents = request
            .turns
            .iter()
            .map(|turn| WireContent {
                role: Some(wire_role(turn.role).to_string()),
                parts: turn.parts.iter().map(WirePart::from_unified).collect(),
            })
            .collect();

        let generation_config = WireGenerationConfig {
            temperature: request.config.temperature,
            top_p: request.config.top_p,
            max_output_tokens: request.config.max_output_tokens,
            stop_sequences: request.config.stop_sequences.clone(),
        };

        let tools = request.tools.as_ref().map(|tools| {
            vec![WireToolGroup {
                function_declarations: tools
                    .iter()
                    .map(|tool| WireFunctionDeclaration {
                        name: tool.name.clone(),
                        description: tool.description.clone(),
                        parameters: tool.parameters.to_json_value(),
                    })
                    .collect(),
            }]
        });

        GenerateContentRequest {
            contents,
            generation_config: Some(generation_config),
            tools,
        }
    }

    async fn post(&self, url: String, body: &impl Serialize) -> Result<reqwest::Response> {
        let response = self.client.post(url).json(body).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AdapterError::Api {
                provider: "gemini".to_string(),
                message: format!("HTTP {status}: {body}"),
            });
        }

        Ok(response)
    }

    /// Turn the SSE byte stream into normalized response increments
    fn process_stream(
        byte_stream: impl Stream<Item = reqwest::Result<Bytes>> + Send + 'static,
    ) -> impl Stream<Item = Result<UnifiedResponse>> + Send + 'static {
        async_stream::stream! {
            let mut parser = DataFrameParser::new();
            let mut byte_stream = Box::pin(byte_stream);

            while let Some(chunk) = byte_stream.next().await {
                match chunk {
                    Ok(bytes) => {
                        let text = match std::str::from_utf8(&bytes) {
                            Ok(text) => text,
                            Err(e) => {
                                yield Err(AdapterError::Provider(format!(
                                    "invalid UTF-8 in stream: {e}"
                                )));
                                continue;
                            }
                        };

                        for frame in parser.push(text) {
                            match serde_json::from_str::<GenerateContentResponse>(&frame) {
                                Ok(response) => yield Ok(response.into_unified()),
                                Err(e) => yield Err(AdapterError::Provider(format!(
                                    "malformed stream frame: {e}"
                                ))),
                            }
                        }
                    }
                    Err(e) => {
                        yield Err(e.into());
                        break;
                    }
                }
            }

            if let Some(frame) = parser.finish() {
                match serde_json::from_str::<GenerateContentResponse>(&frame) {
                    Ok(response) => yield Ok(response.into_unified()),
                    Err(e) => yield Err(AdapterError::Provider(format!(
                        "malformed stream frame: {e}"
                    ))),
                }
            }
        }
    }
}

#[async_trait]
impl ProviderAdapter for GeminiAdapter {
    fn provider(&self) -> &str {
        "gemini"
    }

    fn model(&self) -> &str {
        &self.binding.model
    }

    async fn generate(&self, request: UnifiedRequest) -> Result<UnifiedResponse> {
        let model = self.wire_model(&request);
        tracing::debug!(model, turns = request.turns.len(), "native generate");

        let url = self.endpoint(model, "generateContent");
        let body = Self::build_request(&request);
        let response: GenerateContentResponse = self.post(url, &body).await?.json().await?;
        Ok(response.into_unified())
    }

    async fn generate_stream(&self, request: UnifiedRequest) -> Result<ResponseStream> {
        let model = self.wire_model(&request);
        tracing::debug!(model, turns = request.turns.len(), "native generate (streaming)");

        let url = format!("{}?alt=sse", self.endpoint(model, "streamGenerateContent"));
        let body = Self::build_request(&request);
        let response = self.post(url, &body).await?;

        Ok(Box::pin(Self::process_stream(response.bytes_stream())))
    }

    /// This backend counts tokens natively; no estimation involved.
    async fn count_tokens(&self, request: &UnifiedRequest) -> Result<u32> {
        let model = self.wire_model(request);
        let url = self.endpoint(model, "countTokens");
        let body = CountTokensRequest {
            contents: Self::build_request(request).contents,
        };
        let response: CountTokensResponse = self.post(url, &body).await?.json().await?;
        Ok(response.total_tokens)
    }

    async fn embed(&self, request: EmbedRequest) -> Result<EmbedResponse> {
        let url = self.endpoint(&request.model, "embedContent");
        let body = EmbedContentRequest {
            content: WireContent {
                role: None,
                parts: vec![WirePart {
                    text: Some(request.text),
                    ..WirePart::default()
                }],
            },
        };
        let response: EmbedContentResponse = self.post(url, &body).await?.json().await?;
        Ok(EmbedResponse {
            values: response.embedding.values,
        })
    }
}

const fn wire_role(role: Role) -> &'static str {
    match role {
        Role::User => "user",
        Role::Model => "model",
    }
}

fn finish_reason_from_wire(reason: Option<&str>) -> FinishReason {
    match reason {
        Some("STOP") => FinishReason::Stop,
        Some("MAX_TOKENS") => FinishReason::MaxTokens,
        Some("SAFETY") => FinishReason::Safety,
        _ => FinishReason::Unknown,
    }
}

// Generate-content wire types

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<WireContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<WireGenerationConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<WireToolGroup>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireGenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stop_sequences: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireToolGroup {
    function_declarations: Vec<WireFunctionDeclaration>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireFunctionDeclaration {
    name: String,
    description: String,
    parameters: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireContent {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<WirePart>,
}

/// One wire part; exactly one field is populated at a time
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WirePart {
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    function_call: Option<WireFunctionCall>,
    #[serde(skip_serializing_if = "Option::is_none")]
    function_response: Option<WireFunctionResponse>,
}

impl WirePart {
    fn from_unified(part: &ContentPart) -> Self {
        match part {
            ContentPart::Text { text } => Self {
                text: Some(text.clone()),
                ..Self::default()
            },
            ContentPart::FunctionCall { name, args } => Self {
                function_call: Some(WireFunctionCall {
                    name: name.clone(),
                    args: args.clone(),
                }),
                ..Self::default()
            },
            ContentPart::FunctionResponse { name, response } => Self {
                function_response: Some(WireFunctionResponse {
                    name: name.clone(),
                    response: response.clone(),
                }),
                ..Self::default()
            },
        }
    }

    fn into_unified(self) -> Option<ContentPart> {
        if let Some(text) = self.text {
            return Some(ContentPart::Text { text });
        }
        if let Some(call) = self.function_call {
            return Some(ContentPart::FunctionCall {
                name: call.name,
                args: call.args,
            });
        }
        if let Some(response) = self.function_response {
            return Some(ContentPart::FunctionResponse {
                name: response.name,
                response: response.response,
            });
        }
        None
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct WireFunctionCall {
    name: String,
    #[serde(default)]
    args: serde_json::Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct WireFunctionResponse {
    name: String,
    response: Value,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<WireCandidate>,
    #[serde(default)]
    usage_metadata: Option<WireUsageMetadata>,
}

impl GenerateContentResponse {
    fn into_unified(self) -> UnifiedResponse {
        let (parts, finish_reason) = self
            .candidates
            .into_iter()
            .next()
            .map_or((Vec::new(), FinishReason::Unknown), |candidate| {
                let parts = candidate
                    .content
                    .map(|content| {
                        content
                            .parts
                            .into_iter()
                            .filter_map(WirePart::into_unified)
                            .collect()
                    })
                    .unwrap_or_default();
                (
                    parts,
                    finish_reason_from_wire(candidate.finish_reason.as_deref()),
                )
            });

        UnifiedResponse {
            parts,
            finish_reason,
            usage: self.usage_metadata.map(|usage| UsageMetadata {
                prompt_token_count: usage.prompt_token_count,
                candidates_token_count: usage.candidates_token_count,
                total_token_count: usage.total_token_count,
            }),
            error: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireCandidate {
    #[serde(default)]
    content: Option<WireContent>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct WireUsageMetadata {
    prompt_token_count: u32,
    candidates_token_count: u32,
    total_token_count: u32,
}

#[derive(Debug, Clone, Serialize)]
struct CountTokensRequest {
    contents: Vec<WireContent>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CountTokensResponse {
    total_tokens: u32,
}

#[derive(Debug, Clone, Serialize)]
struct EmbedContentRequest {
    content: WireContent,
}

#[derive(Debug, Clone, Deserialize)]
struct EmbedContentResponse {
    embedding: WireEmbedding,
}

#[derive(Debug, Clone, Deserialize)]
struct WireEmbedding {
    values: Vec<f32>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{catalog, AuthMethod};
    use crate::content::{ConversationTurn, ToolDeclaration, ParameterSchema};
    use futures::StreamExt;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn adapter_for(server: &MockServer) -> GeminiAdapter {
        let binding = AdapterBinding::new(catalog::GEMINI_PRO, AuthMethod::GeminiApiKey)
            .with_credential("test-key");
        GeminiAdapter::new(binding).unwrap().with_base_url(server.uri())
    }

    fn candidate_body(text: &str) -> Value {
        json!({
            "candidates": [{
                "content": { "role": "model", "parts": [{ "text": text }] },
                "finishReason": "STOP"
            }],
            "usageMetadata": { "promptTokenCount": 7, "candidatesTokenCount": 5, "totalTokenCount": 12 }
        })
    }

    #[tokio::test]
    async fn test_generate_passes_through() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/models/gemini-2.5-pro:generateContent"))
            .and(body_partial_json(json!({
                "contents": [{ "role": "user", "parts": [{ "text": "Hi" }] }]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(candidate_body("Hello!")))
            .expect(1)
            .mount(&server)
            .await;

        let adapter = adapter_for(&server);
        let request = UnifiedRequest::new(catalog::GEMINI_PRO, vec![ConversationTurn::user("Hi")]);

        let response = adapter.generate(request).await.unwrap();
        assert_eq!(response.text_content(), "Hello!");
        assert_eq!(response.finish_reason, FinishReason::Stop);
        assert_eq!(
            response.usage,
            Some(UsageMetadata {
                prompt_token_count: 7,
                candidates_token_count: 5,
                total_token_count: 12,
            })
        );
    }

    #[tokio::test]
    async fn test_tool_declarations_ride_along() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/models/gemini-2.5-pro:generateContent"))
            .and(body_partial_json(json!({
                "tools": [{
                    "functionDeclarations": [{
                        "name": "grep",
                        "description": "Search files",
                        "parameters": {
                            "type": "object",
                            "properties": { "pattern": { "type": "string" } },
                            "required": ["pattern"]
                        }
                    }]
                }]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(candidate_body("ok")))
            .expect(1)
            .mount(&server)
            .await;

        let adapter = adapter_for(&server);
        let request = UnifiedRequest::new(catalog::GEMINI_PRO, vec![ConversationTurn::user("Hi")])
            .with_tools(vec![ToolDeclaration {
                name: "grep".to_string(),
                description: "Search files".to_string(),
                parameters: ParameterSchema::from_json(&json!({
                    "type": "object",
                    "properties": { "pattern": { "type": "string" } },
                    "required": ["pattern"]
                })),
            }]);

        adapter.generate(request).await.unwrap();
    }

    #[tokio::test]
    async fn test_function_call_parts_come_back_in_order() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/models/gemini-2.5-pro:generateContent"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{
                    "content": {
                        "role": "model",
                        "parts": [
                            { "text": "Let me check." },
                            { "functionCall": { "name": "grep", "args": { "pattern": "fn main" } } }
                        ]
                    },
                    "finishReason": "STOP"
                }]
            })))
            .mount(&server)
            .await;

        let adapter = adapter_for(&server);
        let request = UnifiedRequest::new(catalog::GEMINI_PRO, vec![ConversationTurn::user("Hi")]);

        let response = adapter.generate(request).await.unwrap();
        assert_eq!(response.parts.len(), 2);
        assert_eq!(response.parts[0], ContentPart::text("Let me check."));
        let mut args = serde_json::Map::new();
        args.insert("pattern".into(), json!("fn main"));
        assert_eq!(response.parts[1], ContentPart::function_call("grep", args));
        // No usage object on the wire means no usage object here.
        assert_eq!(response.usage, None);
    }

    #[tokio::test]
    async fn test_stream_forwards_frames_in_arrival_order() {
        let server = MockServer::start().await;
        let body = concat!(
            "data: {\"candidates\":[{\"content\":{\"role\":\"model\",\"parts\":[{\"text\":\"Hel\"}]}}]}\n\n",
            "data: {\"candidates\":[{\"content\":{\"role\":\"model\",\"parts\":[{\"text\":\"lo\"}]},\"finishReason\":\"STOP\"}]}\n\n",
        );
        Mock::given(method("POST"))
            .and(path("/models/gemini-2.5-pro:streamGenerateContent"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/event-stream"))
            .expect(1)
            .mount(&server)
            .await;

        let adapter = adapter_for(&server);
        let request = UnifiedRequest::new(catalog::GEMINI_PRO, vec![ConversationTurn::user("Hi")]);

        let mut stream = adapter.generate_stream(request).await.unwrap();
        let first = stream.next().await.unwrap().unwrap();
        assert_eq!(first.text_content(), "Hel");
        assert_eq!(first.finish_reason, FinishReason::Unknown);

        let second = stream.next().await.unwrap().unwrap();
        assert_eq!(second.text_content(), "lo");
        assert_eq!(second.finish_reason, FinishReason::Stop);

        assert!(stream.next().await.is_none());
    }

    #[tokio::test]
    async fn test_abandoned_stream_opens_the_connection_once() {
        let server = MockServer::start().await;
        let body = concat!(
            "data: {\"candidates\":[{\"content\":{\"role\":\"model\",\"parts\":[{\"text\":\"first\"}]}}]}\n\n",
            "data: {\"candidates\":[{\"content\":{\"role\":\"model\",\"parts\":[{\"text\":\"rest\"}]}}]}\n\n",
        );
        Mock::given(method("POST"))
            .and(path("/models/gemini-2.5-pro:streamGenerateContent"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/event-stream"))
            .expect(1)
            .mount(&server)
            .await;

        let adapter = adapter_for(&server);
        let request = UnifiedRequest::new(catalog::GEMINI_PRO, vec![ConversationTurn::user("Hi")]);

        let mut stream = adapter.generate_stream(request).await.unwrap();
        let first = stream.next().await.unwrap().unwrap();
        assert_eq!(first.text_content(), "first");
        drop(stream);

        // Dropping the stream closed the one connection; the mock's
        // expect(1) verifies no second request was opened.
        server.verify().await;
    }

    #[tokio::test]
    async fn test_count_tokens_uses_the_native_endpoint() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/models/gemini-2.5-pro:countTokens"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "totalTokens": 42 })))
            .mount(&server)
            .await;

        let adapter = adapter_for(&server);
        let request = UnifiedRequest::new(catalog::GEMINI_PRO, vec![ConversationTurn::user("Hi")]);
        assert_eq!(adapter.count_tokens(&request).await.unwrap(), 42);
    }

    #[tokio::test]
    async fn test_embed_content() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/models/gemini-embedding-001:embedContent"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "embedding": { "values": [0.1, -0.2, 0.3] }
            })))
            .mount(&server)
            .await;

        let adapter = adapter_for(&server);
        let response = adapter
            .embed(EmbedRequest {
                model: catalog::GEMINI_EMBEDDING.to_string(),
                text: "vector me".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(response.values, vec![0.1, -0.2, 0.3]);
    }

    #[tokio::test]
    async fn test_api_errors_keep_status_and_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/models/gemini-2.5-pro:generateContent"))
            .respond_with(ResponseTemplate::new(403).set_body_string("key revoked"))
            .mount(&server)
            .await;

        let adapter = adapter_for(&server);
        let request = UnifiedRequest::new(catalog::GEMINI_PRO, vec![ConversationTurn::user("Hi")]);

        let error = adapter.generate(request).await.unwrap_err();
        match error {
            AdapterError::Api { provider, message } => {
                assert_eq!(provider, "gemini");
                assert!(message.contains("403"));
                assert!(message.contains("key revoked"));
            }
            other => panic!("expected Api error, got {other:?}"),
        }
    }
}
