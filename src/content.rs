//! Unified request/response types for AI conversations
//!
//! This module defines the provider-agnostic vocabulary shared by every
//! adapter: conversation turns, content parts, tool declarations, and the
//! unified response shape. Adapters translate between these types and their
//! backend's native wire format.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Speaker of a conversation turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Model,
}

impl Role {
    /// Label used when rendering a turn into a plain-text transcript
    #[must_use]
    pub const fn transcript_label(self) -> &'static str {
        match self {
            Self::User => "User",
            Self::Model => "Assistant",
        }
    }
}

/// One atomic unit of conversation content
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    Text {
        text: String,
    },
    /// A tool-invocation request emitted by the model
    FunctionCall {
        name: String,
        #[serde(default)]
        args: serde_json::Map<String, Value>,
    },
    /// A tool-invocation result fed back into the conversation
    FunctionResponse {
        name: String,
        response: Value,
    },
}

impl ContentPart {
    /// Create a text part
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    /// Create a function-call part
    #[must_use]
    pub fn function_call(name: impl Into<String>, args: serde_json::Map<String, Value>) -> Self {
        Self::FunctionCall {
            name: name.into(),
            args,
        }
    }

    /// Create a function-response part
    #[must_use]
    pub fn function_response(name: impl Into<String>, response: Value) -> Self {
        Self::FunctionResponse {
            name: name.into(),
            response,
        }
    }
}

/// A single turn in the conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: Role,
    pub parts: Vec<ContentPart>,
}

impl ConversationTurn {
    /// Create a user turn containing a single text part
    #[must_use]
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            parts: vec![ContentPart::text(text)],
        }
    }

    /// Create a model turn containing a single text part
    #[must_use]
    pub fn model(text: impl Into<String>) -> Self {
        Self {
            role: Role::Model,
            parts: vec![ContentPart::text(text)],
        }
    }
}

/// Generation parameters for a request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Model identifier; when empty the dispatched binding's model is used
    #[serde(default)]
    pub model: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_output_tokens: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_sequences: Option<Vec<String>>,
}

impl GenerationConfig {
    /// Config with the given model and no sampling overrides
    #[must_use]
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            temperature: None,
            top_p: None,
            max_output_tokens: None,
            stop_sequences: None,
        }
    }
}

/// Provider-agnostic generation request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnifiedRequest {
    /// Ordered conversation history, oldest first
    pub turns: Vec<ConversationTurn>,

    /// Tools the model may request; never executed by the adapter layer
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<ToolDeclaration>>,

    pub config: GenerationConfig,

    /// Whether the caller intends to consume the response incrementally
    #[serde(default)]
    pub stream: bool,
}

impl UnifiedRequest {
    /// Request for the given model and conversation, without tools
    #[must_use]
    pub fn new(model: impl Into<String>, turns: Vec<ConversationTurn>) -> Self {
        Self {
            turns,
            tools: None,
            config: GenerationConfig::new(model),
            stream: false,
        }
    }

    /// Attach tool declarations
    #[must_use]
    pub fn with_tools(mut self, tools: Vec<ToolDeclaration>) -> Self {
        self.tools = Some(tools);
        self
    }
}

/// Why the model stopped producing output
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    /// Natural completion
    Stop,
    MaxTokens,
    Safety,
    Cancelled,
    #[default]
    Unknown,
}

/// Token counters for one request/response pair
///
/// All-or-nothing: either the response carries no usage object at all, or it
/// carries all three counters with missing sub-counts defaulted to 0.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageMetadata {
    #[serde(default)]
    pub prompt_token_count: u32,
    #[serde(default)]
    pub candidates_token_count: u32,
    #[serde(default)]
    pub total_token_count: u32,
}

/// Provider-agnostic generation result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnifiedResponse {
    /// Produced parts, in provider emission order
    pub parts: Vec<ContentPart>,

    #[serde(default)]
    pub finish_reason: FinishReason,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<UsageMetadata>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl UnifiedResponse {
    /// Concatenated text of all text parts
    #[must_use]
    pub fn text_content(&self) -> String {
        self.parts
            .iter()
            .filter_map(|part| match part {
                ContentPart::Text { text } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    /// All function-call parts, in emission order
    #[must_use]
    pub fn function_calls(&self) -> Vec<&ContentPart> {
        self.parts
            .iter()
            .filter(|part| matches!(part, ContentPart::FunctionCall { .. }))
            .collect()
    }
}

/// A tool the model may request, declared by the caller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDeclaration {
    pub name: String,
    pub description: String,
    pub parameters: ParameterSchema,
}

/// Parameter schema node for a tool declaration
///
/// Exhaustive over the shapes the adapter layer understands; anything else is
/// `Unconstrained`. Adapters translate this tree into their backend's schema
/// format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ParameterSchema {
    Object {
        #[serde(default)]
        properties: IndexMap<String, ParameterSchema>,
        /// Names of properties the model must supply
        #[serde(default)]
        required: Vec<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        description: Option<String>,
    },
    String {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        description: Option<String>,
    },
    Number {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        description: Option<String>,
    },
    Boolean {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        description: Option<String>,
    },
    Array {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        items: Option<Box<ParameterSchema>>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        description: Option<String>,
    },
    Unconstrained,
}

impl ParameterSchema {
    /// An object schema with no properties
    #[must_use]
    pub fn empty_object() -> Self {
        Self::Object {
            properties: IndexMap::new(),
            required: Vec::new(),
            description: None,
        }
    }

    /// Parse a raw JSON schema fragment.
    ///
    /// Unknown `type` strings degrade to [`ParameterSchema::Unconstrained`],
    /// and a malformed property degrades on its own without aborting its
    /// siblings.
    #[must_use]
    pub fn from_json(value: &Value) -> Self {
        let Some(object) = value.as_object() else {
            return Self::Unconstrained;
        };
        let description = object
            .get("description")
            .and_then(Value::as_str)
            .map(String::from);

        match object.get("type").and_then(Value::as_str) {
            Some("object") => {
                let mut properties = IndexMap::new();
                if let Some(raw) = object.get("properties").and_then(Value::as_object) {
                    for (name, prop) in raw {
                        properties.insert(name.clone(), Self::from_json(prop));
                    }
                }
                let required = object
                    .get("required")
                    .and_then(Value::as_array)
                    .map(|names| {
                        names
                            .iter()
                            .filter_map(Value::as_str)
                            .map(String::from)
                            .collect()
                    })
                    .unwrap_or_default();
                Self::Object {
                    properties,
                    required,
                    description,
                }
            }
            Some("string") => Self::String { description },
            Some("number") => Self::Number { description },
            Some("boolean") => Self::Boolean { description },
            Some("array") => Self::Array {
                items: object.get("items").map(|items| Box::new(Self::from_json(items))),
                description,
            },
            _ => Self::Unconstrained,
        }
    }

    /// Description attached to this node, if any
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        match self {
            Self::Object { description, .. }
            | Self::String { description }
            | Self::Number { description }
            | Self::Boolean { description }
            | Self::Array { description, .. } => description.as_deref(),
            Self::Unconstrained => None,
        }
    }

    /// Render as a plain JSON schema fragment for wire formats that take one
    #[must_use]
    pub fn to_json_value(&self) -> Value {
        match self {
            Self::Object {
                properties,
                required,
                description,
            } => {
                let mut out = serde_json::Map::new();
                out.insert("type".into(), Value::String("object".into()));
                let props: serde_json::Map<String, Value> = properties
                    .iter()
                    .map(|(name, prop)| (name.clone(), prop.to_json_value()))
                    .collect();
                out.insert("properties".into(), Value::Object(props));
                if !required.is_empty() {
                    out.insert(
                        "required".into(),
                        Value::Array(required.iter().map(|r| Value::String(r.clone())).collect()),
                    );
                }
                if let Some(description) = description {
                    out.insert("description".into(), Value::String(description.clone()));
                }
                Value::Object(out)
            }
            Self::String { description } => primitive_schema("string", description.as_deref()),
            Self::Number { description } => primitive_schema("number", description.as_deref()),
            Self::Boolean { description } => primitive_schema("boolean", description.as_deref()),
            Self::Array { items, description } => {
                let mut out = serde_json::Map::new();
                out.insert("type".into(), Value::String("array".into()));
                out.insert(
                    "items".into(),
                    items
                        .as_ref()
                        .map_or_else(|| Value::Object(serde_json::Map::new()), |i| i.to_json_value()),
                );
                if let Some(description) = description {
                    out.insert("description".into(), Value::String(description.clone()));
                }
                Value::Object(out)
            }
            // An empty schema accepts anything
            Self::Unconstrained => Value::Object(serde_json::Map::new()),
        }
    }
}

fn primitive_schema(kind: &str, description: Option<&str>) -> Value {
    let mut out = serde_json::Map::new();
    out.insert("type".into(), Value::String(kind.into()));
    if let Some(description) = description {
        out.insert("description".into(), Value::String(description.into()));
    }
    Value::Object(out)
}

/// Embedding request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbedRequest {
    pub model: String,
    pub text: String,
}

/// Embedding result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbedResponse {
    pub values: Vec<f32>,
}
