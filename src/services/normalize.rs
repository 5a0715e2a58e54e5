//! Normalization of foreign SDK results into unified responses

use super::sdk::{GenerateTextResult, SdkUsage};
use crate::content::{ContentPart, FinishReason, UnifiedResponse, UsageMetadata};

/// Build a unified response from an SDK result.
///
/// Part order is fixed: the text part (if any) first, then one function-call
/// part per tool-call request in emission order, then one function-response
/// part per tool-call result in emission order. Natural completion maps to
/// [`FinishReason::Stop`]; backends that report richer reasons map them in
/// their own adapters.
#[must_use]
pub fn normalize_result(result: GenerateTextResult) -> UnifiedResponse {
    let mut parts = Vec::new();

    if !result.text.is_empty() {
        parts.push(ContentPart::Text { text: result.text });
    }

    for call in result.tool_calls {
        parts.push(ContentPart::FunctionCall {
            name: call.name,
            args: call.args,
        });
    }

    // The response part carries the originating call id as its name, so the
    // caller can match results back to calls.
    for tool_result in result.tool_results {
        parts.push(ContentPart::FunctionResponse {
            name: tool_result.call_id,
            response: tool_result.result,
        });
    }

    UnifiedResponse {
        parts,
        finish_reason: FinishReason::Stop,
        usage: result.usage.map(normalize_usage),
        error: None,
    }
}

/// Missing sub-counts default to 0. The usage object itself stays absent
/// only when the SDK reported nothing at all.
fn normalize_usage(usage: SdkUsage) -> UsageMetadata {
    UsageMetadata {
        prompt_token_count: usage.prompt_tokens.unwrap_or(0),
        candidates_token_count: usage.completion_tokens.unwrap_or(0),
        total_token_count: usage.total_tokens.unwrap_or(0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::sdk::{SdkToolCall, SdkToolResult};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_plain_text_completion() {
        let result = GenerateTextResult {
            text: "Paris is the capital of France.".to_string(),
            ..GenerateTextResult::default()
        };

        let response = normalize_result(result);
        assert_eq!(
            response.parts,
            vec![ContentPart::text("Paris is the capital of France.")]
        );
        assert_eq!(response.finish_reason, FinishReason::Stop);
        assert_eq!(response.usage, None);
        assert_eq!(response.error, None);
    }

    #[test]
    fn test_part_order_text_then_calls_then_results() {
        let args_a = serde_json::Map::new();
        let mut args_b = serde_json::Map::new();
        args_b.insert("key".into(), json!("value"));

        let result = GenerateTextResult {
            text: "Working on it.".to_string(),
            tool_calls: vec![
                SdkToolCall {
                    id: "call_a".to_string(),
                    name: "alpha".to_string(),
                    args: args_a.clone(),
                },
                SdkToolCall {
                    id: "call_b".to_string(),
                    name: "beta".to_string(),
                    args: args_b.clone(),
                },
            ],
            tool_results: vec![SdkToolResult {
                call_id: "call_a".to_string(),
                result: json!({ "status": "pending" }),
            }],
            usage: None,
        };

        let response = normalize_result(result);
        assert_eq!(
            response.parts,
            vec![
                ContentPart::text("Working on it."),
                ContentPart::function_call("alpha", args_a),
                ContentPart::function_call("beta", args_b),
                ContentPart::function_response("call_a", json!({ "status": "pending" })),
            ]
        );
    }

    #[test]
    fn test_missing_sub_counts_default_to_zero() {
        let result = GenerateTextResult {
            text: "ok".to_string(),
            usage: Some(SdkUsage {
                prompt_tokens: Some(10),
                completion_tokens: None,
                total_tokens: None,
            }),
            ..GenerateTextResult::default()
        };

        let response = normalize_result(result);
        assert_eq!(
            response.usage,
            Some(UsageMetadata {
                prompt_token_count: 10,
                candidates_token_count: 0,
                total_token_count: 0,
            })
        );
    }

    #[test]
    fn test_usage_absent_when_sdk_reports_none() {
        let result = GenerateTextResult {
            text: "ok".to_string(),
            ..GenerateTextResult::default()
        };
        assert_eq!(normalize_result(result).usage, None);
    }
}
