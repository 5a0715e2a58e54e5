//! Conversation flattening for flat-prompt backends
//!
//! The bridged SDK takes one prompt string, so the structured multi-turn
//! conversation is rendered into a transcript: one line per contributing
//! part, blank-line separated.

use crate::content::{ContentPart, ConversationTurn};

/// Prompt substituted when the conversation flattens to nothing.
///
/// Callers must not depend on empty-prompt passthrough. Revisit if this
/// turns out to mask callers that send only unsupported part types.
pub const DEFAULT_PROMPT: &str = "Hello";

/// Flatten a structured conversation into a plain-text transcript.
///
/// Per turn: the joined text of its text parts renders first as
/// `"{Role}: {text}"`, then one `"{Role} called tool: {name} with args:
/// {json}"` line per function call, then one `"Tool {name} returned: {json}"`
/// line per function response. Turns contributing no line are skipped. An
/// empty transcript becomes [`DEFAULT_PROMPT`].
#[must_use]
pub fn flatten_conversation(turns: &[ConversationTurn]) -> String {
    let mut lines: Vec<String> = Vec::new();

    for turn in turns {
        let label = turn.role.transcript_label();

        let text: String = turn
            .parts
            .iter()
            .filter_map(|part| match part {
                ContentPart::Text { text } => Some(text.as_str()),
                _ => None,
            })
            .collect();
        if !text.is_empty() {
            lines.push(format!("{label}: {text}"));
        }

        for part in &turn.parts {
            if let ContentPart::FunctionCall { name, args } = part {
                let args = serde_json::Value::Object(args.clone());
                lines.push(format!("{label} called tool: {name} with args: {args}"));
            }
        }

        for part in &turn.parts {
            if let ContentPart::FunctionResponse { name, response } = part {
                lines.push(format!("Tool {name} returned: {response}"));
            }
        }
    }

    if lines.is_empty() {
        DEFAULT_PROMPT.to_string()
    } else {
        lines.join("\n\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::Role;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_simple_exchange() {
        let turns = vec![
            ConversationTurn::user("What is 2+2?"),
            ConversationTurn::model("4"),
        ];
        assert_eq!(
            flatten_conversation(&turns),
            "User: What is 2+2?\n\nAssistant: 4"
        );
    }

    #[test]
    fn test_text_parts_join_without_separator() {
        let turns = vec![ConversationTurn {
            role: Role::User,
            parts: vec![ContentPart::text("Hel"), ContentPart::text("lo?")],
        }];
        assert_eq!(flatten_conversation(&turns), "User: Hello?");
    }

    #[test]
    fn test_function_call_and_response_lines() {
        let mut args = serde_json::Map::new();
        args.insert("path".into(), json!("src/main.rs"));

        let turns = vec![
            ConversationTurn {
                role: Role::Model,
                parts: vec![
                    ContentPart::text("Reading the file."),
                    ContentPart::function_call("read_file", args),
                ],
            },
            ConversationTurn {
                role: Role::User,
                parts: vec![ContentPart::function_response(
                    "read_file",
                    json!({"content": "fn main() {}"}),
                )],
            },
        ];

        assert_eq!(
            flatten_conversation(&turns),
            "Assistant: Reading the file.\n\n\
             Assistant called tool: read_file with args: {\"path\":\"src/main.rs\"}\n\n\
             Tool read_file returned: {\"content\":\"fn main() {}\"}"
        );
    }

    #[test]
    fn test_contributing_text_comes_before_calls_within_a_turn() {
        let turns = vec![ConversationTurn {
            role: Role::Model,
            parts: vec![
                ContentPart::function_call("probe", serde_json::Map::new()),
                ContentPart::text("after the call part"),
            ],
        }];
        assert_eq!(
            flatten_conversation(&turns),
            "Assistant: after the call part\n\nAssistant called tool: probe with args: {}"
        );
    }

    #[test]
    fn test_empty_turns_are_skipped() {
        let turns = vec![
            ConversationTurn {
                role: Role::User,
                parts: vec![ContentPart::text("")],
            },
            ConversationTurn::model("Still here"),
        ];
        assert_eq!(flatten_conversation(&turns), "Assistant: Still here");
    }

    #[test]
    fn test_empty_conversation_becomes_default_prompt() {
        assert_eq!(flatten_conversation(&[]), DEFAULT_PROMPT);

        let turns = vec![ConversationTurn {
            role: Role::User,
            parts: vec![],
        }];
        assert_eq!(flatten_conversation(&turns), "Hello");
    }
}
