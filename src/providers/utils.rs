use anyhow::{anyhow, Result};
use lazy_static::lazy_static;
use regex::Regex;
use serde_json::{json, Value};
use std::collections::HashSet;

use super::types::{
    message::{Message, Role},
    objectid::create_call_id,
    tool::{ToolCall, ToolDefinition},
};

/// Convert internal Message format to OpenAI's API message specification
pub fn messages_to_openai_spec(messages: &[Message]) -> Vec<Value> {
    messages
        .iter()
        .map(|message| {
            let mut converted = json!({
                "role": message.role,
                "content": message.content,
            });

            if !message.tool_calls.is_empty() {
                let tool_calls: Vec<Value> = message
                    .tool_calls
                    .iter()
                    .map(|call| {
                        json!({
                            "id": call.id,
                            "type": "function",
                            "function": {
                                "name": call.name,
                                "arguments": call.arguments,
                            }
                        })
                    })
                    .collect();
                converted["tool_calls"] = json!(tool_calls);
            }

            if let Some(id) = &message.tool_call_id {
                converted["tool_call_id"] = json!(id);
            }

            converted
        })
        .collect()
}

/// Convert internal tool definitions to OpenAI's API tool specification
pub fn tools_to_openai_spec(tools: &[ToolDefinition]) -> Result<Vec<Value>> {
    let mut tool_names = HashSet::new();
    let mut result = Vec::new();

    for tool in tools {
        if !tool_names.insert(&tool.name) {
            return Err(anyhow!("Duplicate tool name: {}", tool.name));
        }

        result.push(json!({
            "type": "function",
            "function": {
                "name": tool.name,
                "description": tool.description,
                "parameters": tool.parameters,
            }
        }));
    }

    Ok(result)
}

/// Convert OpenAI's API response to internal Message format, using the first choice
pub fn openai_response_to_message(response: &Value) -> Result<Message> {
    let original = response
        .get("choices")
        .and_then(|choices| choices.as_array())
        .and_then(|choices| choices.first())
        .and_then(|choice| choice.get("message"))
        .ok_or_else(|| anyhow!("No choices in completion response"))?;

    let content = original
        .get("content")
        .and_then(|text| text.as_str())
        .map(str::to_string);

    let mut tool_calls = Vec::new();
    let mut seen_ids = HashSet::new();
    if let Some(calls) = original.get("tool_calls").and_then(|calls| calls.as_array()) {
        for call in calls {
            // Every result must reference exactly one call, so missing, empty or
            // repeated ids are replaced with fresh ones
            let id = match call["id"].as_str() {
                Some(id) if !id.is_empty() && !seen_ids.contains(id) => id.to_string(),
                _ => create_call_id(),
            };
            seen_ids.insert(id.clone());
            let name = call["function"]["name"].as_str().unwrap_or_default();
            // Arguments are normally a JSON-encoded string, but tolerate an inline object
            let arguments = match &call["function"]["arguments"] {
                Value::String(raw) => raw.clone(),
                Value::Null => String::new(),
                other => other.to_string(),
            };
            tool_calls.push(ToolCall::new(id, name, arguments));
        }
    }

    if tool_calls.is_empty() {
        Ok(Message::assistant(content.as_deref().unwrap_or_default()))
    } else {
        Message::new(Role::Assistant, content, tool_calls, None)
    }
}

lazy_static! {
    static ref FUNCTION_NAME: Regex = Regex::new(r"^[a-zA-Z0-9_-]{1,64}$").unwrap();
}

pub fn is_valid_function_name(name: &str) -> bool {
    FUNCTION_NAME.is_match(name)
}

#[derive(Debug, thiserror::Error)]
#[error("Input message too long. Message: {0}")]
pub struct InitialMessageTooLargeError(String);

pub fn check_openai_context_length_error(error: &Value) -> Option<InitialMessageTooLargeError> {
    let code = error.get("code")?.as_str()?;
    if code == "context_length_exceeded" || code == "string_above_max_length" {
        let message = error
            .get("message")
            .and_then(|m| m.as_str())
            .unwrap_or("Unknown error")
            .to_string();
        Some(InitialMessageTooLargeError(message))
    } else {
        None
    }
}
