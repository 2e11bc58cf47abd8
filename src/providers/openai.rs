use anyhow::{anyhow, Context, Result};
use reqwest::blocking::Client; // we are using blocking API here to make sync calls
use reqwest::StatusCode;
use serde_json::{json, Value};
use std::time::Duration;

use super::{
    base::{Provider, Usage},
    configs::openai::OpenAiProviderConfig,
    types::{message::Message, tool::ToolDefinition},
    utils::{
        check_openai_context_length_error, messages_to_openai_spec, openai_response_to_message,
        tools_to_openai_spec,
    },
};

pub struct OpenAiProvider {
    client: Client,
    config: OpenAiProviderConfig,
}

impl OpenAiProvider {
    pub fn new(config: OpenAiProviderConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(600)) // 10 minutes timeout
            .build()?;

        Ok(Self { client, config })
    }

    fn get_usage(data: &Value) -> Usage {
        let Some(usage) = data.get("usage") else {
            return Usage::default();
        };

        let input_tokens = usage
            .get("prompt_tokens")
            .and_then(|v| v.as_i64())
            .map(|v| v as i32);

        let output_tokens = usage
            .get("completion_tokens")
            .and_then(|v| v.as_i64())
            .map(|v| v as i32);

        let total_tokens = usage
            .get("total_tokens")
            .and_then(|v| v.as_i64())
            .map(|v| v as i32)
            .or(match (input_tokens, output_tokens) {
                (Some(input), Some(output)) => Some(input + output),
                _ => None,
            });

        Usage::new(input_tokens, output_tokens, total_tokens)
    }

    fn post(&self, payload: &Value) -> Result<Value> {
        let url = self.config.completions_url();
        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .json(payload)
            .send()
            .with_context(|| format!("Request to {} failed", url))?;

        let status = response.status();
        match status {
            StatusCode::OK => Ok(response.json().context("Invalid JSON in completion response")?),
            status if status == StatusCode::TOO_MANY_REQUESTS || status.as_u16() >= 500 => {
                Err(anyhow!("Server error: {}", status))
            }
            _ => {
                let body = response.text().unwrap_or_default();
                // The endpoint reports its own errors as {"error": {...}}
                if let Ok(parsed) = serde_json::from_str::<Value>(&body) {
                    if let Some(error) = parsed.get("error") {
                        if let Some(err) = check_openai_context_length_error(error) {
                            return Err(err.into());
                        }
                        return Err(anyhow!("Request failed: {}: {}", status, error));
                    }
                }
                Err(anyhow!("Request failed: {}: {}", status, body))
            }
        }
    }
}

impl Provider for OpenAiProvider {
    fn complete(&self, messages: &[Message], tools: &[ToolDefinition]) -> Result<(Message, Usage)> {
        let mut payload = json!({
            "model": self.config.model,
            "messages": messages_to_openai_spec(messages),
        });

        // Add optional parameters
        if !tools.is_empty() {
            payload["tools"] = json!(tools_to_openai_spec(tools)?);
        }
        if let Some(temp) = self.config.temperature {
            payload["temperature"] = json!(temp);
        }
        if let Some(tokens) = self.config.max_tokens {
            payload["max_tokens"] = json!(tokens);
        }

        let response = self.post(&payload)?;

        if let Some(error) = response.get("error") {
            if let Some(err) = check_openai_context_length_error(error) {
                return Err(err.into());
            }
            return Err(anyhow!("OpenAI API error: {}", error));
        }

        let message = openai_response_to_message(&response)?;
        let usage = Self::get_usage(&response);
        tracing::debug!(
            model = %self.config.model,
            input_tokens = ?usage.input_tokens,
            output_tokens = ?usage.output_tokens,
            "completion received"
        );

        Ok((message, usage))
    }
}
