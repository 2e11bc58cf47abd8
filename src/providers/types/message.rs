use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

use super::objectid::create_object_id;
use super::tool::ToolCall;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub id: String,
    pub created: i64,
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

impl Message {
    pub fn new(
        role: Role,
        content: Option<String>,
        tool_calls: Vec<ToolCall>,
        tool_call_id: Option<String>,
    ) -> Result<Self> {
        let msg = Self::build(role, content, tool_calls, tool_call_id);
        msg.validate()?;
        Ok(msg)
    }

    fn build(
        role: Role,
        content: Option<String>,
        tool_calls: Vec<ToolCall>,
        tool_call_id: Option<String>,
    ) -> Self {
        Self {
            role,
            id: create_object_id("msg"),
            created: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_secs() as i64)
                .unwrap_or_default(),
            content,
            tool_calls,
            tool_call_id,
        }
    }

    fn validate(&self) -> Result<()> {
        if self.role != Role::Tool && self.tool_call_id.is_some() {
            return Err(anyhow!("Only tool messages may carry a tool_call_id"));
        }
        if self.role != Role::Assistant && !self.tool_calls.is_empty() {
            return Err(anyhow!("Only assistant messages may carry tool calls"));
        }
        match self.role {
            Role::Assistant => {
                if self.content.is_none() && self.tool_calls.is_empty() {
                    return Err(anyhow!("Assistant message must include content or tool calls"));
                }
            }
            Role::Tool => {
                if self.tool_call_id.is_none() {
                    return Err(anyhow!("Tool message must reference a tool_call_id"));
                }
            }
            Role::System | Role::User => {}
        }
        Ok(())
    }

    pub fn system(text: &str) -> Self {
        Self::build(Role::System, Some(text.to_string()), Vec::new(), None)
    }

    pub fn user(text: &str) -> Self {
        Self::build(Role::User, Some(text.to_string()), Vec::new(), None)
    }

    pub fn assistant(text: &str) -> Self {
        Self::build(Role::Assistant, Some(text.to_string()), Vec::new(), None)
    }

    /// An assistant turn that asks for tool invocations; content may be absent
    pub fn assistant_with_tool_calls(content: Option<String>, tool_calls: Vec<ToolCall>) -> Result<Self> {
        if tool_calls.is_empty() {
            return Err(anyhow!("Tool call message requires at least one tool call"));
        }
        Self::new(Role::Assistant, content, tool_calls, None)
    }

    pub fn tool(tool_call_id: &str, content: &str) -> Self {
        Self::build(
            Role::Tool,
            Some(content.to_string()),
            Vec::new(),
            Some(tool_call_id.to_string()),
        )
    }

    /// Text content, empty when the message only carries tool calls
    pub fn text(&self) -> &str {
        self.content.as_deref().unwrap_or_default()
    }

    pub fn has_tool_calls(&self) -> bool {
        !self.tool_calls.is_empty()
    }
}
