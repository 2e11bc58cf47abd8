use std::collections::HashMap;

use crate::errors::{AgentError, AgentResult};
use crate::providers::types::message::{Message, Role};

/// Append-only dialogue history, sent in full on every request.
///
/// A tool message is only accepted when an earlier assistant message asked
/// for its `tool_call_id` and that request is still unanswered. Requests are
/// counted, so an id requested twice takes two results.
#[derive(Debug, Clone, Default)]
pub struct Conversation {
    messages: Vec<Message>,
    pending_calls: HashMap<String, usize>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    /// A conversation seeded with a single system message
    pub fn with_system(prompt: &str) -> Self {
        Self {
            messages: vec![Message::system(prompt)],
            pending_calls: HashMap::new(),
        }
    }

    pub fn push(&mut self, message: Message) -> AgentResult<()> {
        match message.role {
            Role::Tool => {
                let id = message.tool_call_id.as_deref().unwrap_or_default();
                match self.pending_calls.get_mut(id) {
                    Some(count) if *count > 1 => *count -= 1,
                    Some(_) => {
                        self.pending_calls.remove(id);
                    }
                    None => {
                        return Err(AgentError::InvalidConversation(format!(
                            "tool result '{}' does not answer an outstanding tool call",
                            id
                        )));
                    }
                }
            }
            Role::Assistant => {
                for call in &message.tool_calls {
                    *self.pending_calls.entry(call.id.clone()).or_insert(0) += 1;
                }
            }
            Role::System | Role::User => {}
        }
        self.messages.push(message);
        Ok(())
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Tool call ids the model is still waiting on
    pub fn has_pending_calls(&self) -> bool {
        !self.pending_calls.is_empty()
    }
}
