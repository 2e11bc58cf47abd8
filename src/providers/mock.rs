use anyhow::{anyhow, Result};
use std::sync::{Arc, Mutex};

use super::base::{Provider, Usage};
use super::types::message::Message;
use super::types::tool::ToolDefinition;

/// One `complete` call as the provider saw it
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub messages: Vec<Message>,
    pub tools: Vec<ToolDefinition>,
}

/// A mock provider that returns pre-configured responses for testing.
///
/// Clones share the same script and request log, so a test can hand one
/// clone to an agent and inspect the other afterwards.
#[derive(Clone, Default)]
pub struct MockProvider {
    responses: Arc<Mutex<Vec<Result<Message, String>>>>,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl MockProvider {
    /// Create a new mock provider with a sequence of responses
    pub fn new(responses: Vec<Message>) -> Self {
        Self {
            responses: Arc::new(Mutex::new(responses.into_iter().map(Ok).collect())),
            requests: Arc::default(),
        }
    }

    /// Queue a transport failure as the next scripted outcome
    pub fn push_failure(&self, reason: &str) {
        if let Ok(mut responses) = self.responses.lock() {
            responses.push(Err(reason.to_string()));
        }
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests
            .lock()
            .map(|requests| requests.clone())
            .unwrap_or_default()
    }
}

impl Provider for MockProvider {
    fn complete(&self, messages: &[Message], tools: &[ToolDefinition]) -> Result<(Message, Usage)> {
        self.requests
            .lock()
            .map_err(|_| anyhow!("mock request log poisoned"))?
            .push(RecordedRequest {
                messages: messages.to_vec(),
                tools: tools.to_vec(),
            });

        let mut responses = self
            .responses
            .lock()
            .map_err(|_| anyhow!("mock responses poisoned"))?;
        if responses.is_empty() {
            // Return empty response if no more pre-configured responses
            return Ok((Message::assistant(""), Usage::default()));
        }
        match responses.remove(0) {
            Ok(message) => Ok((message, Usage::new(Some(1), Some(1), Some(2)))),
            Err(reason) => Err(anyhow!("{}", reason)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scripted_responses_in_order() -> Result<()> {
        let provider = MockProvider::new(vec![Message::assistant("one"), Message::assistant("two")]);
        provider.push_failure("connection reset");

        let (first, _) = provider.complete(&[Message::user("a")], &[])?;
        let (second, _) = provider.complete(&[Message::user("b")], &[])?;
        let third = provider.complete(&[Message::user("c")], &[]);
        let (fallback, _) = provider.complete(&[Message::user("d")], &[])?;

        assert_eq!(first.text(), "one");
        assert_eq!(second.text(), "two");
        assert_eq!(third.unwrap_err().to_string(), "connection reset");
        assert_eq!(fallback.text(), "");
        Ok(())
    }

    #[test]
    fn test_clones_share_request_log() -> Result<()> {
        let provider = MockProvider::new(vec![Message::assistant("hi")]);
        let observer = provider.clone();

        provider.complete(&[Message::user("hello")], &[])?;

        let requests = observer.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].messages[0].text(), "hello");
        assert!(requests[0].tools.is_empty());
        Ok(())
    }
}
