use serde::{Deserialize, Serialize};
use thiserror::Error;

#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Deserialize, Serialize)]
pub enum AgentError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Malformed tool arguments: {0}")]
    MalformedArguments(String),

    #[error("Invalid expression: {0}")]
    InvalidExpression(String),

    #[error("Evaluation error: {0}")]
    EvaluationError(String),

    #[error("Tool not found: {0}")]
    UnknownTool(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Invalid tool: {0}")]
    InvalidTool(String),

    #[error("Invalid conversation: {0}")]
    InvalidConversation(String),
}

pub type AgentResult<T> = Result<T, AgentError>;

impl AgentError {
    /// Wrap a provider failure, keeping the whole cause chain in the message
    pub fn transport(err: anyhow::Error) -> Self {
        AgentError::Transport(format!("{:#}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    #[test]
    fn test_transport_keeps_cause_chain() {
        let err = anyhow!("connection refused").context("Request failed");
        let wrapped = AgentError::transport(err);
        assert_eq!(
            wrapped.to_string(),
            "Transport error: Request failed: connection refused"
        );
    }

    #[test]
    fn test_error_serialization() -> anyhow::Result<()> {
        let err = AgentError::UnknownTool("weather".to_string());
        let serialized = serde_json::to_string(&err)?;
        let deserialized: AgentError = serde_json::from_str(&serialized)?;
        assert_eq!(err, deserialized);
        Ok(())
    }
}
