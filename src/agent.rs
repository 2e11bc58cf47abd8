use anyhow::{anyhow, Result};
use serde_json::json;
use std::env;
use std::fmt;
use std::str::FromStr;

use crate::conversation::Conversation;
use crate::errors::{AgentError, AgentResult};
use crate::evaluator::EvaluatorMode;
use crate::providers::base::{Provider, Usage};
use crate::providers::types::message::Message;
use crate::providers::types::tool::{ToolCall, ToolDefinition};
use crate::tools::ToolRegistry;

/// What to do when a tool handler fails
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ToolFailurePolicy {
    /// Stop the turn and return the failure; earlier tool results stay in the history
    #[default]
    Abort,
    /// Hand the failure back to the model as the tool result and keep going
    Report,
}

impl FromStr for ToolFailurePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "abort" => Ok(ToolFailurePolicy::Abort),
            "report" => Ok(ToolFailurePolicy::Report),
            other => Err(format!("unknown tool failure policy '{}', expected abort or report", other)),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AgentConfig {
    /// Seeds the conversation with a system message when set
    pub system_prompt: Option<String>,
    /// Variant used by the calculator tool
    pub evaluator: EvaluatorMode,
    pub tool_failure: ToolFailurePolicy,
}

impl AgentConfig {
    /// Read `AGENT_SYSTEM_PROMPT`, `AGENT_EVALUATOR` and `AGENT_TOOL_FAILURE`
    pub fn from_env() -> Result<Self> {
        fn parsed<T: FromStr<Err = String>>(key: &str) -> Result<Option<T>> {
            match env::var(key) {
                Ok(raw) => raw
                    .parse::<T>()
                    .map(Some)
                    .map_err(|e| anyhow!("Environment variable '{}': {}", key, e)),
                Err(_) => Ok(None),
            }
        }

        Ok(Self {
            system_prompt: env::var("AGENT_SYSTEM_PROMPT")
                .ok()
                .filter(|prompt| !prompt.trim().is_empty()),
            evaluator: parsed("AGENT_EVALUATOR")?.unwrap_or_default(),
            tool_failure: parsed("AGENT_TOOL_FAILURE")?.unwrap_or_default(),
        })
    }
}

/// Where a turn currently stands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnState {
    AwaitingUserInput,
    RequestSent,
    ToolsRequested,
    ToolsExecuting,
    FinalRequestSent,
    ResponseReady,
    Failed,
}

impl fmt::Display for TurnState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Agent drives a chat model through one round of local tool calls per turn
pub struct Agent {
    provider: Box<dyn Provider>,
    tools: ToolRegistry,
    conversation: Conversation,
    tool_failure: ToolFailurePolicy,
    state: TurnState,
    usage: Usage,
}

impl Agent {
    /// Create an agent with the calculator tool
    pub fn new(provider: Box<dyn Provider>, config: AgentConfig) -> Self {
        let tools = ToolRegistry::with_calculator(config.evaluator);
        Self::with_tools(provider, tools, config)
    }

    /// Create an agent with a caller-supplied tool registry
    pub fn with_tools(provider: Box<dyn Provider>, tools: ToolRegistry, config: AgentConfig) -> Self {
        let conversation = match &config.system_prompt {
            Some(prompt) => Conversation::with_system(prompt),
            None => Conversation::new(),
        };
        Self {
            provider,
            tools,
            conversation,
            tool_failure: config.tool_failure,
            state: TurnState::AwaitingUserInput,
            usage: Usage::default(),
        }
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    /// Last state reached; `ResponseReady` or `Failed` once a turn has run
    pub fn state(&self) -> TurnState {
        self.state
    }

    /// Token usage summed over every request of this session
    pub fn usage(&self) -> Usage {
        self.usage
    }

    /// Run one turn: send the user's text, serve any tool calls, return the final answer.
    ///
    /// The conversation keeps everything appended during the turn, including
    /// on failure, so later calls see the full history.
    pub fn process_message(&mut self, user_text: &str) -> AgentResult<String> {
        self.state = TurnState::AwaitingUserInput;
        match self.run_turn(user_text) {
            Ok(answer) => {
                self.transition(TurnState::ResponseReady);
                Ok(answer)
            }
            Err(err) => {
                tracing::error!(error = %err, "turn failed");
                self.transition(TurnState::Failed);
                Err(err)
            }
        }
    }

    fn run_turn(&mut self, user_text: &str) -> AgentResult<String> {
        self.conversation.push(Message::user(user_text))?;

        let definitions = self.tools.definitions();
        self.transition(TurnState::RequestSent);
        let response = self.request(&definitions)?;

        if !response.has_tool_calls() {
            let answer = response.text().to_string();
            self.conversation.push(response)?;
            return Ok(answer);
        }

        self.transition(TurnState::ToolsRequested);
        tracing::info!(count = response.tool_calls.len(), "Function calls detected");
        let calls = response.tool_calls.clone();
        self.conversation.push(response)?;

        self.transition(TurnState::ToolsExecuting);
        for call in &calls {
            self.execute_tool_call(call)?;
        }

        self.transition(TurnState::FinalRequestSent);
        let final_response = self.request(&[])?;
        if final_response.has_tool_calls() {
            tracing::warn!(
                count = final_response.tool_calls.len(),
                "ignoring tool calls in final response"
            );
        }
        let answer = final_response.text().to_string();
        self.conversation.push(Message::assistant(&answer))?;
        Ok(answer)
    }

    fn request(&mut self, tools: &[ToolDefinition]) -> AgentResult<Message> {
        let (message, usage) = self
            .provider
            .complete(self.conversation.messages(), tools)
            .map_err(AgentError::transport)?;
        self.usage.accumulate(&usage);
        Ok(message)
    }

    fn execute_tool_call(&mut self, call: &ToolCall) -> AgentResult<()> {
        tracing::info!(tool = %call.name, id = %call.id, "Processing tool call");

        let output = match self.tools.dispatch(&call.name, &call.arguments) {
            Ok(value) => {
                serde_json::to_string(&value).map_err(|e| AgentError::Serialization(e.to_string()))?
            }
            // Answer the call anyway so the model is not left waiting on it
            Err(AgentError::UnknownTool(name)) => {
                tracing::warn!(tool = %name, "model requested an unknown tool");
                error_payload(&format!("tool not found: {}", name))
            }
            Err(err) => match self.tool_failure {
                ToolFailurePolicy::Abort => return Err(err),
                ToolFailurePolicy::Report => {
                    tracing::warn!(tool = %call.name, error = %err, "reporting tool failure to model");
                    error_payload(&err.to_string())
                }
            },
        };

        self.conversation.push(Message::tool(&call.id, &output))
    }

    fn transition(&mut self, next: TurnState) {
        tracing::debug!(from = %self.state, to = %next, "turn state");
        self.state = next;
    }
}

fn error_payload(message: &str) -> String {
    json!({ "error": message }).to_string()
}
