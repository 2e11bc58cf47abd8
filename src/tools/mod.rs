pub mod calculator;

use serde_json::Value;
use std::fmt::Debug;

use crate::errors::{AgentError, AgentResult};
use crate::evaluator::EvaluatorMode;
use crate::providers::types::tool::ToolDefinition;
use crate::providers::utils::is_valid_function_name;

pub use calculator::Calculator;

/// A local capability the model can invoke.
///
/// Handlers receive the argument payload exactly as the model produced it
/// and return a JSON value that the agent serializes into the tool result.
pub trait ToolHandler: Send + Sync {
    /// Schema advertised to the model
    fn definition(&self) -> ToolDefinition;

    /// Run the tool against a serialized argument payload
    fn call(&self, arguments: &str) -> AgentResult<Value>;
}

/// A tool definition bound to the handler that serves it
pub struct ToolBinding {
    definition: ToolDefinition,
    handler: Box<dyn ToolHandler>,
}

impl ToolBinding {
    pub fn new(handler: Box<dyn ToolHandler>) -> Self {
        Self {
            definition: handler.definition(),
            handler,
        }
    }

    pub fn definition(&self) -> &ToolDefinition {
        &self.definition
    }

    pub fn name(&self) -> &str {
        &self.definition.name
    }
}

impl Debug for ToolBinding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolBinding")
            .field("name", &self.definition.name)
            .field("description", &self.definition.description)
            .field("handler", &"<handler>")
            .finish()
    }
}

/// Fixed set of tools, looked up by exact name
#[derive(Debug, Default)]
pub struct ToolRegistry {
    bindings: Vec<ToolBinding>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the calculator tool backed by the given evaluator
    pub fn with_calculator(mode: EvaluatorMode) -> Self {
        let mut registry = Self::new();
        registry
            .bindings
            .push(ToolBinding::new(Box::new(Calculator::new(mode))));
        registry
    }

    /// Add a tool; names must be unique and usable as function names
    pub fn register(&mut self, handler: Box<dyn ToolHandler>) -> AgentResult<()> {
        let binding = ToolBinding::new(handler);
        if !is_valid_function_name(binding.name()) {
            return Err(AgentError::InvalidTool(format!(
                "'{}' must match [a-zA-Z0-9_-]{{1,64}}",
                binding.name()
            )));
        }
        if self.get(binding.name()).is_some() {
            return Err(AgentError::InvalidTool(format!(
                "'{}' is already registered",
                binding.name()
            )));
        }
        self.bindings.push(binding);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&ToolBinding> {
        self.bindings.iter().find(|b| b.name() == name)
    }

    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.bindings.iter().map(|b| b.definition.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Invoke the tool called `name` with a serialized argument payload
    pub fn dispatch(&self, name: &str, arguments: &str) -> AgentResult<Value> {
        let binding = self
            .get(name)
            .ok_or_else(|| AgentError::UnknownTool(name.to_string()))?;
        binding.handler.call(arguments)
    }
}
