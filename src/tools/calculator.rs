use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::ToolHandler;
use crate::errors::{AgentError, AgentResult};
use crate::evaluator::{evaluate, EvaluatorMode};
use crate::providers::types::tool::ToolDefinition;

pub const CALCULATOR_TOOL_NAME: &str = "calculator";

#[derive(Debug, Deserialize)]
struct CalculatorInput {
    expression: String,
}

#[derive(Debug, Serialize)]
struct CalculatorOutput {
    result: String,
}

/// Arithmetic tool: `{"expression": "2 + 2"}` -> `{"result": "4.00"}`
#[derive(Debug, Clone, Copy, Default)]
pub struct Calculator {
    mode: EvaluatorMode,
}

impl Calculator {
    pub fn new(mode: EvaluatorMode) -> Self {
        Self { mode }
    }
}

impl ToolHandler for Calculator {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(
            CALCULATOR_TOOL_NAME,
            "Calculate the result of a basic arithmetic expression",
            json!({
                "type": "object",
                "properties": {
                    "expression": {
                        "type": "string",
                        "description": "The arithmetic expression to calculate (e.g., '2 + 2', '5 * 5')"
                    }
                },
                "required": ["expression"]
            }),
        )
    }

    fn call(&self, arguments: &str) -> AgentResult<Value> {
        let input: CalculatorInput = serde_json::from_str(arguments)
            .map_err(|e| AgentError::MalformedArguments(format!("{}: {}", e, arguments)))?;

        let result = evaluate(&input.expression, self.mode)?;

        serde_json::to_value(CalculatorOutput { result })
            .map_err(|e| AgentError::Serialization(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_definition_schema() {
        let definition = Calculator::default().definition();
        assert_eq!(definition.name, CALCULATOR_TOOL_NAME);
        assert_eq!(definition.parameters["required"], json!(["expression"]));
        assert_eq!(
            definition.parameters["properties"]["expression"]["type"],
            "string"
        );
    }

    #[test]
    fn test_call() -> AgentResult<()> {
        let calculator = Calculator::new(EvaluatorMode::Simple);
        assert_eq!(
            calculator.call(r#"{"expression": "10 / 5"}"#)?,
            json!({"result": "2.00"})
        );

        let calculator = Calculator::new(EvaluatorMode::Standard);
        assert_eq!(
            calculator.call(r#"{"expression": "2 + 3 * 4"}"#)?,
            json!({"result": "14"})
        );
        Ok(())
    }

    #[test]
    fn test_malformed_arguments() {
        let calculator = Calculator::default();
        for arguments in ["", "not json", r#"{"expr": "2 + 2"}"#, r#"{"expression": 4}"#] {
            assert!(
                matches!(calculator.call(arguments), Err(AgentError::MalformedArguments(_))),
                "{:?} should be rejected",
                arguments
            );
        }
    }

    #[test]
    fn test_evaluator_failures_surface() {
        let calculator = Calculator::default();
        assert_eq!(
            calculator.call(r#"{"expression": "10 / 0"}"#),
            Err(AgentError::EvaluationError("division by zero".to_string()))
        );
        assert!(matches!(
            calculator.call(r#"{"expression": "1 + 2 + 3"}"#),
            Err(AgentError::InvalidExpression(_))
        ));
    }
}
