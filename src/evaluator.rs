//! Arithmetic expression evaluation for the calculator tool.
//!
//! Two variants are available. [`EvaluatorMode::Simple`] accepts exactly
//! one binary operator between two numeric operands and always renders the
//! result with two decimals. [`EvaluatorMode::Standard`] parses with
//! `evalexpr`, giving the usual precedence, parentheses and unary signs;
//! integer arithmetic stays integral and renders without a fractional part.

use evalexpr::{Node, Operator, Value};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::errors::AgentError;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvalError {
    #[error("invalid expression: {0}")]
    InvalidExpression(String),

    #[error("{0}")]
    EvaluationError(String),
}

impl From<EvalError> for AgentError {
    fn from(err: EvalError) -> Self {
        match err {
            EvalError::InvalidExpression(msg) => AgentError::InvalidExpression(msg),
            EvalError::EvaluationError(msg) => AgentError::EvaluationError(msg),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EvaluatorMode {
    #[default]
    Simple,
    Standard,
}

impl FromStr for EvaluatorMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "simple" => Ok(EvaluatorMode::Simple),
            "standard" => Ok(EvaluatorMode::Standard),
            other => Err(format!("unknown evaluator mode '{}', expected simple or standard", other)),
        }
    }
}

impl fmt::Display for EvaluatorMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EvaluatorMode::Simple => write!(f, "simple"),
            EvaluatorMode::Standard => write!(f, "standard"),
        }
    }
}

/// Numeric result of the standard evaluator
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    Int(i64),
    Float(f64),
}

impl Number {
    pub fn as_f64(&self) -> f64 {
        match *self {
            Number::Int(i) => i as f64,
            Number::Float(f) => f,
        }
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Number::Int(i) => write!(f, "{}", i),
            Number::Float(x) => write!(f, "{}", format_result(*x)),
        }
    }
}

/// Render a floating-point result with two decimal digits
pub fn format_result(value: f64) -> String {
    // avoid "-0.00"
    let value = if value == 0.0 { 0.0 } else { value };
    format!("{:.2}", value)
}

/// Evaluate `expression` with the given variant and render the result as text
pub fn evaluate(expression: &str, mode: EvaluatorMode) -> Result<String, EvalError> {
    match mode {
        EvaluatorMode::Simple => evaluate_simple(expression).map(format_result),
        EvaluatorMode::Standard => evaluate_standard(expression).map(|n| n.to_string()),
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Token {
    Num(Number),
    Op(char),
    Unsupported(char),
    LParen,
    RParen,
}

fn tokenize(expression: &str) -> Result<Vec<Token>, EvalError> {
    let chars: Vec<char> = expression.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            c if c.is_whitespace() => i += 1,
            '0'..='9' | '.' => {
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                    i += 1;
                }
                i += exponent_len(&chars[i..]);
                let literal: String = chars[start..i].iter().collect();
                tokens.push(Token::Num(parse_literal(&literal)?));
            }
            '+' | '-' | '*' | '/' => {
                tokens.push(Token::Op(c));
                i += 1;
            }
            '^' | '%' => {
                tokens.push(Token::Unsupported(c));
                i += 1;
            }
            '(' => {
                tokens.push(Token::LParen);
                i += 1;
            }
            ')' => {
                tokens.push(Token::RParen);
                i += 1;
            }
            other => {
                return Err(EvalError::InvalidExpression(format!(
                    "unexpected character '{}' in '{}'",
                    other, expression
                )))
            }
        }
    }

    Ok(tokens)
}

/// Length of an `e3` / `E-7` style exponent at the start of `rest`, 0 when there is none
fn exponent_len(rest: &[char]) -> usize {
    match rest {
        ['e' | 'E', '+' | '-', d, ..] if d.is_ascii_digit() => {
            2 + rest[2..].iter().take_while(|c| c.is_ascii_digit()).count()
        }
        ['e' | 'E', d, ..] if d.is_ascii_digit() => {
            1 + rest[1..].iter().take_while(|c| c.is_ascii_digit()).count()
        }
        _ => 0,
    }
}

fn parse_literal(literal: &str) -> Result<Number, EvalError> {
    let invalid = || EvalError::InvalidExpression(format!("'{}' is not a number", literal));
    if !literal.contains(['.', 'e', 'E']) {
        if let Ok(i) = literal.parse::<i64>() {
            return Ok(Number::Int(i));
        }
    }
    let value = literal.parse::<f64>().map_err(|_| invalid())?;
    if !value.is_finite() {
        return Err(invalid());
    }
    Ok(Number::Float(value))
}

fn reject_unsupported(tokens: &[Token]) -> Result<(), EvalError> {
    match tokens.iter().find_map(|t| match t {
        Token::Unsupported(c) => Some(*c),
        _ => None,
    }) {
        Some(op) => Err(EvalError::EvaluationError(format!(
            "unsupported operator '{}'",
            op
        ))),
        None => Ok(()),
    }
}

fn finite(value: f64) -> Result<f64, EvalError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(EvalError::EvaluationError(
            "result is not a finite number".to_string(),
        ))
    }
}

fn apply_float(a: f64, op: char, b: f64) -> Result<f64, EvalError> {
    let result = match op {
        '+' => a + b,
        '-' => a - b,
        '*' => a * b,
        '/' => {
            if b == 0.0 {
                return Err(EvalError::EvaluationError("division by zero".to_string()));
            }
            a / b
        }
        other => {
            return Err(EvalError::EvaluationError(format!(
                "unsupported operator '{}'",
                other
            )))
        }
    };
    finite(result)
}

/// Evaluate `<number> <op> <number>` with op one of `+ - * /`
pub fn evaluate_simple(expression: &str) -> Result<f64, EvalError> {
    let tokens = tokenize(expression)?;
    reject_unsupported(&tokens)?;

    let operators = tokens.iter().filter(|t| matches!(t, Token::Op(_))).count();
    if operators != 1 {
        return Err(EvalError::InvalidExpression(format!(
            "expected exactly one operator in '{}', found {}",
            expression.trim(),
            operators
        )));
    }

    match tokens.as_slice() {
        [Token::Num(a), Token::Op(op), Token::Num(b)] => apply_float(a.as_f64(), *op, b.as_f64()),
        _ => Err(EvalError::InvalidExpression(format!(
            "expected '<number> <operator> <number>', got '{}'",
            expression.trim()
        ))),
    }
}

/// Deepest mix of open parentheses and unary signs the tree evaluator is given
const MAX_NESTING: usize = 64;
/// Longest expression, in tokens, the tree evaluator is given
const MAX_TOKENS: usize = 512;

/// Evaluate an expression with standard precedence and parentheses.
///
/// Input is checked against the local tokenizer first, so only numbers,
/// `+ - * /` and parentheses reach `evalexpr`; the resulting operator tree
/// is then folded here so that `/` always divides as floating point.
pub fn evaluate_standard(expression: &str) -> Result<Number, EvalError> {
    let tokens = tokenize(expression)?;
    reject_unsupported(&tokens)?;

    if tokens.is_empty() {
        return Err(EvalError::InvalidExpression("empty expression".to_string()));
    }
    if nesting_depth(&tokens) > MAX_NESTING {
        return Err(EvalError::InvalidExpression(
            "expression nested too deeply".to_string(),
        ));
    }
    if tokens.len() > MAX_TOKENS {
        return Err(EvalError::InvalidExpression("expression too long".to_string()));
    }

    if tokens.windows(2).any(|pair| {
        matches!(pair[0], Token::Num(_) | Token::RParen)
            && matches!(pair[1], Token::Num(_) | Token::LParen)
    }) {
        return Err(EvalError::InvalidExpression(format!(
            "missing operator in '{}'",
            expression.trim()
        )));
    }

    let tree = evalexpr::build_operator_tree(&render(&tokens)).map_err(|e| {
        EvalError::InvalidExpression(format!("{} in '{}'", e, expression.trim()))
    })?;
    reduce(&tree, expression)
}

fn nesting_depth(tokens: &[Token]) -> usize {
    let mut parens = 0usize;
    let mut signs = 0usize;
    let mut deepest = 0usize;
    let mut expect_operand = true;

    for token in tokens {
        match token {
            Token::LParen => {
                parens += 1;
                expect_operand = true;
            }
            Token::RParen => {
                parens = parens.saturating_sub(1);
                expect_operand = false;
            }
            Token::Op(_) if expect_operand => signs += 1,
            Token::Op(_) => expect_operand = true,
            Token::Num(_) => expect_operand = false,
            Token::Unsupported(_) => {}
        }
        deepest = deepest.max(parens + signs);
    }
    deepest
}

/// Canonical text for evalexpr: floats always carry a '.', never an exponent
fn render(tokens: &[Token]) -> String {
    tokens
        .iter()
        .map(|token| match token {
            Token::Num(Number::Int(i)) => i.to_string(),
            Token::Num(Number::Float(f)) => {
                let text = f.to_string();
                if text.contains('.') {
                    text
                } else {
                    format!("{}.0", text)
                }
            }
            Token::Op(c) | Token::Unsupported(c) => c.to_string(),
            Token::LParen => "(".to_string(),
            Token::RParen => ")".to_string(),
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn reduce(node: &Node, source: &str) -> Result<Number, EvalError> {
    match (node.operator(), node.children()) {
        (Operator::RootNode, [inner]) => reduce(inner, source),
        (Operator::Const { value: Value::Int(i) }, []) => Ok(Number::Int(*i)),
        (Operator::Const { value: Value::Float(f) }, []) => Ok(Number::Float(*f)),
        (Operator::Neg, [inner]) => Ok(match reduce(inner, source)? {
            Number::Int(i) => i
                .checked_neg()
                .map(Number::Int)
                .unwrap_or(Number::Float(-(i as f64))),
            Number::Float(f) => Number::Float(-f),
        }),
        (Operator::Add, [lhs, rhs]) => combine(reduce(lhs, source)?, '+', reduce(rhs, source)?),
        (Operator::Sub, [lhs, rhs]) => combine(reduce(lhs, source)?, '-', reduce(rhs, source)?),
        (Operator::Mul, [lhs, rhs]) => combine(reduce(lhs, source)?, '*', reduce(rhs, source)?),
        (Operator::Div, [lhs, rhs]) => combine(reduce(lhs, source)?, '/', reduce(rhs, source)?),
        _ => Err(EvalError::InvalidExpression(format!(
            "incomplete expression '{}'",
            source.trim()
        ))),
    }
}

fn combine(lhs: Number, op: char, rhs: Number) -> Result<Number, EvalError> {
    if let (Number::Int(a), Number::Int(b)) = (lhs, rhs) {
        let exact = match op {
            '+' => a.checked_add(b),
            '-' => a.checked_sub(b),
            '*' => a.checked_mul(b),
            _ => None,
        };
        if let Some(value) = exact {
            return Ok(Number::Int(value));
        }
    }
    apply_float(lhs.as_f64(), op, rhs.as_f64()).map(Number::Float)
}
