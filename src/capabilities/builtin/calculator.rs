//! Calculator capability: arithmetic over free-form input.
//!
//! Everything that is not part of an arithmetic expression is stripped from
//! the input first, so "please calculate 2+2" evaluates `2+2`.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{json, Value};

use crate::capabilities::capability::{Capability, CapabilityFailure};

/// Deepest nesting of parentheses, signs and exponents the parser accepts.
const MAX_DEPTH: usize = 256;

static NON_EXPRESSION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^0-9.+\-*/%^()!\s]").expect("valid regex"));

/// Evaluates `+ - * / % ^ !` and parentheses over `f64`.
#[derive(Debug, Default)]
pub struct Calculator;

impl Calculator {
    pub const NAME: &'static str = "calculator";

    pub fn new() -> Self {
        Self
    }

    /// Remove everything that cannot be part of an expression.
    pub fn clean(input: &str) -> String {
        NON_EXPRESSION
            .replace_all(input, "")
            .split_whitespace()
            .collect::<Vec<_>>()
            .join("")
    }

    /// Evaluate a cleaned expression.
    pub fn evaluate(expression: &str) -> Result<f64, String> {
        let tokens = tokenize(expression)?;
        if tokens.is_empty() {
            return Err("No expression found".to_string());
        }
        let mut parser = Parser {
            tokens,
            pos: 0,
            depth: 0,
        };
        let value = parser.expression()?;
        if let Some(token) = parser.peek() {
            return Err(format!("Unexpected token '{}'", token));
        }
        if !value.is_finite() {
            return Err("Result is not a finite number".to_string());
        }
        Ok(value)
    }

    /// Human-friendly rendering of a result.
    pub fn format_result(value: f64) -> String {
        let magnitude = value.abs();
        if magnitude > 1_000_000.0 || (magnitude > 0.0 && magnitude < 0.0001) {
            // Exponent carries an explicit sign: 2.5000e+6, 1.0000e-5.
            let formatted = format!("{:.4e}", value);
            return match formatted.split_once('e') {
                Some((mantissa, exp)) if !exp.starts_with('-') => {
                    format!("{}e+{}", mantissa, exp)
                }
                _ => formatted,
            };
        }
        let fixed = format!("{:.6}", value);
        let trimmed = fixed.trim_end_matches('0').trim_end_matches('.');
        if trimmed == "-0" {
            "0".to_string()
        } else {
            trimmed.to_string()
        }
    }
}

#[async_trait]
impl Capability for Calculator {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn description(&self) -> &str {
        "Perform mathematical calculations"
    }

    fn version(&self) -> Option<&str> {
        Some("1.0.0")
    }

    async fn execute(&self, input: &str, _options: &Value) -> Result<Value, CapabilityFailure> {
        let cleaned = Self::clean(input);
        let value = Self::evaluate(&cleaned).map_err(|message| {
            CapabilityFailure::new(message).with_details(json!({ "expression": input }))
        })?;

        Ok(json!({
            "expression": input,
            "evaluated": cleaned,
            "result": value.to_string(),
            "formatted": Self::format_result(value),
            "source": Self::NAME,
        }))
    }
}

// ---------------------------------------------------------------------------
// Tokenizer / parser
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
enum Token {
    Number(f64),
    Op(char),
    LParen,
    RParen,
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Token::Number(n) => write!(f, "{}", n),
            Token::Op(c) => write!(f, "{}", c),
            Token::LParen => write!(f, "("),
            Token::RParen => write!(f, ")"),
        }
    }
}

fn tokenize(expression: &str) -> Result<Vec<Token>, String> {
    let mut tokens = Vec::new();
    let chars: Vec<char> = expression.chars().collect();
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
                let literal: String = chars[start..i].iter().collect();
                let number = literal
                    .parse::<f64>()
                    .map_err(|_| format!("Invalid number '{}'", literal))?;
                tokens.push(Token::Number(number));
            }
            '+' | '-' | '*' | '/' | '%' | '^' | '!' => {
                tokens.push(Token::Op(c));
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
            other => return Err(format!("Unexpected character '{}'", other)),
        }
    }

    Ok(tokens)
}

/// Recursive descent, lowest precedence first:
/// `+ -`, then `* / %`, then unary minus, then `^` (right-assoc), then `!`.
struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
}

impl Parser {
    fn peek(&self) -> Option<Token> {
        self.tokens.get(self.pos).copied()
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.peek();
        self.pos += 1;
        token
    }

    fn expression(&mut self) -> Result<f64, String> {
        let mut value = self.term()?;
        while let Some(Token::Op(op @ ('+' | '-'))) = self.peek() {
            self.pos += 1;
            let rhs = self.term()?;
            value = if op == '+' { value + rhs } else { value - rhs };
        }
        Ok(value)
    }

    fn term(&mut self) -> Result<f64, String> {
        let mut value = self.unary()?;
        while let Some(Token::Op(op @ ('*' | '/' | '%'))) = self.peek() {
            self.pos += 1;
            let rhs = self.unary()?;
            if rhs == 0.0 && op != '*' {
                return Err("Division by zero".to_string());
            }
            value = match op {
                '*' => value * rhs,
                '/' => value / rhs,
                _ => value % rhs,
            };
        }
        Ok(value)
    }

    /// Every nested `(`, sign and exponent passes through here, so the depth
    /// check bounds recursion for all of them.
    fn unary(&mut self) -> Result<f64, String> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err("Expression too deeply nested".to_string());
        }
        let value = self.unary_operand();
        self.depth -= 1;
        value
    }

    fn unary_operand(&mut self) -> Result<f64, String> {
        match self.peek() {
            Some(Token::Op('-')) => {
                self.pos += 1;
                Ok(-self.unary()?)
            }
            Some(Token::Op('+')) => {
                self.pos += 1;
                self.unary()
            }
            _ => self.power(),
        }
    }

    fn power(&mut self) -> Result<f64, String> {
        let base = self.postfix()?;
        if let Some(Token::Op('^')) = self.peek() {
            self.pos += 1;
            let exponent = self.unary()?;
            return Ok(base.powf(exponent));
        }
        Ok(base)
    }

    fn postfix(&mut self) -> Result<f64, String> {
        let mut value = self.primary()?;
        while let Some(Token::Op('!')) = self.peek() {
            self.pos += 1;
            value = factorial(value)?;
        }
        Ok(value)
    }

    fn primary(&mut self) -> Result<f64, String> {
        match self.next() {
            Some(Token::Number(n)) => Ok(n),
            Some(Token::LParen) => {
                let value = self.expression()?;
                match self.next() {
                    Some(Token::RParen) => Ok(value),
                    Some(token) => Err(format!("Unexpected token '{}'", token)),
                    None => Err("Missing closing parenthesis".to_string()),
                }
            }
            Some(token) => Err(format!("Unexpected token '{}'", token)),
            None => Err("Unexpected end of expression".to_string()),
        }
    }
}

fn factorial(n: f64) -> Result<f64, String> {
    if n < 0.0 || n.fract() != 0.0 {
        return Err("Factorial requires a non-negative integer".to_string());
    }
    if n > 170.0 {
        return Err("Result is not a finite number".to_string());
    }
    Ok((1..=n as u64).fold(1.0, |acc, k| acc * k as f64))
}
