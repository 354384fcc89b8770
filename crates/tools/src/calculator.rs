//! Calculator tool — evaluates arithmetic expressions.
//!
//! Recursive-descent parser over `+ - * / % ^`, parentheses, unary minus,
//! and a few named functions (`sqrt`, `abs`, `round`). No `eval`, no
//! dependencies; malformed input is a [`ToolError::InvalidArguments`].

use agentry_core::error::ToolError;
use agentry_core::tool::{Tool, ToolOutcome};
use async_trait::async_trait;

pub struct CalculatorTool;

#[async_trait]
impl Tool for CalculatorTool {
    fn name(&self) -> &str {
        "calculator"
    }

    fn description(&self) -> &str {
        "Evaluate an arithmetic expression, e.g. \"15 * 23 + 45\" or \"sqrt(144)\"."
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolOutcome, ToolError> {
        let expression = arguments["expression"]
            .as_str()
            .ok_or_else(|| ToolError::InvalidArguments("Missing 'expression' argument".into()))?;

        let value = evaluate(expression).map_err(|reason| ToolError::ExecutionFailed {
            tool_name: "calculator".into(),
            reason,
        })?;

        Ok(
            ToolOutcome::text(format!("{expression} = {value}")).with_data(serde_json::json!({
                "expression": expression,
                "value": value,
            })),
        )
    }
}

/// Evaluate an expression to a float.
pub fn evaluate(input: &str) -> Result<f64, String> {
    let tokens = tokenize(input)?;
    let mut parser = Parser { tokens, pos: 0 };
    let value = parser.expression()?;
    if parser.pos != parser.tokens.len() {
        return Err(format!("Unexpected token at position {}", parser.pos));
    }
    if !value.is_finite() {
        return Err("Expression did not evaluate to a finite number".into());
    }
    Ok(value)
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(f64),
    Ident(String),
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Caret,
    LParen,
    RParen,
}

fn tokenize(input: &str) -> Result<Vec<Token>, String> {
    let mut tokens = Vec::new();
    let mut chars = input.chars().peekable();

    while let Some(&c) = chars.peek() {
        match c {
            ' ' | '\t' => {
                chars.next();
            }
            '0'..='9' | '.' => {
                let mut num = String::new();
                while let Some(&d) = chars.peek() {
                    if d.is_ascii_digit() || d == '.' {
                        num.push(d);
                        chars.next();
                    } else {
                        break;
                    }
                }
                let value: f64 = num.parse().map_err(|_| format!("Invalid number: {num}"))?;
                tokens.push(Token::Number(value));
            }
            'a'..='z' | 'A'..='Z' => {
                let mut ident = String::new();
                while let Some(&d) = chars.peek() {
                    if d.is_ascii_alphanumeric() || d == '_' {
                        ident.push(d);
                        chars.next();
                    } else {
                        break;
                    }
                }
                tokens.push(Token::Ident(ident.to_lowercase()));
            }
            '+' => {
                chars.next();
                tokens.push(Token::Plus);
            }
            '-' => {
                chars.next();
                tokens.push(Token::Minus);
            }
            '*' => {
                chars.next();
                // allow ** as power
                if chars.peek() == Some(&'*') {
                    chars.next();
                    tokens.push(Token::Caret);
                } else {
                    tokens.push(Token::Star);
                }
            }
            '/' => {
                chars.next();
                tokens.push(Token::Slash);
            }
            '%' => {
                chars.next();
                tokens.push(Token::Percent);
            }
            '^' => {
                chars.next();
                tokens.push(Token::Caret);
            }
            '(' => {
                chars.next();
                tokens.push(Token::LParen);
            }
            ')' => {
                chars.next();
                tokens.push(Token::RParen);
            }
            other => return Err(format!("Unexpected character: '{other}'")),
        }
    }

    if tokens.is_empty() {
        return Err("Empty expression".into());
    }
    Ok(tokens)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let t = self.tokens.get(self.pos).cloned();
        if t.is_some() {
            self.pos += 1;
        }
        t
    }

    // expression := term (("+" | "-") term)*
    fn expression(&mut self) -> Result<f64, String> {
        let mut value = self.term()?;
        while let Some(op) = self.peek() {
            match op {
                Token::Plus => {
                    self.next();
                    value += self.term()?;
                }
                Token::Minus => {
                    self.next();
                    value -= self.term()?;
                }
                _ => break,
            }
        }
        Ok(value)
    }

    // term := power (("*" | "/" | "%") power)*
    fn term(&mut self) -> Result<f64, String> {
        let mut value = self.power()?;
        while let Some(op) = self.peek() {
            match op {
                Token::Star => {
                    self.next();
                    value *= self.power()?;
                }
                Token::Slash => {
                    self.next();
                    let rhs = self.power()?;
                    if rhs == 0.0 {
                        return Err("Division by zero".into());
                    }
                    value /= rhs;
                }
                Token::Percent => {
                    self.next();
                    let rhs = self.power()?;
                    if rhs == 0.0 {
                        return Err("Modulo by zero".into());
                    }
                    value %= rhs;
                }
                _ => break,
            }
        }
        Ok(value)
    }

    // power := unary ("^" power)?   (right-associative)
    fn power(&mut self) -> Result<f64, String> {
        let base = self.unary()?;
        if self.peek() == Some(&Token::Caret) {
            self.next();
            let exp = self.power()?;
            return Ok(base.powf(exp));
        }
        Ok(base)
    }

    // unary := "-" unary | atom
    fn unary(&mut self) -> Result<f64, String> {
        if self.peek() == Some(&Token::Minus) {
            self.next();
            return Ok(-self.unary()?);
        }
        self.atom()
    }

    // atom := number | ident "(" expression ")" | "(" expression ")"
    fn atom(&mut self) -> Result<f64, String> {
        match self.next() {
            Some(Token::Number(n)) => Ok(n),
            Some(Token::LParen) => {
                let value = self.expression()?;
                match self.next() {
                    Some(Token::RParen) => Ok(value),
                    _ => Err("Missing closing parenthesis".into()),
                }
            }
            Some(Token::Ident(name)) => {
                if self.next() != Some(Token::LParen) {
                    return Err(format!("Expected '(' after function '{name}'"));
                }
                let arg = self.expression()?;
                if self.next() != Some(Token::RParen) {
                    return Err("Missing closing parenthesis".into());
                }
                match name.as_str() {
                    "sqrt" => {
                        if arg < 0.0 {
                            Err("sqrt of negative number".into())
                        } else {
                            Ok(arg.sqrt())
                        }
                    }
                    "abs" => Ok(arg.abs()),
                    "round" => Ok(arg.round()),
                    other => Err(format!("Unknown function: {other}")),
                }
            }
            other => Err(format!("Unexpected token: {other:?}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic_arithmetic() {
        assert_eq!(evaluate("15 * 23 + 45").unwrap(), 390.0);
        assert_eq!(evaluate("2 + 3 * 4").unwrap(), 14.0);
        assert_eq!(evaluate("(2 + 3) * 4").unwrap(), 20.0);
    }

    #[test]
    fn functions() {
        assert_eq!(evaluate("sqrt(144)").unwrap(), 12.0);
        assert_eq!(evaluate("abs(-5)").unwrap(), 5.0);
        assert_eq!(evaluate("round(2.6)").unwrap(), 3.0);
    }

    #[test]
    fn power_is_right_associative() {
        assert_eq!(evaluate("2 ^ 3 ^ 2").unwrap(), 512.0);
        assert_eq!(evaluate("2 ** 10").unwrap(), 1024.0);
    }

    #[test]
    fn unary_minus() {
        assert_eq!(evaluate("-3 + 5").unwrap(), 2.0);
        assert_eq!(evaluate("2 * -4").unwrap(), -8.0);
    }

    #[test]
    fn division_by_zero_rejected() {
        assert!(evaluate("1 / 0").is_err());
        assert!(evaluate("5 % 0").is_err());
    }

    #[test]
    fn malformed_expressions_rejected() {
        assert!(evaluate("").is_err());
        assert!(evaluate("2 +").is_err());
        assert!(evaluate("(2 + 3").is_err());
        assert!(evaluate("frob(3)").is_err());
        assert!(evaluate("2 $ 3").is_err());
    }

    #[tokio::test]
    async fn tool_interface() {
        let tool = CalculatorTool;
        let result = tool
            .execute(serde_json::json!({"expression": "6 * 7"}))
            .await
            .unwrap();
        assert!(result.success);
        assert!(result.output.contains("42"));
        assert_eq!(result.data.unwrap()["value"], 42.0);
    }

    #[tokio::test]
    async fn tool_missing_argument() {
        let tool = CalculatorTool;
        let err = tool.execute(serde_json::json!({})).await.unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments(_)));
    }
}
