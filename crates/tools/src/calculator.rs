//! `calculate` and `verify`: evaluate arithmetic expressions.
//!
//! Supports `+`, `-`, `*`, `/`, `%`, `^` (also written `**`), parentheses,
//! unary signs and decimal or scientific numbers. Uses a recursive-descent
//! parser; nothing is ever handed to a shell or interpreter.

use async_trait::async_trait;
use reckon_core::args::{ArgKind, ArgValue, Param};
use reckon_core::error::ToolError;
use reckon_core::tool::Tool;
use reckon_core::value::ToolValue;

/// Tolerance used by `verify`.
pub const VERIFY_TOLERANCE: f64 = 1e-10;

pub struct CalculateTool;

const EXPRESSION: &[Param] = &[Param::new("expression", ArgKind::Text)];

#[async_trait]
impl Tool for CalculateTool {
    fn name(&self) -> &str {
        "calculate"
    }

    fn description(&self) -> &str {
        "Evaluate an arithmetic expression with + - * / % ^ and parentheses."
    }

    fn params(&self) -> &[Param] {
        EXPRESSION
    }

    async fn execute(&self, args: Vec<ArgValue>) -> Result<ToolValue, ToolError> {
        let expr = args
            .first()
            .and_then(ArgValue::as_text)
            .ok_or_else(|| ToolError::invalid(self.name(), "missing expression"))?;

        let value = evaluate(expr).map_err(|e| ToolError::invalid(self.name(), e))?;
        // Integral results read as integers.
        if value.fract() == 0.0 && value.abs() < 1e15 {
            Ok(ToolValue::Int(value as i128))
        } else {
            Ok(ToolValue::Float(value))
        }
    }
}

pub struct VerifyTool;

const VERIFY_PARAMS: &[Param] = &[
    Param::new("expression", ArgKind::Text),
    Param::new("expected", ArgKind::Number),
];

#[async_trait]
impl Tool for VerifyTool {
    fn name(&self) -> &str {
        "verify"
    }

    fn description(&self) -> &str {
        "Check whether an expression evaluates to the expected number."
    }

    fn params(&self) -> &[Param] {
        VERIFY_PARAMS
    }

    async fn execute(&self, args: Vec<ArgValue>) -> Result<ToolValue, ToolError> {
        let expr = args
            .first()
            .and_then(ArgValue::as_text)
            .ok_or_else(|| ToolError::invalid(self.name(), "missing expression"))?;
        let expected = args
            .get(1)
            .and_then(ArgValue::as_number)
            .ok_or_else(|| ToolError::invalid(self.name(), "missing expected value"))?;

        let actual = evaluate(expr).map_err(|e| ToolError::invalid(self.name(), e))?;
        let ok = (actual - expected.as_f64()).abs() < VERIFY_TOLERANCE;
        tracing::debug!(expression = %expr, actual, expected = expected.as_f64(), ok, "Verified expression");
        Ok(ToolValue::Bool(ok))
    }
}

// ── Recursive-descent expression evaluator ────────────────────────────────

/// Evaluate a mathematical expression string.
pub fn evaluate(expr: &str) -> Result<f64, String> {
    let tokens = tokenize(expr)?;
    let mut parser = Parser::new(&tokens);
    let result = parser.parse_expr()?;
    if parser.pos < parser.tokens.len() {
        return Err(format!(
            "Unexpected token at position {}: {:?}",
            parser.pos, parser.tokens[parser.pos]
        ));
    }
    if !result.is_finite() {
        return Err("Result is not a finite number".into());
    }
    Ok(result)
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(f64),
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
    let chars: Vec<char> = input.chars().collect();
    let mut i = 0;

    while i < chars.len() {
        match chars[i] {
            ' ' | '\t' | '\n' | '\r' => i += 1,
            '+' => { tokens.push(Token::Plus); i += 1; }
            '-' => { tokens.push(Token::Minus); i += 1; }
            '*' if chars.get(i + 1) == Some(&'*') => { tokens.push(Token::Caret); i += 2; }
            '*' => { tokens.push(Token::Star); i += 1; }
            '/' => { tokens.push(Token::Slash); i += 1; }
            '%' => { tokens.push(Token::Percent); i += 1; }
            '^' => { tokens.push(Token::Caret); i += 1; }
            '(' => { tokens.push(Token::LParen); i += 1; }
            ')' => { tokens.push(Token::RParen); i += 1; }
            c if c.is_ascii_digit() || c == '.' => {
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                    i += 1;
                }
                // Exponent suffix: 1e5, 2.5E-3
                if i < chars.len() && (chars[i] == 'e' || chars[i] == 'E') {
                    let mut j = i + 1;
                    if j < chars.len() && (chars[j] == '+' || chars[j] == '-') {
                        j += 1;
                    }
                    if j < chars.len() && chars[j].is_ascii_digit() {
                        while j < chars.len() && chars[j].is_ascii_digit() {
                            j += 1;
                        }
                        i = j;
                    }
                }
                let num_str: String = chars[start..i].iter().collect();
                let num: f64 = num_str
                    .parse()
                    .map_err(|_| format!("Invalid number: {}", num_str))?;
                tokens.push(Token::Number(num));
            }
            c => return Err(format!("Unexpected character: '{}'", c)),
        }
    }

    Ok(tokens)
}

struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(tokens: &'a [Token]) -> Self {
        Self { tokens, pos: 0 }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn consume(&mut self) -> Option<&Token> {
        let tok = self.tokens.get(self.pos);
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    // expr = term (('+' | '-') term)*
    fn parse_expr(&mut self) -> Result<f64, String> {
        let mut left = self.parse_term()?;
        while let Some(op) = self.peek() {
            match op {
                Token::Plus => {
                    self.consume();
                    left += self.parse_term()?;
                }
                Token::Minus => {
                    self.consume();
                    left -= self.parse_term()?;
                }
                _ => break,
            }
        }
        Ok(left)
    }

    // term = unary (('*' | '/' | '%') unary)*
    fn parse_term(&mut self) -> Result<f64, String> {
        let mut left = self.parse_unary()?;
        while let Some(op) = self.peek() {
            match op {
                Token::Star => {
                    self.consume();
                    left *= self.parse_unary()?;
                }
                Token::Slash => {
                    self.consume();
                    let right = self.parse_unary()?;
                    if right == 0.0 {
                        return Err("Division by zero".into());
                    }
                    left /= right;
                }
                Token::Percent => {
                    self.consume();
                    let right = self.parse_unary()?;
                    if right == 0.0 {
                        return Err("Modulo by zero".into());
                    }
                    left -= right * (left / right).floor();
                }
                _ => break,
            }
        }
        Ok(left)
    }

    // unary = ('-' | '+') unary | power
    fn parse_unary(&mut self) -> Result<f64, String> {
        match self.peek() {
            Some(Token::Minus) => {
                self.consume();
                Ok(-self.parse_unary()?)
            }
            Some(Token::Plus) => {
                self.consume();
                self.parse_unary()
            }
            _ => self.parse_power(),
        }
    }

    // power = primary ('^' unary)?   (right-associative, binds tighter than a leading '-')
    fn parse_power(&mut self) -> Result<f64, String> {
        let base = self.parse_primary()?;
        if let Some(Token::Caret) = self.peek() {
            self.consume();
            let exp = self.parse_unary()?;
            return Ok(base.powf(exp));
        }
        Ok(base)
    }

    // primary = NUMBER | '(' expr ')'
    fn parse_primary(&mut self) -> Result<f64, String> {
        match self.consume() {
            Some(Token::Number(n)) => Ok(*n),
            Some(Token::LParen) => {
                let val = self.parse_expr()?;
                match self.consume() {
                    Some(Token::RParen) => Ok(val),
                    _ => Err("Expected closing parenthesis".into()),
                }
            }
            Some(tok) => Err(format!("Unexpected token: {:?}", tok)),
            None => Err("Unexpected end of expression".into()),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use reckon_core::args::Number;

    #[test]
    fn operator_precedence() {
        assert_eq!(evaluate("2 + 3 * 4").unwrap(), 14.0);
        assert_eq!(evaluate("(2 + 3) * 4").unwrap(), 20.0);
    }

    #[test]
    fn division_by_zero() {
        assert!(evaluate("1 / 0").is_err());
        assert!(evaluate("1 % 0").is_err());
    }

    #[test]
    fn power_is_right_associative() {
        assert_eq!(evaluate("2 ^ 3 ^ 2").unwrap(), 512.0);
        assert_eq!(evaluate("2 ** 10").unwrap(), 1024.0);
        assert_eq!(evaluate("2 ^ -1").unwrap(), 0.5);
    }

    #[test]
    fn power_binds_tighter_than_negation() {
        assert_eq!(evaluate("-2 ^ 2").unwrap(), -4.0);
    }

    #[test]
    fn modulo_is_floored() {
        assert_eq!(evaluate("7 % 3").unwrap(), 1.0);
        assert_eq!(evaluate("-7 % 3").unwrap(), 2.0);
    }

    #[test]
    fn scientific_literals() {
        assert_eq!(evaluate("1e3 + 2.5E-1").unwrap(), 1000.25);
    }

    #[test]
    fn complex_expression() {
        let result = evaluate("(10 + 5) / 3 - 2 * (1 + 1)").unwrap();
        assert!((result - 1.0).abs() < 1e-10);
    }

    #[test]
    fn invalid_expressions() {
        assert!(evaluate("2 +").is_err());
        assert!(evaluate("").is_err());
        assert!(evaluate("2 + x").is_err());
        assert!(evaluate("(1 + 2").is_err());
    }

    #[tokio::test]
    async fn calculate_formats_integers() {
        let result = CalculateTool
            .execute(vec![ArgValue::Text("10 / 2".into())])
            .await
            .unwrap();
        assert_eq!(result.to_string(), "5");

        let result = CalculateTool
            .execute(vec![ArgValue::Text("10 / 4".into())])
            .await
            .unwrap();
        assert_eq!(result.to_string(), "2.5");
    }

    #[tokio::test]
    async fn calculate_bad_expression_is_invalid_argument() {
        let err = CalculateTool
            .execute(vec![ArgValue::Text("2 +".into())])
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::InvalidArgument { .. }));
    }

    #[tokio::test]
    async fn verify_within_tolerance() {
        let yes = VerifyTool
            .execute(vec![ArgValue::Text("0.1 + 0.2".into()), ArgValue::Number(Number::Float(0.3))])
            .await
            .unwrap();
        assert_eq!(yes.to_string(), "True");

        let no = VerifyTool
            .execute(vec![ArgValue::Text("2 * 3".into()), ArgValue::Number(Number::Int(7))])
            .await
            .unwrap();
        assert_eq!(no.to_string(), "False");
    }
}
