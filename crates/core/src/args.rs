//! Tool argument schemas and coercion of raw LLM argument tokens.
//!
//! The decision stage hands over arguments as raw strings split out of a
//! `FUNCTION_CALL:` line. Each tool declares an ordered list of [`Param`]s;
//! [`coerce`] turns the raw tokens into typed [`ArgValue`]s or fails with
//! `ToolError::InvalidArgument` naming the tool.

use serde::{Deserialize, Serialize};
use std::fmt;
use crate::error::ToolError;

/// The semantic type a tool expects for one argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArgKind {
    Int,
    Number,
    Text,
    NumberList,
    TextList,
}

impl ArgKind {
    pub fn is_list(self) -> bool {
        matches!(self, ArgKind::NumberList | ArgKind::TextList)
    }
}

impl fmt::Display for ArgKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ArgKind::Int => "int",
            ArgKind::Number => "number",
            ArgKind::Text => "str",
            ArgKind::NumberList => "list[number]",
            ArgKind::TextList => "list[str]",
        };
        f.write_str(label)
    }
}

/// One named, typed parameter in a tool's signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Param {
    pub name: &'static str,
    pub kind: ArgKind,
}

impl Param {
    pub const fn new(name: &'static str, kind: ArgKind) -> Self {
        Self { name, kind }
    }
}

/// A number that stays exact while it is an integer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    Int(i64),
    Float(f64),
}

impl Number {
    /// Parse a numeric token. Surrounding quotes are ignored; non-finite
    /// values are rejected.
    pub fn parse(raw: &str) -> Option<Self> {
        let s = strip_quotes(raw.trim());
        if let Ok(i) = s.parse::<i64>() {
            return Some(Number::Int(i));
        }
        s.parse::<f64>()
            .ok()
            .filter(|f| f.is_finite())
            .map(Number::Float)
    }

    pub fn as_f64(self) -> f64 {
        match self {
            Number::Int(i) => i as f64,
            Number::Float(f) => f,
        }
    }
}

/// A coerced argument value.
#[derive(Debug, Clone, PartialEq)]
pub enum ArgValue {
    Int(i64),
    Number(Number),
    Text(String),
    NumberList(Vec<Number>),
    TextList(Vec<String>),
}

impl ArgValue {
    pub fn as_int(&self) -> Option<i64> {
        match self {
            ArgValue::Int(i) => Some(*i),
            ArgValue::Number(Number::Int(i)) => Some(*i),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<Number> {
        match self {
            ArgValue::Int(i) => Some(Number::Int(*i)),
            ArgValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            ArgValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_number_list(&self) -> Option<&[Number]> {
        match self {
            ArgValue::NumberList(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_text_list(&self) -> Option<&[String]> {
        match self {
            ArgValue::TextList(v) => Some(v),
            _ => None,
        }
    }
}

/// Coerce raw argument tokens against a tool's parameter list.
///
/// A tool with a single list parameter that receives several tokens gets
/// those tokens as the list elements (`add_list|1|2|3`).
pub fn coerce(tool_name: &str, params: &[Param], raw: &[String]) -> Result<Vec<ArgValue>, ToolError> {
    if let [only] = params {
        if only.kind.is_list() && raw.len() > 1 {
            let value = match only.kind {
                ArgKind::TextList => ArgValue::TextList(raw.to_vec()),
                _ => parse_number_list(&raw.join(","))
                    .map(ArgValue::NumberList)
                    .map_err(|reason| ToolError::invalid(tool_name, format!("{}: {reason}", only.name)))?,
            };
            return Ok(vec![value]);
        }
    }

    if raw.len() != params.len() {
        let expected: Vec<&str> = params.iter().map(|p| p.name).collect();
        return Err(ToolError::invalid(
            tool_name,
            format!(
                "expected {} argument(s) ({}), got {}",
                params.len(),
                expected.join(", "),
                raw.len()
            ),
        ));
    }

    params
        .iter()
        .zip(raw)
        .map(|(param, token)| {
            coerce_one(param.kind, token)
                .map_err(|reason| ToolError::invalid(tool_name, format!("{}: {reason}", param.name)))
        })
        .collect()
}

fn coerce_one(kind: ArgKind, raw: &str) -> Result<ArgValue, String> {
    match kind {
        ArgKind::Int => parse_int(raw).map(ArgValue::Int),
        ArgKind::Number => Number::parse(raw)
            .map(ArgValue::Number)
            .ok_or_else(|| format!("expected a number, got '{raw}'")),
        ArgKind::Text => Ok(ArgValue::Text(raw.to_string())),
        ArgKind::NumberList => parse_number_list(raw).map(ArgValue::NumberList),
        ArgKind::TextList => Ok(ArgValue::TextList(parse_text_list(raw))),
    }
}

fn parse_int(raw: &str) -> Result<i64, String> {
    match Number::parse(raw) {
        Some(Number::Int(i)) => Ok(i),
        Some(Number::Float(f)) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => Ok(f as i64),
        _ => Err(format!("expected an integer, got '{raw}'")),
    }
}

fn parse_number_list(raw: &str) -> Result<Vec<Number>, String> {
    let s = raw.trim();

    if s.starts_with('{') {
        return parse_numbers_object(s);
    }

    let inner = if s.starts_with('[') && s.ends_with(']') {
        &s[1..s.len() - 1]
    } else {
        s
    };

    if inner.trim().is_empty() {
        return Ok(Vec::new());
    }

    inner
        .split(',')
        .map(|item| Number::parse(item).ok_or_else(|| format!("'{}' is not a number", item.trim())))
        .collect()
}

/// `{"numbers": [1, 2, 3]}`, closing brackets the model forgot to emit.
fn parse_numbers_object(s: &str) -> Result<Vec<Number>, String> {
    let mut json = s.to_string();
    let missing_brackets = s.matches('[').count().saturating_sub(s.matches(']').count());
    let missing_braces = s.matches('{').count().saturating_sub(s.matches('}').count());
    json.push_str(&"]".repeat(missing_brackets));
    json.push_str(&"}".repeat(missing_braces));

    let value: serde_json::Value =
        serde_json::from_str(&json).map_err(|e| format!("invalid JSON list '{s}': {e}"))?;
    let items = value["numbers"]
        .as_array()
        .ok_or_else(|| format!("JSON object has no 'numbers' array: '{s}'"))?;

    items
        .iter()
        .map(|item| match item {
            serde_json::Value::Number(n) => n
                .as_i64()
                .map(Number::Int)
                .or_else(|| n.as_f64().map(Number::Float))
                .ok_or_else(|| format!("'{n}' is not a number")),
            serde_json::Value::String(s) => {
                Number::parse(s).ok_or_else(|| format!("'{s}' is not a number"))
            }
            other => Err(format!("'{other}' is not a number")),
        })
        .collect()
}

fn parse_text_list(raw: &str) -> Vec<String> {
    let s = raw.trim();
    if s.starts_with('[') && s.ends_with(']') {
        if let Ok(items) = serde_json::from_str::<Vec<String>>(s) {
            return items;
        }
        return s[1..s.len() - 1]
            .split(',')
            .map(|item| strip_quotes(item.trim()).to_string())
            .filter(|item| !item.is_empty())
            .collect();
    }
    vec![s.to_string()]
}

fn strip_quotes(s: &str) -> &str {
    s.trim_matches(|c| c == '"' || c == '\'')
}
