//! Tool result values and their textual rendering.
//!
//! The rendered form is what the model sees in the running context, so it
//! follows the conventions the prompts show it: `[73, 78, 68]` for lists,
//! `True`/`False` for booleans, `7.599822246093079e+33` for large floats.

use serde::{Deserialize, Serialize};
use std::fmt;
use crate::args::Number;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum ToolValue {
    Int(i128),
    Float(f64),
    IntList(Vec<i128>),
    Bool(bool),
    Text(String),
}

impl From<Number> for ToolValue {
    fn from(n: Number) -> Self {
        match n {
            Number::Int(i) => ToolValue::Int(i as i128),
            Number::Float(f) => ToolValue::Float(f),
        }
    }
}

impl fmt::Display for ToolValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ToolValue::Int(i) => write!(f, "{i}"),
            ToolValue::Float(x) => f.write_str(&format_float(*x)),
            ToolValue::IntList(items) => {
                let parts: Vec<String> = items.iter().map(|i| i.to_string()).collect();
                write!(f, "[{}]", parts.join(", "))
            }
            ToolValue::Bool(true) => f.write_str("True"),
            ToolValue::Bool(false) => f.write_str("False"),
            ToolValue::Text(s) => f.write_str(s),
        }
    }
}

/// Shortest round-trip float text; scientific notation outside `[1e-4, 1e16)`.
pub fn format_float(x: f64) -> String {
    if x.is_nan() {
        return "nan".into();
    }
    if x.is_infinite() {
        return if x > 0.0 { "inf".into() } else { "-inf".into() };
    }

    let magnitude = x.abs();
    if magnitude != 0.0 && !(1e-4..1e16).contains(&magnitude) {
        let sci = format!("{x:e}");
        return match sci.split_once('e') {
            Some((mantissa, exp)) => {
                let exp: i32 = exp.parse().unwrap_or(0);
                let sign = if exp < 0 { '-' } else { '+' };
                format!("{mantissa}e{sign}{:02}", exp.abs())
            }
            None => sci,
        };
    }

    let plain = format!("{x}");
    if plain.contains('.') {
        plain
    } else {
        format!("{plain}.0")
    }
}
