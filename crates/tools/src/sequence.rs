//! Sequence tools: character codes, exponential sums, Fibonacci numbers.

use async_trait::async_trait;
use reckon_core::args::{ArgKind, ArgValue, Param};
use reckon_core::error::ToolError;
use reckon_core::tool::Tool;
use reckon_core::value::ToolValue;

pub struct StringsToCharsToIntTool;

const TEXT: &[Param] = &[Param::new("text", ArgKind::Text)];

#[async_trait]
impl Tool for StringsToCharsToIntTool {
    fn name(&self) -> &str {
        "strings_to_chars_to_int"
    }

    fn description(&self) -> &str {
        "Return the code point of each character in the text."
    }

    fn params(&self) -> &[Param] {
        TEXT
    }

    async fn execute(&self, args: Vec<ArgValue>) -> Result<ToolValue, ToolError> {
        let text = args
            .first()
            .and_then(ArgValue::as_text)
            .ok_or_else(|| ToolError::invalid(self.name(), "expected text"))?;
        Ok(ToolValue::IntList(code_points(text)))
    }
}

pub fn code_points(text: &str) -> Vec<i128> {
    text.chars().map(|c| u32::from(c) as i128).collect()
}

pub struct ExponentialSumTool;

const NUMBERS: &[Param] = &[Param::new("numbers", ArgKind::NumberList)];

#[async_trait]
impl Tool for ExponentialSumTool {
    fn name(&self) -> &str {
        "int_list_to_exponential_sum"
    }

    fn description(&self) -> &str {
        "Return the sum of e raised to each number in the list."
    }

    fn params(&self) -> &[Param] {
        NUMBERS
    }

    async fn execute(&self, args: Vec<ArgValue>) -> Result<ToolValue, ToolError> {
        let numbers = args
            .first()
            .and_then(ArgValue::as_number_list)
            .ok_or_else(|| ToolError::invalid(self.name(), "expected a list of numbers"))?;

        if numbers.is_empty() {
            return Ok(ToolValue::Int(0));
        }

        let sum: f64 = numbers.iter().map(|n| n.as_f64().exp()).sum();
        if sum.is_infinite() {
            return Err(ToolError::invalid(self.name(), "exponential sum overflows"));
        }
        Ok(ToolValue::Float(sum))
    }
}

pub struct FibonacciTool;

const N: &[Param] = &[Param::new("n", ArgKind::Int)];

#[async_trait]
impl Tool for FibonacciTool {
    fn name(&self) -> &str {
        "fibonacci_numbers"
    }

    fn description(&self) -> &str {
        "Return the first n Fibonacci numbers, starting from 0."
    }

    fn params(&self) -> &[Param] {
        N
    }

    async fn execute(&self, args: Vec<ArgValue>) -> Result<ToolValue, ToolError> {
        let n = args
            .first()
            .and_then(ArgValue::as_int)
            .ok_or_else(|| ToolError::invalid(self.name(), "expected an integer"))?;
        if n < 0 {
            return Err(ToolError::invalid(self.name(), "n must not be negative"));
        }
        fibonacci(n as usize)
            .map(ToolValue::IntList)
            .ok_or_else(|| ToolError::invalid(self.name(), format!("fibonacci_numbers({n}) overflows")))
    }
}

/// The first `n` Fibonacci numbers, or `None` if one of them overflows.
pub fn fibonacci(n: usize) -> Option<Vec<i128>> {
    let mut seq = Vec::with_capacity(n.min(256));
    let (mut a, mut b): (i128, Option<i128>) = (0, Some(1));
    for i in 0..n {
        seq.push(a);
        if i + 1 == n {
            break;
        }
        let next = b?;
        b = a.checked_add(next);
        a = next;
    }
    Some(seq)
}
