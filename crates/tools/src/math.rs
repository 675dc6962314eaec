//! Arithmetic and trigonometry tools.
//!
//! Every tool here is a pure function over already-coerced arguments, so
//! they share one [`MathTool`] wrapper that pairs a name and schema with a
//! plain `fn`. Integers stay exact until an operation cannot represent its
//! result as one.

use async_trait::async_trait;
use reckon_core::args::{ArgKind, ArgValue, Number, Param};
use reckon_core::error::ToolError;
use reckon_core::tool::Tool;
use reckon_core::value::ToolValue;

type Op = fn(&[ArgValue]) -> Result<ToolValue, String>;

/// A pure tool backed by a function pointer.
pub struct MathTool {
    name: &'static str,
    description: &'static str,
    params: &'static [Param],
    op: Op,
}

impl MathTool {
    pub const fn new(
        name: &'static str,
        description: &'static str,
        params: &'static [Param],
        op: Op,
    ) -> Self {
        Self {
            name,
            description,
            params,
            op,
        }
    }
}

#[async_trait]
impl Tool for MathTool {
    fn name(&self) -> &str {
        self.name
    }

    fn description(&self) -> &str {
        self.description
    }

    fn params(&self) -> &[Param] {
        self.params
    }

    async fn execute(&self, args: Vec<ArgValue>) -> Result<ToolValue, ToolError> {
        (self.op)(&args).map_err(|reason| ToolError::invalid(self.name, reason))
    }
}

const A_B: &[Param] = &[
    Param::new("a", ArgKind::Number),
    Param::new("b", ArgKind::Number),
];
const A: &[Param] = &[Param::new("a", ArgKind::Number)];
const INT_A: &[Param] = &[Param::new("a", ArgKind::Int)];
const INT_A_B: &[Param] = &[Param::new("a", ArgKind::Int), Param::new("b", ArgKind::Int)];
const NUMBERS: &[Param] = &[Param::new("numbers", ArgKind::NumberList)];

/// All arithmetic and trigonometry tools.
pub fn tools() -> Vec<MathTool> {
    vec![
        MathTool::new("add", "Add two numbers.", A_B, add),
        MathTool::new("add_list", "Add all numbers in a list.", NUMBERS, add_list),
        MathTool::new("subtract", "Subtract b from a.", A_B, subtract),
        MathTool::new("multiply", "Multiply two numbers.", A_B, multiply),
        MathTool::new("divide", "Divide a by b.", A_B, divide),
        MathTool::new("power", "Raise a to the power b.", A_B, power),
        MathTool::new("sqrt", "Square root of a.", A, sqrt),
        MathTool::new("cbrt", "Cube root of a.", A, cbrt),
        MathTool::new("factorial", "Factorial of a non-negative integer.", INT_A, factorial),
        MathTool::new("log", "Natural logarithm of a.", A, log),
        MathTool::new("remainder", "Remainder of a divided by b.", INT_A_B, remainder),
        MathTool::new("sin", "Sine of a (radians).", A, sin),
        MathTool::new("cos", "Cosine of a (radians).", A, cos),
        MathTool::new("tan", "Tangent of a (radians).", A, tan),
    ]
}

fn number(args: &[ArgValue], i: usize) -> Result<Number, String> {
    args.get(i)
        .and_then(ArgValue::as_number)
        .ok_or_else(|| format!("argument {} is not a number", i + 1))
}

fn int(args: &[ArgValue], i: usize) -> Result<i64, String> {
    args.get(i)
        .and_then(ArgValue::as_int)
        .ok_or_else(|| format!("argument {} is not an integer", i + 1))
}

/// Apply `exact` when both operands are integers, `float` otherwise.
fn binary(
    args: &[ArgValue],
    exact: fn(i64, i64) -> Option<i64>,
    float: fn(f64, f64) -> f64,
) -> Result<ToolValue, String> {
    match (number(args, 0)?, number(args, 1)?) {
        (Number::Int(a), Number::Int(b)) => exact(a, b)
            .map(|v| ToolValue::Int(v as i128))
            .ok_or_else(|| "integer overflow".to_string()),
        (a, b) => Ok(ToolValue::Float(float(a.as_f64(), b.as_f64()))),
    }
}

fn add(args: &[ArgValue]) -> Result<ToolValue, String> {
    binary(args, i64::checked_add, |a, b| a + b)
}

fn subtract(args: &[ArgValue]) -> Result<ToolValue, String> {
    binary(args, i64::checked_sub, |a, b| a - b)
}

fn multiply(args: &[ArgValue]) -> Result<ToolValue, String> {
    binary(args, i64::checked_mul, |a, b| a * b)
}

fn add_list(args: &[ArgValue]) -> Result<ToolValue, String> {
    let numbers = args
        .first()
        .and_then(ArgValue::as_number_list)
        .ok_or("expected a list of numbers")?;

    let mut exact: Option<i128> = Some(0);
    let mut float = 0.0;
    for n in numbers {
        float += n.as_f64();
        exact = match (exact, n) {
            (Some(acc), Number::Int(i)) => acc.checked_add(*i as i128),
            _ => None,
        };
    }

    Ok(match exact {
        Some(sum) => ToolValue::Int(sum),
        None => ToolValue::Float(float),
    })
}

fn divide(args: &[ArgValue]) -> Result<ToolValue, String> {
    let (a, b) = (number(args, 0)?.as_f64(), number(args, 1)?.as_f64());
    if b == 0.0 {
        return Err("division by zero".into());
    }
    Ok(ToolValue::Float(a / b))
}

fn power(args: &[ArgValue]) -> Result<ToolValue, String> {
    let (a, b) = (number(args, 0)?, number(args, 1)?);
    if let (Number::Int(base), Number::Int(exp)) = (a, b) {
        let exact = u32::try_from(exp)
            .ok()
            .and_then(|e| (base as i128).checked_pow(e));
        if let Some(v) = exact {
            return Ok(ToolValue::Int(v));
        }
    }
    let v = a.as_f64().powf(b.as_f64());
    if v.is_nan() {
        return Err(format!("{} ^ {} is not a real number", a.as_f64(), b.as_f64()));
    }
    Ok(ToolValue::Float(v))
}

fn sqrt(args: &[ArgValue]) -> Result<ToolValue, String> {
    let a = number(args, 0)?.as_f64();
    if a < 0.0 {
        return Err("cannot take the square root of a negative number".into());
    }
    Ok(ToolValue::Float(a.sqrt()))
}

fn cbrt(args: &[ArgValue]) -> Result<ToolValue, String> {
    Ok(ToolValue::Float(number(args, 0)?.as_f64().cbrt()))
}

/// Largest n whose factorial fits in an i128.
const MAX_FACTORIAL: i64 = 33;

fn factorial(args: &[ArgValue]) -> Result<ToolValue, String> {
    let a = int(args, 0)?;
    if a < 0 {
        return Err("factorial is not defined for negative numbers".into());
    }
    if a > MAX_FACTORIAL {
        return Err(format!("factorial overflows above {MAX_FACTORIAL}"));
    }
    Ok(ToolValue::Int((1..=a as i128).product()))
}

fn log(args: &[ArgValue]) -> Result<ToolValue, String> {
    let a = number(args, 0)?.as_f64();
    if a <= 0.0 {
        return Err("cannot take the log of a non-positive number".into());
    }
    Ok(ToolValue::Float(a.ln()))
}

fn remainder(args: &[ArgValue]) -> Result<ToolValue, String> {
    let (a, b) = (int(args, 0)? as i128, int(args, 1)? as i128);
    if b == 0 {
        return Err("modulo by zero".into());
    }
    // Result takes the sign of the divisor.
    let mut r = a % b;
    if r != 0 && (r < 0) != (b < 0) {
        r += b;
    }
    Ok(ToolValue::Int(r))
}

fn sin(args: &[ArgValue]) -> Result<ToolValue, String> {
    Ok(ToolValue::Float(number(args, 0)?.as_f64().sin()))
}

fn cos(args: &[ArgValue]) -> Result<ToolValue, String> {
    Ok(ToolValue::Float(number(args, 0)?.as_f64().cos()))
}

fn tan(args: &[ArgValue]) -> Result<ToolValue, String> {
    Ok(ToolValue::Float(number(args, 0)?.as_f64().tan()))
}
