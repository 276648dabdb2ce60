//! Calculator arithmetic and number rendering
//!
//! Results are rendered the way JavaScript's `Number#toString` does, so clients
//! see `5` rather than `5.0` and `2.5` rather than `2.50000`.

use rust_mcp_sdk::macros;
use serde::{Deserialize, Serialize};

pub const DIVIDE_BY_ZERO_MESSAGE: &str = "Error: Cannot divide by zero";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, macros::JsonSchema)]
pub enum Operation {
    #[serde(rename = "add")]
    Add,
    #[serde(rename = "subtract")]
    Subtract,
    #[serde(rename = "multiply")]
    Multiply,
    #[serde(rename = "divide")]
    Divide,
}

/// Outcome of a calculation. Division by zero is a regular outcome, not an error.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Outcome {
    Value(f64),
    DivideByZero,
}

impl Outcome {
    pub fn render(self) -> String {
        match self {
            Self::Value(value) => format_number(value),
            Self::DivideByZero => DIVIDE_BY_ZERO_MESSAGE.to_string(),
        }
    }
}

pub fn add(a: f64, b: f64) -> f64 {
    a + b
}

pub fn calculate(operation: Operation, a: f64, b: f64) -> Outcome {
    match operation {
        Operation::Add => Outcome::Value(a + b),
        Operation::Subtract => Outcome::Value(a - b),
        Operation::Multiply => Outcome::Value(a * b),
        // `-0.0 == 0.0` holds, so negative zero is caught too.
        Operation::Divide if b == 0.0 => Outcome::DivideByZero,
        Operation::Divide => Outcome::Value(a / b),
    }
}

/// Renders a number using the shortest decimal that round-trips, in the same
/// layout as ECMAScript's Number-to-String conversion.
pub fn format_number(value: f64) -> String {
    if value.is_nan() {
        return "NaN".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    if value == 0.0 {
        return "0".to_string();
    }

    let sign = if value < 0.0 { "-" } else { "" };
    // `{:e}` yields the shortest round-trip digits as `d.ddddeN`.
    let scientific = format!("{:e}", value.abs());
    let (mantissa, exponent) = scientific
        .split_once('e')
        .unwrap_or((scientific.as_str(), "0"));
    let digits: String = mantissa.chars().filter(|c| *c != '.').collect();
    let exponent: i32 = exponent.parse().unwrap_or(0);

    let k = digits.len() as i32;
    let n = exponent + 1;

    let body = if k <= n && n <= 21 {
        format!("{digits}{}", "0".repeat((n - k) as usize))
    } else if 0 < n && n <= 21 {
        let (int_part, frac_part) = digits.split_at(n as usize);
        format!("{int_part}.{frac_part}")
    } else if -6 < n && n <= 0 {
        format!("0.{}{digits}", "0".repeat((-n) as usize))
    } else {
        let exp_sign = if n - 1 < 0 { '-' } else { '+' };
        let exp_abs = (n - 1).abs();
        let (first, rest) = digits.split_at(1);
        if rest.is_empty() {
            format!("{first}e{exp_sign}{exp_abs}")
        } else {
            format!("{first}.{rest}e{exp_sign}{exp_abs}")
        }
    };

    format!("{sign}{body}")
}
