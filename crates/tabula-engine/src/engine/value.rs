//! Computed cell values.
//!
//! A [`Value`] is what a cell evaluates to. Formula failures are ordinary
//! values ([`FormulaError`]) that flow through dependent formulas.

use std::fmt;

use super::format::format_number;

/// A computation failure stored as a cell value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FormulaError {
    /// Reference to a cell outside the grid.
    Ref,
    /// Operand of the wrong type, e.g. text used as a number.
    Value,
    /// Division by zero.
    Div0,
    /// Any other non-finite arithmetic result.
    Arith,
}

impl FormulaError {
    pub fn code(self) -> &'static str {
        match self {
            FormulaError::Ref => "#REF!",
            FormulaError::Value => "#VALUE!",
            FormulaError::Div0 => "#DIV/0!",
            FormulaError::Arith => "#ARITH!",
        }
    }
}

impl fmt::Display for FormulaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl std::error::Error for FormulaError {}

/// The evaluated value of a cell.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Number(f64),
    Text(String),
    Error(FormulaError),
}

impl Value {
    pub fn empty() -> Value {
        Value::Text(String::new())
    }

    /// Coerce this value into a formula operand.
    ///
    /// Empty text counts as zero. Any other text is a `#VALUE!` error, since
    /// numeric-looking plain text has already been turned into a number by
    /// the cell that holds it.
    pub fn as_operand(&self) -> Result<f64, FormulaError> {
        match self {
            Value::Number(n) => Ok(*n),
            Value::Text(s) if s.is_empty() => Ok(0.0),
            Value::Text(_) => Err(FormulaError::Value),
            Value::Error(e) => Err(*e),
        }
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<FormulaError> for Value {
    fn from(e: FormulaError) -> Self {
        Value::Error(e)
    }
}

impl From<Result<f64, FormulaError>> for Value {
    fn from(result: Result<f64, FormulaError>) -> Self {
        match result {
            Ok(n) => Value::Number(n),
            Err(e) => Value::Error(e),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(n) => f.write_str(&format_number(*n)),
            Value::Text(s) => f.write_str(s),
            Value::Error(e) => e.fmt(f),
        }
    }
}

/// Parse literal cell text as a number.
///
/// The whole text must be a finite decimal number: `"3.14"` parses,
/// `"3.14x"`, `" 3"`, `"inf"` and `"NaN"` do not.
pub fn parse_number(text: &str) -> Option<f64> {
    let starts_numeric = text
        .bytes()
        .next()
        .is_some_and(|b| b.is_ascii_digit() || matches!(b, b'+' | b'-' | b'.'));
    if !starts_numeric {
        return None;
    }
    text.parse::<f64>().ok().filter(|n| n.is_finite())
}
