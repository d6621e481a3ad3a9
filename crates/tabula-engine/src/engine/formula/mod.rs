//! Parsed formulas.
//!
//! A [`Formula`] owns the expression tree for the text after a cell's
//! formula marker. It knows which cells it reads and how to compute itself
//! given a way to look those cells up; it knows nothing about sheets.

mod ast;
mod lexer;
mod parser;

use thiserror::Error;

use super::{FormulaError, Position};
use ast::Expr;

/// Errors produced while parsing formula text.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FormulaParseError {
    #[error("empty formula")]
    Empty,

    #[error("unexpected character {ch:?} at offset {offset}")]
    UnexpectedChar { ch: char, offset: usize },

    #[error("invalid number literal {0:?}")]
    InvalidNumber(String),

    #[error("malformed cell reference {0:?}")]
    MalformedReference(String),

    #[error("unexpected token {0:?}")]
    UnexpectedToken(String),

    #[error("unexpected end of formula")]
    UnexpectedEnd,

    #[error("unbalanced parentheses")]
    UnbalancedParen,

    #[error("formula nested too deeply")]
    TooDeep,
}

#[derive(Debug, Clone)]
pub struct Formula {
    expr: Expr,
    referenced: Vec<Position>,
}

impl Formula {
    /// Parse formula text (without the leading marker).
    pub fn parse(expression: &str) -> Result<Formula, FormulaParseError> {
        let tokens = lexer::tokenize(expression)?;
        let expr = parser::parse_expr(&tokens)?;

        let mut referenced = Vec::new();
        expr.collect_refs(&mut referenced);
        referenced.sort();
        referenced.dedup();

        Ok(Formula { expr, referenced })
    }

    /// In-grid cells this formula reads, sorted and without duplicates.
    /// References outside the grid are left out; they evaluate to `#REF!`.
    pub fn referenced_cells(&self) -> &[Position] {
        &self.referenced
    }

    /// Canonical text of the formula (no marker, no spaces, minimal parentheses).
    pub fn expression(&self) -> String {
        let mut out = String::new();
        // Writing into a String cannot fail.
        let _ = self.expr.print(&mut out);
        out
    }

    /// Compute the formula, reading referenced cells through `lookup`.
    pub fn evaluate<F>(&self, lookup: F) -> Result<f64, FormulaError>
    where
        F: Fn(Position) -> Result<f64, FormulaError>,
    {
        self.expr.evaluate(&lookup)
    }
}
