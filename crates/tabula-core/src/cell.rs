//! Cell data structures for the sheet grid.
//!
//! This module provides the per-slot storage type:
//! - [`Content`] - What the user put in the cell (empty, literal text, or formula)
//! - [`Cell`] - Content plus a memoized value and the set of dependent cells
//!
//! Dependents are stored as positions, not references, and are resolved
//! through the owning [`Sheet`](crate::Sheet). Only the sheet rewires them.

use std::cell::RefCell;
use std::collections::BTreeSet;

use tabula_engine::{Formula, FormulaParseError, Position, Value, engine::parse_number};

use crate::sheet::Sheet;

/// Leading character that marks cell text as a formula.
pub const FORMULA_MARKER: char = '=';
/// Leading character that forces the rest of the text to be a literal string.
pub const ESCAPE_MARKER: char = '\'';

/// The content of a cell.
#[derive(Clone, Debug, Default)]
pub enum Content {
    #[default]
    Empty,
    /// Literal text exactly as entered, escape marker included.
    Text(String),
    Formula(Formula),
}

/// A cell in the sheet grid.
#[derive(Debug, Default)]
pub struct Cell {
    content: Content,
    /// Memoized value; `None` means it must be recomputed on the next read.
    cache: RefCell<Option<Value>>,
    /// Cells whose formulas reference this one.
    dependents: BTreeSet<Position>,
}

impl Cell {
    pub fn new() -> Cell {
        Cell::default()
    }

    /// Replace the cell's content from user input.
    ///
    /// - `"=expr"` (marker followed by at least one character) -> Formula
    /// - `""` -> Empty
    /// - Anything else, including `"="` alone and `"'..."` -> Text
    ///
    /// On a formula parse error the previous content is left untouched.
    pub fn set_content(&mut self, text: String) -> Result<(), FormulaParseError> {
        let marker_len = FORMULA_MARKER.len_utf8();
        let content = if text.is_empty() {
            Content::Empty
        } else if text.starts_with(FORMULA_MARKER) && text.len() > marker_len {
            Content::Formula(Formula::parse(&text[marker_len..])?)
        } else {
            Content::Text(text)
        };
        self.content = content;
        self.clear_cache();
        Ok(())
    }

    pub fn content(&self) -> &Content {
        &self.content
    }

    pub fn is_empty(&self) -> bool {
        matches!(self.content, Content::Empty)
    }

    /// Text as entered; formulas are rendered in canonical form.
    pub fn text(&self) -> String {
        match &self.content {
            Content::Empty => String::new(),
            Content::Text(text) => text.clone(),
            Content::Formula(formula) => format!("{}{}", FORMULA_MARKER, formula.expression()),
        }
    }

    /// Cells read by this cell's formula (empty for non-formula cells).
    pub fn referenced_positions(&self) -> &[Position] {
        match &self.content {
            Content::Formula(formula) => formula.referenced_cells(),
            _ => &[],
        }
    }

    /// Cells whose formulas reference this cell.
    pub fn dependents(&self) -> impl Iterator<Item = Position> + '_ {
        self.dependents.iter().copied()
    }

    pub fn has_cached_value(&self) -> bool {
        self.cache.borrow().is_some()
    }

    /// Evaluate the cell, reading referenced cells from `sheet`.
    ///
    /// The result is memoized until the sheet invalidates it.
    pub fn value(&self, sheet: &Sheet) -> Value {
        if let Some(cached) = self.cache.borrow().as_ref() {
            return cached.clone();
        }

        let value = match &self.content {
            Content::Empty => Value::empty(),
            Content::Text(text) => text_value(text),
            Content::Formula(formula) => {
                sheet.warm_cache(formula.referenced_cells());
                Value::from(formula.evaluate(|pos| sheet.operand(pos)))
            }
        };

        *self.cache.borrow_mut() = Some(value.clone());
        value
    }

    /// Drop the memoized value. Returns whether there was one.
    pub(crate) fn clear_cache(&self) -> bool {
        self.cache.borrow_mut().take().is_some()
    }

    pub(crate) fn add_dependent(&mut self, pos: Position) {
        self.dependents.insert(pos);
    }

    pub(crate) fn remove_dependent(&mut self, pos: Position) {
        self.dependents.remove(&pos);
    }

    pub(crate) fn take_dependents(&mut self) -> BTreeSet<Position> {
        std::mem::take(&mut self.dependents)
    }

    pub(crate) fn set_dependents(&mut self, dependents: BTreeSet<Position>) {
        self.dependents = dependents;
    }
}

/// Value of literal text: escaped text is a string with the marker removed,
/// numeric text is a number, everything else is the text itself.
fn text_value(text: &str) -> Value {
    if let Some(literal) = text.strip_prefix(ESCAPE_MARKER) {
        return Value::Text(literal.to_string());
    }
    match parse_number(text) {
        Some(n) => Value::Number(n),
        None => Value::Text(text.to_string()),
    }
}
