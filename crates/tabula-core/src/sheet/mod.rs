//! Sheet state and logic.

mod cycle;
mod ops;
mod print;

use std::collections::HashSet;

use tabula_engine::{FormulaError, Position};

use crate::cell::Cell;
use crate::error::{Result, SheetError};

/// Height and width of a rectangular area, in cells.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Size {
    pub rows: i32,
    pub cols: i32,
}

/// A grid of cells whose formulas keep each other up to date.
///
/// Storage is a row-major table of optional cells that only ever grows.
/// Dependency edges are kept on the cells themselves as positions:
/// if the formula at `A` references `B`, then `B`'s dependents contain `A`.
#[derive(Debug, Default)]
pub struct Sheet {
    rows: Vec<Vec<Option<Cell>>>,
}

impl Sheet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a cell without creating it.
    pub fn get_cell(&self, pos: Position) -> Result<Option<&Cell>> {
        if !pos.is_valid() {
            return Err(SheetError::InvalidPosition(pos));
        }
        Ok(self.cell(pos))
    }

    /// Smallest bounding box that covers every non-empty cell.
    ///
    /// Empty placeholder cells created for formula references do not count.
    pub fn printable_size(&self) -> Size {
        let mut size = Size::default();
        for (pos, cell) in self.cells() {
            if !cell.is_empty() {
                size.rows = size.rows.max(pos.row + 1);
                size.cols = size.cols.max(pos.col + 1);
            }
        }
        size
    }

    /// All occupied slots in row-major order, placeholders included.
    pub fn cells(&self) -> impl Iterator<Item = (Position, &Cell)> + '_ {
        self.rows.iter().enumerate().flat_map(|(row, cols)| {
            cols.iter().enumerate().filter_map(move |(col, slot)| {
                slot.as_ref()
                    .map(|cell| (Position::new(row as i32, col as i32), cell))
            })
        })
    }

    pub(crate) fn cell(&self, pos: Position) -> Option<&Cell> {
        if !pos.is_valid() {
            return None;
        }
        self.rows
            .get(pos.row as usize)?
            .get(pos.col as usize)?
            .as_ref()
    }

    pub(crate) fn cell_mut(&mut self, pos: Position) -> Option<&mut Cell> {
        if !pos.is_valid() {
            return None;
        }
        self.rows
            .get_mut(pos.row as usize)?
            .get_mut(pos.col as usize)?
            .as_mut()
    }

    /// Slot for a valid position, growing the table to reach it.
    pub(crate) fn slot_mut(&mut self, pos: Position) -> &mut Option<Cell> {
        let (row, col) = (pos.row as usize, pos.col as usize);
        if self.rows.len() <= row {
            self.rows.resize_with(row + 1, Vec::new);
        }
        let cols = &mut self.rows[row];
        if cols.len() <= col {
            cols.resize_with(col + 1, || None);
        }
        &mut cols[col]
    }

    /// A referenced cell's value as a formula operand. Absent cells read as 0.
    pub(crate) fn operand(&self, pos: Position) -> std::result::Result<f64, FormulaError> {
        if !pos.is_valid() {
            return Err(FormulaError::Ref);
        }
        match self.cell(pos) {
            Some(cell) => cell.value(self).as_operand(),
            None => Ok(0.0),
        }
    }

    /// Compute and memoize every uncached cell reachable from `roots`,
    /// precedents first, using an explicit stack.
    ///
    /// Afterwards, evaluating a formula over `roots` only reads memoized
    /// values, so long reference chains never recurse through evaluation.
    pub(crate) fn warm_cache(&self, roots: &[Position]) {
        let mut stack: Vec<(Position, bool)> = roots.iter().rev().map(|p| (*p, false)).collect();
        let mut seen = HashSet::new();

        while let Some((pos, expanded)) = stack.pop() {
            let Some(cell) = self.cell(pos) else {
                continue;
            };
            if expanded {
                cell.value(self);
                continue;
            }
            if cell.has_cached_value() || !seen.insert(pos) {
                continue;
            }
            stack.push((pos, true));
            for dep in cell.referenced_positions().iter().rev() {
                stack.push((*dep, false));
            }
        }
    }
}
