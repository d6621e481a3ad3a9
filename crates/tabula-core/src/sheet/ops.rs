use std::collections::VecDeque;

use tabula_engine::Position;
use tracing::{debug, trace};

use super::Sheet;
use crate::cell::Cell;
use crate::error::{Result, SheetError};

impl Sheet {
    /// Set cell contents from input text.
    ///
    /// The update is all-or-nothing: an invalid position, a formula that
    /// fails to parse, or a formula that would make the cell depend on
    /// itself is rejected before anything in the sheet changes.
    pub fn set_cell(&mut self, pos: Position, text: impl Into<String>) -> Result<()> {
        if !pos.is_valid() {
            return Err(SheetError::InvalidPosition(pos));
        }

        let mut new_cell = Cell::new();
        if let Err(err) = new_cell.set_content(text.into()) {
            debug!(%pos, %err, "rejected formula");
            return Err(err.into());
        }

        let refs = new_cell.referenced_positions().to_vec();
        if self.reaches(&refs, pos) {
            let formula = new_cell.text();
            debug!(%pos, %formula, "rejected circular formula");
            return Err(SheetError::CircularDependency {
                position: pos,
                formula,
            });
        }

        // Every referenced position must hold a cell before edges point at it.
        for r in &refs {
            let slot = self.slot_mut(*r);
            if slot.is_none() {
                *slot = Some(Cell::new());
            }
        }

        let previous = self.slot_mut(pos).take();
        if let Some(mut old) = previous {
            // Cells that referenced this position keep referencing it.
            new_cell.set_dependents(old.take_dependents());
            self.unlink(pos, old.referenced_positions());
        }
        for r in &refs {
            if let Some(cell) = self.cell_mut(*r) {
                cell.add_dependent(pos);
            }
        }
        *self.slot_mut(pos) = Some(new_cell);

        self.invalidate_cache(pos);
        debug!(%pos, refs = refs.len(), "set cell");
        Ok(())
    }

    /// Remove a cell's content.
    ///
    /// A cell that other formulas still reference is replaced by an empty
    /// placeholder so those references stay resolvable.
    pub fn clear_cell(&mut self, pos: Position) -> Result<()> {
        if !pos.is_valid() {
            return Err(SheetError::InvalidPosition(pos));
        }
        if self.cell(pos).is_none() {
            return Ok(());
        }
        let Some(mut old) = self.slot_mut(pos).take() else {
            return Ok(());
        };

        self.unlink(pos, old.referenced_positions());
        let dependents = old.take_dependents();
        if !dependents.is_empty() {
            let mut placeholder = Cell::new();
            placeholder.set_dependents(dependents);
            *self.slot_mut(pos) = Some(placeholder);
            self.invalidate_cache(pos);
        }

        debug!(%pos, "cleared cell");
        Ok(())
    }

    /// Drop the memoized value at `origin` and of every cell that depends
    /// on it, transitively. Returns how many memoized values were dropped.
    ///
    /// A dependent whose value is already unset is not expanded: nothing
    /// downstream of it can hold a value, since reading a formula memoizes
    /// its precedents first.
    pub(crate) fn invalidate_cache(&self, origin: Position) -> usize {
        let Some(cell) = self.cell(origin) else {
            return 0;
        };
        let mut cleared = usize::from(cell.clear_cache());
        let mut queue: VecDeque<Position> = cell.dependents().collect();

        while let Some(pos) = queue.pop_front() {
            let Some(cell) = self.cell(pos) else {
                continue;
            };
            if !cell.clear_cache() {
                continue;
            }
            cleared += 1;
            queue.extend(cell.dependents());
        }

        trace!(%origin, cleared, "invalidated cache");
        cleared
    }

    /// Remove `pos` from the dependents of each cell in `refs`.
    fn unlink(&mut self, pos: Position, refs: &[Position]) {
        for r in refs {
            if let Some(cell) = self.cell_mut(*r) {
                cell.remove_dependent(pos);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Size;
    use tabula_engine::{FormulaError, FormulaParseError, Value};

    fn pos(name: &str) -> Position {
        Position::parse(name)
    }

    fn value(sheet: &Sheet, name: &str) -> Value {
        sheet.get_cell(pos(name)).unwrap().unwrap().value(sheet)
    }

    fn text(sheet: &Sheet, name: &str) -> String {
        sheet.get_cell(pos(name)).unwrap().unwrap().text()
    }

    fn dependents(sheet: &Sheet, name: &str) -> Vec<String> {
        sheet
            .get_cell(pos(name))
            .unwrap()
            .unwrap()
            .dependents()
            .map(|p| p.to_string())
            .collect()
    }

    #[test]
    fn test_set_plain_text() {
        let mut sheet = Sheet::new();
        sheet.set_cell(pos("A1"), "Hello").unwrap();
        sheet.set_cell(pos("A1"), "World").unwrap();
        sheet.set_cell(pos("B2"), "Purr").unwrap();
        assert_eq!(text(&sheet, "A1"), "World");
        assert_eq!(value(&sheet, "A1"), Value::Text("World".to_string()));
        assert_eq!(value(&sheet, "B2"), Value::Text("Purr".to_string()));
    }

    #[test]
    fn test_escape_literal() {
        let mut sheet = Sheet::new();
        sheet.set_cell(pos("A1"), "'=notaformula").unwrap();
        assert_eq!(text(&sheet, "A1"), "'=notaformula");
        assert_eq!(value(&sheet, "A1"), Value::Text("=notaformula".to_string()));
    }

    #[test]
    fn test_invalid_positions_are_rejected() {
        let mut sheet = Sheet::new();
        let bad = Position::new(-1, 0);
        assert_eq!(
            sheet.set_cell(bad, "x").unwrap_err(),
            SheetError::InvalidPosition(bad)
        );
        let bad = Position::new(tabula_engine::engine::MAX_ROWS, 0);
        assert_eq!(
            sheet.clear_cell(bad).unwrap_err(),
            SheetError::InvalidPosition(bad)
        );
        assert_eq!(sheet.cells().count(), 0);
    }

    #[test]
    fn test_cache_follows_writes() {
        let mut sheet = Sheet::new();
        sheet.set_cell(pos("A1"), "5").unwrap();
        sheet.set_cell(pos("B1"), "=A1+1").unwrap();
        assert_eq!(value(&sheet, "B1"), Value::Number(6.0));

        sheet.set_cell(pos("A1"), "10").unwrap();
        assert_eq!(value(&sheet, "B1"), Value::Number(11.0));
    }

    #[test]
    fn test_transitive_invalidation() {
        let mut sheet = Sheet::new();
        sheet.set_cell(pos("A1"), "1").unwrap();
        sheet.set_cell(pos("B1"), "=A1").unwrap();
        sheet.set_cell(pos("C1"), "=B1").unwrap();
        assert_eq!(value(&sheet, "C1"), Value::Number(1.0));

        sheet.set_cell(pos("A1"), "2").unwrap();
        assert_eq!(value(&sheet, "C1"), Value::Number(2.0));
    }

    #[test]
    fn test_invalidation_covers_shared_ancestors() {
        let mut sheet = Sheet::new();
        sheet.set_cell(pos("A1"), "1").unwrap();
        sheet.set_cell(pos("B1"), "=A1*2").unwrap();
        sheet.set_cell(pos("C1"), "=A1*3").unwrap();
        sheet.set_cell(pos("D1"), "=B1+C1").unwrap();
        assert_eq!(value(&sheet, "D1"), Value::Number(5.0));

        sheet.set_cell(pos("A1"), "2").unwrap();
        for name in ["A1", "B1", "C1", "D1"] {
            let cell = sheet.get_cell(pos(name)).unwrap().unwrap();
            assert!(!cell.has_cached_value(), "{name}");
        }
        assert_eq!(value(&sheet, "D1"), Value::Number(10.0));
    }

    #[test]
    fn test_rewrite_with_same_text_still_invalidates() {
        let mut sheet = Sheet::new();
        sheet.set_cell(pos("A1"), "3").unwrap();
        sheet.set_cell(pos("B1"), "=A1").unwrap();
        assert_eq!(value(&sheet, "B1"), Value::Number(3.0));
        sheet.set_cell(pos("A1"), "3").unwrap();
        assert!(!sheet.get_cell(pos("B1")).unwrap().unwrap().has_cached_value());
    }

    #[test]
    fn test_division_error_propagates() {
        let mut sheet = Sheet::new();
        sheet.set_cell(pos("A1"), "=1/0").unwrap();
        sheet.set_cell(pos("B1"), "=A1+1").unwrap();
        assert_eq!(value(&sheet, "A1"), Value::Error(FormulaError::Div0));
        assert_eq!(value(&sheet, "A1").to_string(), "#DIV/0!");
        assert_eq!(value(&sheet, "B1"), Value::Error(FormulaError::Div0));
    }

    #[test]
    fn test_text_operand_is_value_error() {
        let mut sheet = Sheet::new();
        sheet.set_cell(pos("A1"), "meow").unwrap();
        sheet.set_cell(pos("A2"), "'7").unwrap();
        sheet.set_cell(pos("A3"), "7").unwrap();
        sheet.set_cell(pos("B1"), "=A1*2").unwrap();
        sheet.set_cell(pos("B2"), "=A2*2").unwrap();
        sheet.set_cell(pos("B3"), "=A3*2").unwrap();
        assert_eq!(value(&sheet, "B1"), Value::Error(FormulaError::Value));
        assert_eq!(value(&sheet, "B2"), Value::Error(FormulaError::Value));
        assert_eq!(value(&sheet, "B3"), Value::Number(14.0));
    }

    #[test]
    fn test_out_of_grid_reference_is_ref_error() {
        let mut sheet = Sheet::new();
        sheet.set_cell(pos("A1"), "=ZZZZ1+1").unwrap();
        assert_eq!(value(&sheet, "A1"), Value::Error(FormulaError::Ref));
        assert_eq!(text(&sheet, "A1"), "=ZZZZ1+1");
        assert_eq!(sheet.cells().count(), 1);
    }

    #[test]
    fn test_referenced_cells_are_created_empty() {
        let mut sheet = Sheet::new();
        sheet.set_cell(pos("A1"), "=B1+1").unwrap();
        assert_eq!(value(&sheet, "B1"), Value::empty());
        assert_eq!(text(&sheet, "B1"), "");
        assert_eq!(value(&sheet, "A1"), Value::Number(1.0));
        assert_eq!(dependents(&sheet, "B1"), ["A1"]);

        sheet.clear_cell(pos("A1")).unwrap();
        assert!(dependents(&sheet, "B1").is_empty());
        assert!(sheet.get_cell(pos("A1")).unwrap().is_none());
    }

    #[test]
    fn test_rewrite_moves_edges() {
        let mut sheet = Sheet::new();
        sheet.set_cell(pos("A1"), "=B1+C1").unwrap();
        sheet.set_cell(pos("A1"), "=C1+D1").unwrap();
        assert!(dependents(&sheet, "B1").is_empty());
        assert_eq!(dependents(&sheet, "C1"), ["A1"]);
        assert_eq!(dependents(&sheet, "D1"), ["A1"]);

        sheet.set_cell(pos("A1"), "plain").unwrap();
        assert!(dependents(&sheet, "C1").is_empty());
        assert!(dependents(&sheet, "D1").is_empty());
    }

    #[test]
    fn test_replacement_keeps_dependents() {
        let mut sheet = Sheet::new();
        sheet.set_cell(pos("B1"), "=A1*2").unwrap();
        sheet.set_cell(pos("A1"), "4").unwrap();
        assert_eq!(dependents(&sheet, "A1"), ["B1"]);
        assert_eq!(value(&sheet, "B1"), Value::Number(8.0));

        sheet.set_cell(pos("A1"), "=C1+1").unwrap();
        assert_eq!(dependents(&sheet, "A1"), ["B1"]);
        assert_eq!(value(&sheet, "B1"), Value::Number(2.0));
    }

    #[test]
    fn test_self_reference_is_rejected() {
        let mut sheet = Sheet::new();
        sheet.set_cell(pos("A1"), "7").unwrap();
        let err = sheet.set_cell(pos("A1"), "=A1").unwrap_err();
        assert_eq!(
            err,
            SheetError::CircularDependency {
                position: pos("A1"),
                formula: "=A1".to_string()
            }
        );
        assert_eq!(text(&sheet, "A1"), "7");
        assert_eq!(value(&sheet, "A1"), Value::Number(7.0));
    }

    #[test]
    fn test_indirect_cycle_is_rejected_without_side_effects() {
        let mut sheet = Sheet::new();
        sheet.set_cell(pos("A1"), "=B1+1").unwrap();
        sheet.set_cell(pos("B1"), "=C1+1").unwrap();
        assert_eq!(value(&sheet, "A1"), Value::Number(2.0));

        let err = sheet.set_cell(pos("C1"), "=A1 + E5").unwrap_err();
        assert!(matches!(err, SheetError::CircularDependency { .. }));
        assert_eq!(err.to_string(), "circular dependency at C1: =A1+E5");

        assert_eq!(text(&sheet, "C1"), "");
        assert!(sheet.get_cell(pos("E5")).unwrap().is_none());
        assert!(dependents(&sheet, "A1").is_empty());
        assert!(sheet.get_cell(pos("A1")).unwrap().unwrap().has_cached_value());
        assert_eq!(value(&sheet, "A1"), Value::Number(2.0));
    }

    #[test]
    fn test_diamond_is_not_a_cycle() {
        let mut sheet = Sheet::new();
        sheet.set_cell(pos("B1"), "=A1").unwrap();
        sheet.set_cell(pos("C1"), "=A1").unwrap();
        sheet.set_cell(pos("D1"), "=B1+C1").unwrap();
        sheet.set_cell(pos("E1"), "=D1+B1+A1").unwrap();
        sheet.set_cell(pos("A1"), "2").unwrap();
        assert_eq!(value(&sheet, "E1"), Value::Number(8.0));
    }

    #[test]
    fn test_parse_error_leaves_sheet_unchanged() {
        let mut sheet = Sheet::new();
        sheet.set_cell(pos("A1"), "=B1").unwrap();
        let err = sheet.set_cell(pos("A1"), "=(C1").unwrap_err();
        assert_eq!(err, SheetError::FormulaParse(FormulaParseError::UnbalancedParen));
        assert_eq!(text(&sheet, "A1"), "=B1");
        assert!(sheet.get_cell(pos("C1")).unwrap().is_none());
        assert_eq!(dependents(&sheet, "B1"), ["A1"]);
    }

    #[test]
    fn test_clear_missing_cell_is_noop() {
        let mut sheet = Sheet::new();
        sheet.clear_cell(pos("A1")).unwrap();
        sheet.clear_cell(pos("J10")).unwrap();
        assert_eq!(sheet.cells().count(), 0);
    }

    #[test]
    fn test_clear_referenced_cell_leaves_placeholder() {
        let mut sheet = Sheet::new();
        sheet.set_cell(pos("A1"), "5").unwrap();
        sheet.set_cell(pos("B1"), "=A1*2").unwrap();
        assert_eq!(value(&sheet, "B1"), Value::Number(10.0));

        sheet.clear_cell(pos("A1")).unwrap();
        let placeholder = sheet.get_cell(pos("A1")).unwrap().unwrap();
        assert!(placeholder.is_empty());
        assert_eq!(dependents(&sheet, "A1"), ["B1"]);
        assert_eq!(value(&sheet, "B1"), Value::Number(0.0));
        assert_eq!(sheet.printable_size(), Size { rows: 1, cols: 2 });
    }

    #[test]
    fn test_clear_formula_cell() {
        let mut sheet = Sheet::new();
        sheet.set_cell(pos("C2"), "Me gusta").unwrap();
        sheet.clear_cell(pos("C2")).unwrap();
        assert!(sheet.get_cell(pos("C2")).unwrap().is_none());
        assert_eq!(sheet.printable_size(), Size::default());
    }

    #[test]
    fn test_invalidate_cache_counts_cleared_values() {
        let mut sheet = Sheet::new();
        sheet.set_cell(pos("A1"), "1").unwrap();
        sheet.set_cell(pos("B1"), "=A1").unwrap();
        sheet.set_cell(pos("C1"), "=B1").unwrap();
        value(&sheet, "C1");
        assert_eq!(sheet.invalidate_cache(pos("A1")), 3);
        assert_eq!(sheet.invalidate_cache(pos("A1")), 0);
    }
}
