//! Circular dependency detection for formula cells.
//!
//! Before a formula is installed we must verify that none of the cells it
//! reads already depends on the cell being written (e.g., writing `=B1` into
//! A1 while B1 references C1 and C1 references A1). The search walks the
//! "depends on" direction breadth-first with an explicit queue.

use std::collections::{HashSet, VecDeque};

use tabula_engine::Position;

use super::Sheet;

impl Sheet {
    /// Returns true if `target` is reachable from `refs` by following
    /// formula references through the current sheet.
    pub(crate) fn reaches(&self, refs: &[Position], target: Position) -> bool {
        let mut queue: VecDeque<Position> = refs.iter().copied().collect();
        let mut visited = HashSet::new();

        while let Some(pos) = queue.pop_front() {
            if pos == target {
                return true;
            }
            if !visited.insert(pos) {
                continue;
            }
            if let Some(cell) = self.cell(pos) {
                queue.extend(cell.referenced_positions().iter().copied());
            }
        }

        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pos(name: &str) -> Position {
        Position::parse(name)
    }

    #[test]
    fn test_direct_self_reference() {
        let sheet = Sheet::new();
        assert!(sheet.reaches(&[pos("A1")], pos("A1")));
    }

    #[test]
    fn test_indirect_reference() {
        let mut sheet = Sheet::new();
        sheet.set_cell(pos("B1"), "=C1").unwrap();
        sheet.set_cell(pos("C1"), "=A1*2").unwrap();
        assert!(sheet.reaches(&[pos("B1")], pos("A1")));
        assert!(!sheet.reaches(&[pos("B1")], pos("D1")));
    }

    #[test]
    fn test_shared_precedents_are_not_cycles() {
        let mut sheet = Sheet::new();
        sheet.set_cell(pos("B1"), "=A1").unwrap();
        sheet.set_cell(pos("C1"), "=A1").unwrap();
        assert!(!sheet.reaches(&[pos("B1"), pos("C1")], pos("D1")));
    }

    #[test]
    fn test_missing_cells_end_the_search() {
        let sheet = Sheet::new();
        assert!(!sheet.reaches(&[pos("Q9"), pos("R10")], pos("A1")));
    }
}
