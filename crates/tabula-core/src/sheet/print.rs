//! Tab-separated rendering of the printable area.

use std::fmt::{self, Write};

use tabula_engine::Position;

use super::Sheet;
use crate::cell::Cell;

impl Sheet {
    /// Write every cell's value, one line per row of the printable area.
    pub fn print_values<W: Write>(&self, out: &mut W) -> fmt::Result {
        self.print_with(out, |cell, out| write!(out, "{}", cell.value(self)))
    }

    /// Write every cell's text, one line per row of the printable area.
    pub fn print_texts<W: Write>(&self, out: &mut W) -> fmt::Result {
        self.print_with(out, |cell, out| out.write_str(&cell.text()))
    }

    fn print_with<W, F>(&self, out: &mut W, mut render: F) -> fmt::Result
    where
        W: Write,
        F: FnMut(&Cell, &mut W) -> fmt::Result,
    {
        let size = self.printable_size();
        for row in 0..size.rows {
            for col in 0..size.cols {
                if col > 0 {
                    out.write_char('\t')?;
                }
                if let Some(cell) = self.cell(Position::new(row, col)) {
                    render(cell, out)?;
                }
            }
            out.write_char('\n')?;
        }
        Ok(())
    }
}
