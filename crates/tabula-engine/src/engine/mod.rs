//! Spreadsheet engine API.
//!
//! This module provides everything a sheet needs that is not about storage:
//!
//! - [`Position`] - Cell addressing (A1 notation ↔ row/col indices)
//! - [`Formula`] - Parsed formula with referenced cells and evaluation
//! - [`Value`], [`FormulaError`] - Computed cell values
//! - [`format_number`] - Format numbers for display

mod format;
mod formula;
mod position;
mod value;

pub use format::format_number;
pub use formula::{Formula, FormulaParseError};
pub use position::{MAX_COLS, MAX_ROWS, Position, PositionError};
pub use value::{FormulaError, Value, parse_number};
