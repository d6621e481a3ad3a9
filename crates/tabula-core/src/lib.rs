//! tabula-core - sheet model with a self-maintaining dependency graph.

pub mod cell;
pub mod error;
pub mod sheet;

pub use cell::{Cell, Content, ESCAPE_MARKER, FORMULA_MARKER};
pub use error::{Result, SheetError};
pub use sheet::{Sheet, Size};

pub use tabula_engine::{FormulaError, Position, Value};
