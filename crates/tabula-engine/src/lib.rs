//! tabula_engine - cell addressing, formula parsing and evaluation.

pub mod engine;

pub use engine::{Formula, FormulaError, FormulaParseError, Position, Value};
