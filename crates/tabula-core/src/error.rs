//! Error types for Tabula core.

use tabula_engine::{FormulaParseError, Position};
use thiserror::Error;

/// Errors that reject a sheet operation. A rejected operation leaves the
/// sheet exactly as it was.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SheetError {
    #[error("invalid position: ({}, {})", .0.row, .0.col)]
    InvalidPosition(Position),

    #[error("formula parse error: {0}")]
    FormulaParse(#[from] FormulaParseError),

    #[error("circular dependency at {position}: {formula}")]
    CircularDependency { position: Position, formula: String },
}

pub type Result<T> = std::result::Result<T, SheetError>;
