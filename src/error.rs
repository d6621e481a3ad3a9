//! Error types for the Tabula command front end

use tabula_core::SheetError;
use tabula_engine::engine::PositionError;
use thiserror::Error;

/// Errors that can occur while running a script line
#[derive(Error, Debug)]
pub enum CommandError {
    #[error("unknown command: {0}")]
    Unknown(String),

    #[error("{0} requires a cell address")]
    MissingAddress(&'static str),

    #[error(transparent)]
    Address(#[from] PositionError),

    #[error("unexpected argument: {0}")]
    UnexpectedArgument(String),

    #[error("unknown print mode: {0} (expected values or texts)")]
    PrintMode(String),

    #[error(transparent)]
    Sheet(#[from] SheetError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, CommandError>;
