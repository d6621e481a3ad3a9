//! Cell position parsing and formatting.
//!
//! Provides bidirectional conversion between spreadsheet-style cell references
//! (e.g., "A1", "B2", "AA100") and zero-indexed row/column coordinates.
//!
//! Columns use a bijective base-26 alphabet: there is no zero digit, so the
//! sequence runs `A..Z, AA..AZ, BA..` with `Z` recurring instead of wrapping.
//!
//! # Examples
//!
//! ```
//! use tabula_engine::Position;
//!
//! let pos = Position::parse("B3");
//! assert_eq!(pos.col, 1); // 0-indexed
//! assert_eq!(pos.row, 2);
//! assert_eq!(pos.to_string(), "B3");
//! ```

use regex::Regex;
use std::cmp::Ordering;
use std::fmt;
use std::sync::OnceLock;
use thiserror::Error;

/// Number of addressable rows.
pub const MAX_ROWS: i32 = 16384;
/// Number of addressable columns.
pub const MAX_COLS: i32 = 16384;

/// Longest textual form a valid position can take (`XFD16384`).
const MAX_POSITION_LENGTH: usize = 8;

const LETTERS: i32 = 26;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PositionError {
    #[error("invalid cell reference: {0:?}")]
    Malformed(String),
}

/// A zero-indexed cell address.
///
/// Positions order column-first, then by row.
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq)]
pub struct Position {
    pub row: i32,
    pub col: i32,
}

impl Position {
    /// Sentinel returned for text that does not name a cell.
    pub const NONE: Position = Position { row: -1, col: -1 };

    pub const fn new(row: i32, col: i32) -> Position {
        Position { row, col }
    }

    pub fn is_valid(&self) -> bool {
        (0..MAX_ROWS).contains(&self.row) && (0..MAX_COLS).contains(&self.col)
    }

    /// Parse spreadsheet notation, returning [`Position::NONE`] for anything
    /// malformed or outside the grid.
    pub fn parse(name: &str) -> Position {
        Self::from_a1(name).unwrap_or(Position::NONE)
    }

    /// Parse spreadsheet notation (e.g., "A1", "B2", "AA10").
    /// Only uppercase column letters are accepted.
    pub fn from_a1(name: &str) -> Option<Position> {
        if name.len() > MAX_POSITION_LENGTH {
            return None;
        }
        let caps = a1_re().captures(name)?;

        let mut col_acc = 0i32;
        for c in caps[1].bytes() {
            let digit = (c - b'A') as i32 + 1;
            col_acc = col_acc.checked_mul(LETTERS)?.checked_add(digit)?;
        }
        let col = col_acc - 1;
        let row = caps[2].parse::<i32>().ok()? - 1;

        let pos = Position::new(row, col);
        pos.is_valid().then_some(pos)
    }

    /// Convert a column index to letters (0 -> A, 25 -> Z, 26 -> AA).
    pub fn col_to_letters(col: i32) -> String {
        let mut result = Vec::new();
        let mut n = col as i64 + 1;
        while n > 0 {
            n -= 1;
            result.push(b'A' + (n % LETTERS as i64) as u8);
            n /= LETTERS as i64;
        }
        result.reverse();
        String::from_utf8(result).unwrap_or_default()
    }
}

fn a1_re() -> &'static Regex {
    static A1_RE: OnceLock<Regex> = OnceLock::new();
    A1_RE.get_or_init(|| {
        Regex::new(r"^([A-Z]+)([0-9]+)$").expect("cell position regex must compile")
    })
}

impl Ord for Position {
    fn cmp(&self, other: &Self) -> Ordering {
        self.col.cmp(&other.col).then(self.row.cmp(&other.row))
    }
}

impl PartialOrd for Position {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl std::str::FromStr for Position {
    type Err = PositionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_a1(s).ok_or_else(|| PositionError::Malformed(s.to_string()))
    }
}

/// Invalid positions render as an empty string.
impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.is_valid() {
            return Ok(());
        }
        write!(f, "{}{}", Position::col_to_letters(self.col), self.row + 1)
    }
}
