//! Formula expression tree: evaluation, reference collection and printing.

use std::fmt::{self, Write};

use crate::engine::{FormulaError, Position, format_number};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum UnaryOp {
    Plus,
    Minus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
}

impl BinaryOp {
    fn symbol(self) -> char {
        match self {
            BinaryOp::Add => '+',
            BinaryOp::Sub => '-',
            BinaryOp::Mul => '*',
            BinaryOp::Div => '/',
        }
    }

    fn precedence(self) -> u8 {
        match self {
            BinaryOp::Add | BinaryOp::Sub => 1,
            BinaryOp::Mul | BinaryOp::Div => 2,
        }
    }

    /// `a - (b - c)` differs from `a - b - c`; `a + (b + c)` does not.
    fn groups_right(self) -> bool {
        matches!(self, BinaryOp::Sub | BinaryOp::Div)
    }

    fn apply(self, l: f64, r: f64) -> Result<f64, FormulaError> {
        let result = match self {
            BinaryOp::Add => l + r,
            BinaryOp::Sub => l - r,
            BinaryOp::Mul => l * r,
            BinaryOp::Div => {
                if r == 0.0 {
                    return Err(FormulaError::Div0);
                }
                l / r
            }
        };
        if result.is_finite() {
            Ok(result)
        } else {
            Err(FormulaError::Arith)
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Expr {
    Number(f64),
    Cell {
        name: String,
        pos: Position,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    /// Left-associative run of operators sharing one precedence level,
    /// e.g. `a - b + c`. `rest` is never empty.
    ///
    /// Kept flat so that long operator runs do not nest the tree.
    Chain {
        first: Box<Expr>,
        rest: Vec<(BinaryOp, Expr)>,
    },
}

const ATOM_PRECEDENCE: u8 = 4;
const UNARY_PRECEDENCE: u8 = 3;

impl Expr {
    fn precedence(&self) -> u8 {
        match self {
            Expr::Number(_) | Expr::Cell { .. } => ATOM_PRECEDENCE,
            Expr::Unary { .. } => UNARY_PRECEDENCE,
            Expr::Chain { rest, .. } => rest
                .first()
                .map_or(ATOM_PRECEDENCE, |(op, _)| op.precedence()),
        }
    }

    pub(crate) fn evaluate<F>(&self, lookup: &F) -> Result<f64, FormulaError>
    where
        F: Fn(Position) -> Result<f64, FormulaError>,
    {
        match self {
            Expr::Number(n) => Ok(*n),
            Expr::Cell { pos, .. } => {
                if !pos.is_valid() {
                    return Err(FormulaError::Ref);
                }
                lookup(*pos)
            }
            Expr::Unary { op, operand } => {
                let v = operand.evaluate(lookup)?;
                Ok(match op {
                    UnaryOp::Plus => v,
                    UnaryOp::Minus => -v,
                })
            }
            Expr::Chain { first, rest } => {
                let mut acc = first.evaluate(lookup)?;
                for (op, operand) in rest {
                    acc = op.apply(acc, operand.evaluate(lookup)?)?;
                }
                Ok(acc)
            }
        }
    }

    /// Collect in-grid references in source order (duplicates included).
    pub(crate) fn collect_refs(&self, refs: &mut Vec<Position>) {
        match self {
            Expr::Number(_) => {}
            Expr::Cell { pos, .. } => {
                if pos.is_valid() {
                    refs.push(*pos);
                }
            }
            Expr::Unary { operand, .. } => operand.collect_refs(refs),
            Expr::Chain { first, rest } => {
                first.collect_refs(refs);
                for (_, operand) in rest {
                    operand.collect_refs(refs);
                }
            }
        }
    }

    /// Print with the fewest parentheses that preserve the tree's meaning.
    pub(crate) fn print<W: Write>(&self, out: &mut W) -> fmt::Result {
        match self {
            Expr::Number(n) => out.write_str(&format_number(*n)),
            Expr::Cell { name, pos } => {
                if pos.is_valid() {
                    write!(out, "{}", pos)
                } else {
                    out.write_str(name)
                }
            }
            Expr::Unary { op, operand } => {
                out.write_char(match op {
                    UnaryOp::Plus => '+',
                    UnaryOp::Minus => '-',
                })?;
                operand.print_child(out, operand.precedence() < UNARY_PRECEDENCE)
            }
            Expr::Chain { first, rest } => {
                let parent = self.precedence();
                first.print_child(out, first.precedence() < parent)?;
                for (op, operand) in rest {
                    out.write_char(op.symbol())?;
                    let prec = operand.precedence();
                    let wrap = prec < parent || (prec == parent && op.groups_right());
                    operand.print_child(out, wrap)?;
                }
                Ok(())
            }
        }
    }

    fn print_child<W: Write>(&self, out: &mut W, parenthesize: bool) -> fmt::Result {
        if parenthesize {
            out.write_char('(')?;
            self.print(out)?;
            out.write_char(')')
        } else {
            self.print(out)
        }
    }
}
