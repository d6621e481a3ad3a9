// Formula parser - converts a token stream into an expression tree.
// Grammar (lowest to highest precedence):
//   add_sub := mul_div (('+' | '-') mul_div)*
//   mul_div := unary (('*' | '/') unary)*
// Each starred run becomes one flat `Expr::Chain`, so only parentheses and
// unary operators add nesting.
//   unary   := ('+' | '-') unary | primary
//   primary := NUMBER | CELL | '(' add_sub ')'

use super::FormulaParseError;
use super::ast::{BinaryOp, Expr, UnaryOp};
use super::lexer::Token;

/// Nesting limit for parentheses and unary operators.
const MAX_DEPTH: usize = 256;

pub(crate) fn parse_expr(tokens: &[Token]) -> Result<Expr, FormulaParseError> {
    if tokens.is_empty() {
        return Err(FormulaParseError::Empty);
    }
    let (expr, pos) = parse_add_sub(tokens, 0, 0)?;
    match tokens.get(pos) {
        None => Ok(expr),
        Some(Token::RParen) => Err(FormulaParseError::UnbalancedParen),
        Some(tok) => Err(FormulaParseError::UnexpectedToken(tok.describe())),
    }
}

fn parse_add_sub(
    tokens: &[Token],
    pos: usize,
    depth: usize,
) -> Result<(Expr, usize), FormulaParseError> {
    let (first, mut pos) = parse_mul_div(tokens, pos, depth)?;
    let mut rest = Vec::new();

    while let Some(op) = tokens.get(pos).and_then(|t| match t {
        Token::Plus => Some(BinaryOp::Add),
        Token::Minus => Some(BinaryOp::Sub),
        _ => None,
    }) {
        let (right, next) = parse_mul_div(tokens, pos + 1, depth)?;
        rest.push((op, right));
        pos = next;
    }

    Ok((chain(first, rest), pos))
}

fn parse_mul_div(
    tokens: &[Token],
    pos: usize,
    depth: usize,
) -> Result<(Expr, usize), FormulaParseError> {
    let (first, mut pos) = parse_unary(tokens, pos, depth)?;
    let mut rest = Vec::new();

    while let Some(op) = tokens.get(pos).and_then(|t| match t {
        Token::Star => Some(BinaryOp::Mul),
        Token::Slash => Some(BinaryOp::Div),
        _ => None,
    }) {
        let (right, next) = parse_unary(tokens, pos + 1, depth)?;
        rest.push((op, right));
        pos = next;
    }

    Ok((chain(first, rest), pos))
}

fn chain(first: Expr, rest: Vec<(BinaryOp, Expr)>) -> Expr {
    if rest.is_empty() {
        first
    } else {
        Expr::Chain {
            first: Box::new(first),
            rest,
        }
    }
}

fn parse_unary(
    tokens: &[Token],
    pos: usize,
    depth: usize,
) -> Result<(Expr, usize), FormulaParseError> {
    let op = match tokens.get(pos) {
        Some(Token::Plus) => UnaryOp::Plus,
        Some(Token::Minus) => UnaryOp::Minus,
        _ => return parse_primary(tokens, pos, depth),
    };
    if depth >= MAX_DEPTH {
        return Err(FormulaParseError::TooDeep);
    }
    let (operand, next) = parse_unary(tokens, pos + 1, depth + 1)?;
    Ok((
        Expr::Unary {
            op,
            operand: Box::new(operand),
        },
        next,
    ))
}

fn parse_primary(
    tokens: &[Token],
    pos: usize,
    depth: usize,
) -> Result<(Expr, usize), FormulaParseError> {
    match tokens.get(pos) {
        Some(Token::Number(n)) => Ok((Expr::Number(*n), pos + 1)),
        Some(Token::Cell { name, pos: cell }) => Ok((
            Expr::Cell {
                name: name.clone(),
                pos: *cell,
            },
            pos + 1,
        )),
        Some(Token::LParen) => {
            if depth >= MAX_DEPTH {
                return Err(FormulaParseError::TooDeep);
            }
            let (inner, next) = parse_add_sub(tokens, pos + 1, depth + 1)?;
            match tokens.get(next) {
                Some(Token::RParen) => Ok((inner, next + 1)),
                _ => Err(FormulaParseError::UnbalancedParen),
            }
        }
        Some(Token::RParen) => Err(FormulaParseError::UnbalancedParen),
        Some(tok) => Err(FormulaParseError::UnexpectedToken(tok.describe())),
        None => Err(FormulaParseError::UnexpectedEnd),
    }
}
