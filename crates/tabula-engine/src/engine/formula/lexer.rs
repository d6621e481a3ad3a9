//! Formula tokenizer.

use super::FormulaParseError;
use crate::engine::Position;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Token {
    Number(f64),
    /// Cell reference as written; `pos` is `Position::NONE` when the
    /// reference is well-formed but outside the grid.
    Cell {
        name: String,
        pos: Position,
    },
    Plus,
    Minus,
    Star,
    Slash,
    LParen,
    RParen,
}

impl Token {
    pub(crate) fn describe(&self) -> String {
        match self {
            Token::Number(n) => n.to_string(),
            Token::Cell { name, .. } => name.clone(),
            Token::Plus => "+".to_string(),
            Token::Minus => "-".to_string(),
            Token::Star => "*".to_string(),
            Token::Slash => "/".to_string(),
            Token::LParen => "(".to_string(),
            Token::RParen => ")".to_string(),
        }
    }
}

pub(crate) fn tokenize(input: &str) -> Result<Vec<Token>, FormulaParseError> {
    let bytes = input.as_bytes();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        let c = bytes[i];
        match c {
            b' ' | b'\t' => i += 1,
            b'+' => {
                tokens.push(Token::Plus);
                i += 1;
            }
            b'-' => {
                tokens.push(Token::Minus);
                i += 1;
            }
            b'*' => {
                tokens.push(Token::Star);
                i += 1;
            }
            b'/' => {
                tokens.push(Token::Slash);
                i += 1;
            }
            b'(' => {
                tokens.push(Token::LParen);
                i += 1;
            }
            b')' => {
                tokens.push(Token::RParen);
                i += 1;
            }
            b'0'..=b'9' | b'.' => {
                let end = scan_number(bytes, i);
                let literal = &input[i..end];
                let n = literal
                    .parse::<f64>()
                    .ok()
                    .filter(|n| n.is_finite())
                    .ok_or_else(|| FormulaParseError::InvalidNumber(literal.to_string()))?;
                tokens.push(Token::Number(n));
                i = end;
            }
            b'A'..=b'Z' => {
                let letters_end = scan_while(bytes, i, |b| b.is_ascii_uppercase());
                let digits_end = scan_while(bytes, letters_end, |b| b.is_ascii_digit());
                if digits_end == letters_end {
                    return Err(FormulaParseError::MalformedReference(
                        input[i..letters_end].to_string(),
                    ));
                }
                let name = &input[i..digits_end];
                tokens.push(Token::Cell {
                    name: name.to_string(),
                    pos: Position::parse(name),
                });
                i = digits_end;
            }
            _ => {
                let ch = input[i..].chars().next().unwrap_or('?');
                return Err(FormulaParseError::UnexpectedChar { ch, offset: i });
            }
        }
    }

    Ok(tokens)
}

fn scan_while(bytes: &[u8], start: usize, pred: impl Fn(u8) -> bool) -> usize {
    let mut end = start;
    while end < bytes.len() && pred(bytes[end]) {
        end += 1;
    }
    end
}

/// Digits, an optional fraction and an optional exponent.
fn scan_number(bytes: &[u8], start: usize) -> usize {
    let mut end = scan_while(bytes, start, |b| b.is_ascii_digit());
    if end < bytes.len() && bytes[end] == b'.' {
        end = scan_while(bytes, end + 1, |b| b.is_ascii_digit());
    }
    if end < bytes.len() && matches!(bytes[end], b'e' | b'E') {
        let mut exp = end + 1;
        if exp < bytes.len() && matches!(bytes[exp], b'+' | b'-') {
            exp += 1;
        }
        let exp_end = scan_while(bytes, exp, |b| b.is_ascii_digit());
        if exp_end > exp {
            end = exp_end;
        }
    }
    end
}
