//! Script commands: parsing one line and running it against a sheet.

use regex::Regex;
use std::io::Write;
use std::sync::OnceLock;

use tabula_core::{Position, Sheet};

use crate::config::PrintMode;
use crate::error::{CommandError, Result};

/// A parsed script line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Store `text` verbatim in the cell (empty text empties it).
    Set { pos: Position, text: String },
    Clear(Position),
    /// Print `text<TAB>value`, or nothing for an absent cell.
    Get(Position),
    Value(Position),
    Text(Position),
    Refs(Position),
    Size,
    /// Print the sheet; `None` uses the configured mode.
    Print(Option<PrintMode>),
}

fn command_re() -> &'static Regex {
    static COMMAND_RE: OnceLock<Regex> = OnceLock::new();
    COMMAND_RE.get_or_init(|| {
        Regex::new(r"^([a-z]+)(?: (.*))?$").expect("command regex must compile")
    })
}

/// Lines that carry no command.
pub fn is_blank_or_comment(line: &str) -> bool {
    let line = line.trim_start();
    line.is_empty() || line.starts_with('#')
}

impl Command {
    pub fn parse(line: &str) -> Result<Command> {
        let Some(caps) = command_re().captures(line) else {
            let word = line.split_whitespace().next().unwrap_or(line);
            return Err(CommandError::Unknown(word.to_string()));
        };
        let rest = caps.get(2).map(|m| m.as_str());

        match &caps[1] {
            "set" => {
                let rest = rest
                    .filter(|r| !r.trim().is_empty())
                    .ok_or(CommandError::MissingAddress("set"))?;
                let (address, text) = rest.split_once(' ').unwrap_or((rest, ""));
                Ok(Command::Set {
                    pos: address.parse()?,
                    text: text.to_string(),
                })
            }
            "clear" => Ok(Command::Clear(single_address("clear", rest)?)),
            "get" => Ok(Command::Get(single_address("get", rest)?)),
            "value" => Ok(Command::Value(single_address("value", rest)?)),
            "text" => Ok(Command::Text(single_address("text", rest)?)),
            "refs" => Ok(Command::Refs(single_address("refs", rest)?)),
            "size" => match argument(rest) {
                None => Ok(Command::Size),
                Some(extra) => Err(CommandError::UnexpectedArgument(extra.to_string())),
            },
            "print" => match argument(rest) {
                None => Ok(Command::Print(None)),
                Some(mode) => PrintMode::from_arg(mode)
                    .map(|mode| Command::Print(Some(mode)))
                    .ok_or_else(|| CommandError::PrintMode(mode.to_string())),
            },
            other => Err(CommandError::Unknown(other.to_string())),
        }
    }
}

fn argument(rest: Option<&str>) -> Option<&str> {
    rest.map(str::trim).filter(|s| !s.is_empty())
}

fn single_address(command: &'static str, rest: Option<&str>) -> Result<Position> {
    let arg = argument(rest).ok_or(CommandError::MissingAddress(command))?;
    match arg.split_once(char::is_whitespace) {
        Some((address, extra)) => {
            // Report the address first: "get a1 x" is a bad address.
            address.parse::<Position>()?;
            Err(CommandError::UnexpectedArgument(extra.trim().to_string()))
        }
        None => Ok(arg.parse()?),
    }
}

/// A sheet plus the settings commands run under.
#[derive(Debug, Default)]
pub struct Session {
    sheet: Sheet,
    print_mode: PrintMode,
}

impl Session {
    pub fn new(print_mode: PrintMode) -> Self {
        Session {
            sheet: Sheet::new(),
            print_mode,
        }
    }

    /// Parse and run one script line. Blank lines and comments do nothing.
    pub fn run_line<W: Write>(&mut self, line: &str, out: &mut W) -> Result<()> {
        if is_blank_or_comment(line) {
            return Ok(());
        }
        let command = Command::parse(line)?;
        self.execute(command, out)
    }

    pub fn execute<W: Write>(&mut self, command: Command, out: &mut W) -> Result<()> {
        match command {
            Command::Set { pos, text } => self.sheet.set_cell(pos, text)?,
            Command::Clear(pos) => self.sheet.clear_cell(pos)?,
            Command::Get(pos) => {
                if let Some(cell) = self.sheet.get_cell(pos)? {
                    writeln!(out, "{}\t{}", cell.text(), cell.value(&self.sheet))?;
                }
            }
            Command::Value(pos) => {
                let value = self.sheet.get_cell(pos)?.map(|cell| cell.value(&self.sheet));
                match value {
                    Some(value) => writeln!(out, "{}", value)?,
                    None => writeln!(out)?,
                }
            }
            Command::Text(pos) => {
                let text = self.sheet.get_cell(pos)?.map(|cell| cell.text());
                writeln!(out, "{}", text.unwrap_or_default())?;
            }
            Command::Refs(pos) => {
                let refs: Vec<String> = self
                    .sheet
                    .get_cell(pos)?
                    .map(|cell| cell.referenced_positions().iter().map(Position::to_string).collect())
                    .unwrap_or_default();
                writeln!(out, "{}", refs.join(" "))?;
            }
            Command::Size => {
                let size = self.sheet.printable_size();
                writeln!(out, "{} {}", size.rows, size.cols)?;
            }
            Command::Print(mode) => {
                let mut rendered = String::new();
                // Writing into a String cannot fail.
                let _ = match mode.unwrap_or(self.print_mode) {
                    PrintMode::Values => self.sheet.print_values(&mut rendered),
                    PrintMode::Texts => self.sheet.print_texts(&mut rendered),
                };
                out.write_all(rendered.as_bytes())?;
            }
        }
        Ok(())
    }
}
