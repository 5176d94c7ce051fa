use thiserror::Error;

use crate::models::{GameParameters, Position};

#[derive(Debug, Error, PartialEq)]
pub enum CommandError {
    #[error("'{0}' is not a cell, expected row,col")]
    BadCell(String),
    #[error("bad parameters: {0}")]
    BadParameters(String),
    #[error("'{0}' is not a number")]
    BadNumber(String),
}

/// A line of terminal input
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Trace a path of cells and release
    Path(Vec<Position>),
    Show,
    Hint(usize),
    ShowParams,
    SetParams(GameParameters),
    Stats,
    Help,
    Quit,
}

impl Command {
    pub fn parse(line: &str) -> Result<Option<Command>, CommandError> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(None);
        }

        let (head, rest) = line
            .split_once(char::is_whitespace)
            .map(|(h, r)| (h, r.trim()))
            .unwrap_or((line, ""));

        let command = match head.to_ascii_lowercase().as_str() {
            "show" | "grid" => Command::Show,
            "stats" => Command::Stats,
            "help" | "?" => Command::Help,
            "quit" | "exit" | "q" => Command::Quit,
            "hint" => {
                if rest.is_empty() {
                    Command::Hint(4)
                } else {
                    Command::Hint(
                        rest.parse()
                            .map_err(|_| CommandError::BadNumber(rest.to_string()))?,
                    )
                }
            }
            "params" => {
                if rest.is_empty() {
                    Command::ShowParams
                } else {
                    let params: GameParameters = serde_json::from_str(rest)
                        .map_err(|e| CommandError::BadParameters(e.to_string()))?;
                    params
                        .validate()
                        .map_err(|e| CommandError::BadParameters(e.to_string()))?;
                    Command::SetParams(params)
                }
            }
            _ => Command::Path(
                line.split_whitespace()
                    .map(parse_cell)
                    .collect::<Result<_, _>>()?,
            ),
        };

        Ok(Some(command))
    }
}

fn parse_cell(token: &str) -> Result<Position, CommandError> {
    let bad = || CommandError::BadCell(token.to_string());
    let (row, col) = token.split_once(',').ok_or_else(bad)?;
    let row = row.trim().parse().map_err(|_| bad())?;
    let col = col.trim().parse().map_err(|_| bad())?;
    Ok(Position::new(row, col))
}

pub const HELP: &str = "\
Commands:
  r,c r,c r,c ...   trace a path of cells and release it
  show              print the board
  hint [length]     list straight-line words on the board (default 4 letters)
  params [json]     show or replace game parameters
  stats             session totals
  quit              leave";
