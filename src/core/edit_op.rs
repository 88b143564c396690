use crate::error::GridError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A single grid mutation, as a value.
///
/// Hosts build these from user input (command strings on the CLI, JSON over
/// HTTP) and hand them to [`GridStore::apply`](crate::core::GridStore::apply).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum EditOp {
    SetCell { row: usize, col: usize, value: String },
    AddRow,
    RemoveRow { row: usize },
}

/// Split off the first whitespace-delimited token
fn next_token(input: &str) -> Option<(&str, &str)> {
    let input = input.trim_start();
    if input.is_empty() {
        return None;
    }
    match input.find(char::is_whitespace) {
        Some(end) => Some((&input[..end], &input[end..])),
        None => Some((input, "")),
    }
}

fn parse_index<'a>(
    token: Option<(&'a str, &'a str)>,
    what: &str,
) -> Result<(usize, &'a str), GridError> {
    let (token, rest) =
        token.ok_or_else(|| GridError::Command(format!("missing {what} index")))?;
    let index = token.parse::<usize>().map_err(|_| {
        GridError::Command(format!(
            "{what} index must be a non-negative integer, got '{token}'"
        ))
    })?;
    Ok((index, rest))
}

impl FromStr for EditOp {
    type Err = GridError;

    /// Parse `set <row> <col> <value>`, `add-row` or `remove-row <row>`.
    ///
    /// For `set`, everything after the column index (minus one separating
    /// space) is the value, so values may contain spaces. A missing value
    /// clears the cell.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (verb, rest) = next_token(s)
            .ok_or_else(|| GridError::Command("empty command".to_string()))?;

        match verb {
            "set" => {
                let (row, rest) = parse_index(next_token(rest), "row")?;
                let (col, rest) = parse_index(next_token(rest), "column")?;
                let value = rest
                    .strip_prefix(|c: char| c.is_whitespace())
                    .unwrap_or(rest);
                Ok(EditOp::SetCell {
                    row,
                    col,
                    value: value.to_string(),
                })
            }
            "add-row" => {
                if !rest.trim().is_empty() {
                    return Err(GridError::Command(
                        "add-row takes no arguments".to_string(),
                    ));
                }
                Ok(EditOp::AddRow)
            }
            "remove-row" => {
                let (row, rest) = parse_index(next_token(rest), "row")?;
                if !rest.trim().is_empty() {
                    return Err(GridError::Command(
                        "remove-row takes a single row index".to_string(),
                    ));
                }
                Ok(EditOp::RemoveRow { row })
            }
            other => Err(GridError::Command(format!(
                "unknown command '{other}' (expected set, add-row or remove-row)"
            ))),
        }
    }
}

impl fmt::Display for EditOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EditOp::SetCell { row, col, value } => write!(f, "set {row} {col} {value}"),
            EditOp::AddRow => write!(f, "add-row"),
            EditOp::RemoveRow { row } => write!(f, "remove-row {row}"),
        }
    }
}
