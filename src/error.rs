use std::fmt;
use thiserror::Error;

pub type GridResult<T> = Result<T, GridError>;

#[derive(Error, Debug)]
pub enum GridError {
    #[error("CSV parse error at line {line}, column {column}: {kind}")]
    Parse {
        line: usize,
        column: usize,
        kind: ParseErrorKind,
    },

    #[error("{axis} index {index} is out of range (length {len})")]
    Index { axis: Axis, index: usize, len: usize },

    #[error("Input is not valid UTF-8 (invalid byte at offset {offset})")]
    Encoding { offset: usize },

    #[error("Invalid edit command: {0}")]
    Command(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV write error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// What went wrong while reading a quoted field
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseErrorKind {
    #[error("quoted field is never closed")]
    UnterminatedQuote,

    #[error("unexpected character {0:?} after closing quote")]
    UnexpectedCharAfterQuote(char),
}

/// Which index of a cell address was out of range
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Row,
    Column,
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Axis::Row => write!(f, "Row"),
            Axis::Column => write!(f, "Column"),
        }
    }
}

impl GridError {
    pub(crate) fn row_out_of_range(index: usize, len: usize) -> Self {
        GridError::Index {
            axis: Axis::Row,
            index,
            len,
        }
    }

    pub(crate) fn column_out_of_range(index: usize, len: usize) -> Self {
        GridError::Index {
            axis: Axis::Column,
            index,
            len,
        }
    }

    /// Line number for parse errors, if this error carries one
    pub fn line(&self) -> Option<usize> {
        match self {
            GridError::Parse { line, .. } => Some(*line),
            _ => None,
        }
    }
}
