use crate::error::{GridError, GridResult, ParseErrorKind};
use crate::types::{Row, Table};
use std::path::Path;
use tracing::debug;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Parse CSV text into a header and data rows.
///
/// The first record becomes the header and every following record becomes a
/// data row, in file order. Records are separated by `\n`, `\r\n` or a lone
/// `\r`; fields by `,`. A field that starts with `"` is quoted: it may contain
/// commas, newlines and doubled quotes (`""` reads as one `"`).
///
/// Rows are returned exactly as read, even when their length differs from the
/// header's. Empty input returns an empty [`Table`].
///
/// # Errors
/// `GridError::Parse` when a quoted field is never closed, or when a closing
/// quote is followed by anything other than a comma or a record terminator.
///
/// # Example
/// ```
/// use csvgrid::parser::parse;
///
/// let table = parse("name,age\nAlice,30\n")?;
/// assert_eq!(table.header, vec!["name", "age"]);
/// assert_eq!(table.rows, vec![vec!["Alice", "30"]]);
/// # Ok::<(), csvgrid::error::GridError>(())
/// ```
pub fn parse(raw_text: &str) -> GridResult<Table> {
    let mut records = RecordReader::new(raw_text).read_all()?.into_iter();

    let header = records.next().unwrap_or_default();
    let rows: Vec<Row> = records.collect();

    debug!(
        columns = header.len(),
        rows = rows.len(),
        "parsed CSV text"
    );

    Ok(Table { header, rows })
}

/// Parse a raw byte buffer (as handed over by a file picker or upload).
///
/// A leading UTF-8 byte-order mark is skipped.
pub fn parse_bytes(bytes: &[u8]) -> GridResult<Table> {
    let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
    let text = std::str::from_utf8(bytes).map_err(|e| GridError::Encoding {
        offset: e.valid_up_to(),
    })?;
    parse(text)
}

/// Read and parse a CSV file from disk
pub fn parse_file(path: &Path) -> GridResult<Table> {
    let bytes = std::fs::read(path)?;
    parse_bytes(&bytes)
}

//==============================================================================
// Record reader
//==============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// Nothing read yet for the current field
    FieldStart,
    /// Inside a field that did not start with a quote
    Unquoted,
    /// Inside a quoted field
    Quoted,
    /// Just saw a quote inside a quoted field: either an escape or the end
    QuoteInQuoted,
}

struct RecordReader<'a> {
    chars: std::iter::Peekable<std::str::Chars<'a>>,
    state: State,
    field: String,
    record: Row,
    records: Vec<Row>,
    /// Whether any character of the current record has been consumed
    in_record: bool,
    line: usize,
    column: usize,
    quote_opened_at: (usize, usize),
}

impl<'a> RecordReader<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            chars: text.chars().peekable(),
            state: State::FieldStart,
            field: String::new(),
            record: Vec::new(),
            records: Vec::new(),
            in_record: false,
            line: 1,
            column: 0,
            quote_opened_at: (1, 0),
        }
    }

    fn read_all(mut self) -> GridResult<Vec<Row>> {
        while let Some(ch) = self.chars.next() {
            self.column += 1;

            match self.state {
                State::FieldStart => match ch {
                    '"' => {
                        self.quote_opened_at = (self.line, self.column);
                        self.in_record = true;
                        self.state = State::Quoted;
                    }
                    ',' => {
                        self.in_record = true;
                        self.end_field();
                    }
                    '\n' | '\r' => self.end_line(ch),
                    _ => {
                        self.in_record = true;
                        self.field.push(ch);
                        self.state = State::Unquoted;
                    }
                },
                State::Unquoted => match ch {
                    ',' => self.end_field(),
                    '\n' | '\r' => self.end_line(ch),
                    _ => self.field.push(ch),
                },
                State::Quoted => match ch {
                    '"' => self.state = State::QuoteInQuoted,
                    '\n' => {
                        self.field.push(ch);
                        self.next_line();
                    }
                    '\r' => {
                        self.field.push(ch);
                        if self.chars.peek() == Some(&'\n') {
                            self.chars.next();
                            self.field.push('\n');
                        }
                        self.next_line();
                    }
                    _ => self.field.push(ch),
                },
                State::QuoteInQuoted => match ch {
                    '"' => {
                        self.field.push('"');
                        self.state = State::Quoted;
                    }
                    ',' => self.end_field(),
                    '\n' | '\r' => self.end_line(ch),
                    other => {
                        return Err(GridError::Parse {
                            line: self.line,
                            column: self.column,
                            kind: ParseErrorKind::UnexpectedCharAfterQuote(other),
                        });
                    }
                },
            }
        }

        if self.state == State::Quoted {
            let (line, column) = self.quote_opened_at;
            return Err(GridError::Parse {
                line,
                column,
                kind: ParseErrorKind::UnterminatedQuote,
            });
        }

        if self.in_record {
            self.end_record();
        }

        Ok(self.records)
    }

    fn end_field(&mut self) {
        self.record.push(std::mem::take(&mut self.field));
        self.state = State::FieldStart;
    }

    fn end_record(&mut self) {
        self.end_field();
        self.records.push(std::mem::take(&mut self.record));
        self.in_record = false;
    }

    /// Handle a record terminator seen outside quotes. Blank lines are skipped.
    fn end_line(&mut self, terminator: char) {
        if terminator == '\r' && self.chars.peek() == Some(&'\n') {
            self.chars.next();
        }
        if self.in_record {
            self.end_record();
        }
        self.next_line();
    }

    fn next_line(&mut self) {
        self.line += 1;
        self.column = 0;
    }
}
