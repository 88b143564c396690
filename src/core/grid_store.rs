use crate::core::edit_op::EditOp;
use crate::error::{GridError, GridResult};
use crate::parser;
use crate::types::{Row, Table};
use crate::writer;
use tracing::debug;

/// In-memory owner of the current header and rows.
///
/// Every row held by the store has exactly as many cells as the header. Rows
/// are normalized on the way in ([`load`](Self::load)) and every mutation
/// preserves the width, so cell indexing never has to deal with short rows.
///
/// Each operation either succeeds completely or returns an error and leaves
/// the store untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GridStore {
    header: Vec<String>,
    rows: Vec<Row>,
}

impl GridStore {
    /// Create an empty store (nothing loaded)
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_table(table: Table) -> Self {
        let mut store = Self::new();
        store.load_table(table);
        store
    }

    //--------------------------------------------------------------------------
    // Loading
    //--------------------------------------------------------------------------

    /// Replace the header and all rows.
    ///
    /// Rows shorter than the header are padded with empty cells; longer rows
    /// lose their trailing cells. The new state is built in full before the
    /// old one is dropped.
    pub fn load(&mut self, header: Vec<String>, rows: Vec<Row>) {
        let width = header.len();
        let mut normalized = 0usize;

        let rows: Vec<Row> = rows
            .into_iter()
            .map(|mut row| {
                if row.len() != width {
                    normalized += 1;
                    row.resize(width, String::new());
                }
                row
            })
            .collect();

        debug!(
            columns = width,
            rows = rows.len(),
            normalized,
            "loaded table into grid store"
        );

        self.header = header;
        self.rows = rows;
    }

    pub fn load_table(&mut self, table: Table) {
        self.load(table.header, table.rows);
    }

    /// Parse CSV text and load it. On a parse error the store is unchanged.
    pub fn load_text(&mut self, raw_text: &str) -> GridResult<()> {
        let table = parser::parse(raw_text)?;
        self.load_table(table);
        Ok(())
    }

    /// Parse a raw byte buffer and load it. On any error the store is unchanged.
    pub fn load_bytes(&mut self, bytes: &[u8]) -> GridResult<()> {
        let table = parser::parse_bytes(bytes)?;
        self.load_table(table);
        Ok(())
    }

    //--------------------------------------------------------------------------
    // Mutations
    //--------------------------------------------------------------------------

    /// Replace the value of one cell
    pub fn set_cell(
        &mut self,
        row_index: usize,
        col_index: usize,
        value: impl Into<String>,
    ) -> GridResult<()> {
        let row_count = self.rows.len();
        let width = self.header.len();

        let row = self
            .rows
            .get_mut(row_index)
            .ok_or_else(|| GridError::row_out_of_range(row_index, row_count))?;
        let cell = row
            .get_mut(col_index)
            .ok_or_else(|| GridError::column_out_of_range(col_index, width))?;

        *cell = value.into();
        debug!(row = row_index, col = col_index, "cell updated");
        Ok(())
    }

    /// Append a row of empty cells and return its index
    pub fn add_row(&mut self) -> usize {
        self.rows.push(vec![String::new(); self.header.len()]);
        let index = self.rows.len() - 1;
        debug!(row = index, "row added");
        index
    }

    /// Remove a row; later rows move up by one. Returns the removed row.
    pub fn remove_row(&mut self, row_index: usize) -> GridResult<Row> {
        if row_index >= self.rows.len() {
            return Err(GridError::row_out_of_range(row_index, self.rows.len()));
        }
        let removed = self.rows.remove(row_index);
        debug!(row = row_index, remaining = self.rows.len(), "row removed");
        Ok(removed)
    }

    /// Apply a single edit operation
    pub fn apply(&mut self, op: &EditOp) -> GridResult<()> {
        match op {
            EditOp::SetCell { row, col, value } => self.set_cell(*row, *col, value.as_str()),
            EditOp::AddRow => {
                self.add_row();
                Ok(())
            }
            EditOp::RemoveRow { row } => self.remove_row(*row).map(|_| ()),
        }
    }

    /// Apply a batch of edits as one unit: if any edit fails, none of them
    /// take effect and the error of the first failing edit is returned.
    pub fn apply_all(&mut self, ops: &[EditOp]) -> GridResult<()> {
        let mut draft = self.clone();
        for op in ops {
            draft.apply(op)?;
        }
        *self = draft;
        Ok(())
    }

    //--------------------------------------------------------------------------
    // Accessors
    //--------------------------------------------------------------------------

    pub fn header(&self) -> &[String] {
        &self.header
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn row(&self, row_index: usize) -> Option<&[String]> {
        self.rows.get(row_index).map(Vec::as_slice)
    }

    pub fn cell(&self, row_index: usize, col_index: usize) -> Option<&str> {
        self.rows
            .get(row_index)
            .and_then(|row| row.get(col_index))
            .map(String::as_str)
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.header.len()
    }

    /// False until something with at least a header or a row was loaded
    pub fn is_loaded(&self) -> bool {
        !self.header.is_empty() || !self.rows.is_empty()
    }

    /// Snapshot of the current state
    pub fn to_table(&self) -> Table {
        Table::new(self.header.clone(), self.rows.clone())
    }

    /// Serialize the current state to CSV text
    pub fn export_csv(&self) -> GridResult<String> {
        writer::serialize(&self.header, &self.rows)
    }
}
