use serde::{Deserialize, Serialize};

/// One record of field values, one per column
pub type Row = Vec<String>;

//==============================================================================
// Table
//==============================================================================

/// A header plus its data rows, in file order.
///
/// This is the value that moves between the parser, the grid store and the
/// writer. A `Table` coming out of the parser may be ragged (rows of a
/// different length than the header); a `Table` coming out of a
/// [`GridStore`](crate::core::GridStore) never is.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    pub header: Vec<String>,
    pub rows: Vec<Row>,
}

impl Table {
    pub fn new(header: Vec<String>, rows: Vec<Row>) -> Self {
        Self { header, rows }
    }

    /// True when nothing was loaded (no header and no rows)
    pub fn is_empty(&self) -> bool {
        self.header.is_empty() && self.rows.is_empty()
    }

    pub fn column_count(&self) -> usize {
        self.header.len()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Indices of rows whose length differs from the header's
    pub fn ragged_rows(&self) -> Vec<usize> {
        let width = self.header.len();
        self.rows
            .iter()
            .enumerate()
            .filter(|(_, row)| row.len() != width)
            .map(|(idx, _)| idx)
            .collect()
    }
}
